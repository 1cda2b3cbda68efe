pub mod clients;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use engine_analysis::{Classifier, PositionEvaluator};
use tower_http::cors::{Any, CorsLayer};

use crate::clients::GameSources;
use crate::config::Config;

pub type SharedClassifier = Arc<Classifier<PositionEvaluator>>;

/// Build the API router around an already running engine queue.
pub fn router(
    config: Config,
    sources: GameSources,
    classifier: Classifier<PositionEvaluator>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let classifier: SharedClassifier = Arc::new(classifier);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/analyze", post(routes::analyze::analyze_game))
        .route("/api/analyze/{username}", get(routes::analyze::analyze_latest))
        // Shared state
        .layer(Extension(classifier))
        .layer(Extension(Arc::new(sources)))
        .layer(Extension(config))
        .layer(cors)
}
