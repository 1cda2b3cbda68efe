use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use chess_core::{pgn, GameImport, Participants};
use engine_analysis::GameReport;
use serde::Deserialize;

use crate::clients::GameSources;
use crate::config::Config;
use crate::error::AppError;
use crate::SharedClassifier;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub username: String,
    pub white: String,
    pub black: String,
    pub moves: Vec<String>,
}

/// POST /api/analyze
pub async fn analyze_game(
    Extension(classifier): Extension<SharedClassifier>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<GameReport>, AppError> {
    if body.username.trim().is_empty() {
        return Err(AppError::BadRequest("username is required".to_string()));
    }

    let game = GameImport {
        moves: body.moves,
        participants: Participants::new(body.white, body.black),
    };
    tracing::info!(username = %body.username, moves = game.moves.len(), "Analyzing submitted game");

    let report = classifier.classify(&game, &body.username).await?;
    Ok(Json(report))
}

/// GET /api/analyze/{username}
pub async fn analyze_latest(
    Path(username): Path<String>,
    Extension(config): Extension<Config>,
    Extension(sources): Extension<Arc<GameSources>>,
    Extension(classifier): Extension<SharedClassifier>,
) -> Result<Json<GameReport>, AppError> {
    let pgn = sources
        .chess_com
        .fetch_latest_game(&username, &config.chess_com_time_classes)
        .await
        .map_err(AppError::Upstream)?
        .ok_or_else(|| AppError::NotFound("No game found".to_string()))?;

    if let Some(link) = pgn::extract_header(&pgn, "Link") {
        tracing::info!(%username, %link, "Analyzing latest Chess.com game");
    }

    let game = match &sources.lichess {
        Some(lichess) => {
            let id = lichess.import_pgn(&pgn).await.map_err(AppError::Upstream)?;
            GameImport::from(lichess.export_game(&id).await.map_err(AppError::Upstream)?)
        }
        None => pgn::parse_pgn(&pgn)
            .map(GameImport::from)
            .ok_or_else(|| AppError::Upstream("Unreadable PGN from Chess.com".to_string()))?,
    };

    let report = classifier.classify(&game, &username).await?;
    Ok(Json(report))
}
