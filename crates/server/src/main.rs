use server::clients::GameSources;
use server::config::Config;

use engine_analysis::{
    AnalysisSettings, Classifier, EngineConfig, EngineSession, EvalScheduler, PositionEvaluator,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    let engine_config = EngineConfig::from_env();
    let settings = AnalysisSettings::from_env();

    // A missing engine is fatal; there is no automatic restart
    tracing::info!(path = %engine_config.path, "Starting engine...");
    let session = EngineSession::start(&engine_config).await?;
    let (scheduler, _worker) = EvalScheduler::spawn(session, &engine_config);
    let classifier = Classifier::new(PositionEvaluator::new(scheduler), settings);

    let sources = GameSources::from_config(&config)?;
    if sources.lichess.is_some() {
        tracing::info!("Lichess import/export enabled");
    } else {
        tracing::info!("LICHESS_API_TOKEN not set - parsing Chess.com PGN locally");
    }

    let app = server::router(config.clone(), sources, classifier);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
