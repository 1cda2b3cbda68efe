#![allow(dead_code)]

use std::process::{Command, Stdio};
use std::time::Duration;

use axum::Router;
use engine_analysis::fake::FakeEngine;
use engine_analysis::{AnalysisSettings, Classifier, EngineConfig, EvalScheduler, PositionEvaluator};
use reqwest::Client;
use server::clients::GameSources;
use server::config::Config;

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });
    format!("http://{addr}")
}

pub fn engine_config() -> EngineConfig {
    EngineConfig {
        handshake_timeout: Duration::from_secs(2),
        eval_timeout: Duration::from_secs(2),
        ..EngineConfig::default()
    }
}

/// Classifier backed by the scripted in-memory engine.
pub async fn fake_classifier(
    engine: FakeEngine,
    settings: AnalysisSettings,
) -> Classifier<PositionEvaluator> {
    let config = engine_config();
    let session = engine.connect(&config).await.expect("Fake engine handshake failed");
    let (scheduler, _worker) = EvalScheduler::spawn(session, &config);
    Classifier::new(PositionEvaluator::new(scheduler), settings)
}

/// Server config pointing the Chess.com client at `chess_com_url`, Lichess disabled.
pub fn server_config(chess_com_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        lichess_api_token: None,
        chess_com_time_classes: vec!["bullet".into(), "rapid".into(), "blitz".into()],
        chess_com_api_url: chess_com_url.to_string(),
        lichess_api_url: "http://127.0.0.1:9".to_string(),
    }
}

/// Start the API with a fake engine and return its base URL.
pub async fn spawn_api(engine: FakeEngine, chess_com_url: &str) -> String {
    spawn_api_with(engine, server_config(chess_com_url), AnalysisSettings::default()).await
}

pub async fn spawn_api_with(
    engine: FakeEngine,
    config: Config,
    settings: AnalysisSettings,
) -> String {
    let sources = GameSources::from_config(&config).expect("Failed to build HTTP clients");
    let classifier = fake_classifier(engine, settings).await;
    serve(server::router(config, sources, classifier)).await
}

pub fn find_stockfish() -> Option<String> {
    if let Ok(path) = std::env::var("STOCKFISH_PATH") {
        if std::path::Path::new(&path).exists() {
            return Some(path);
        }
    }
    let local_unix = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("stockfish");
    if local_unix.exists() {
        return Some(local_unix.to_string_lossy().into_owned());
    }
    // Try PATH
    if Command::new("stockfish")
        .arg("quit")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
    {
        return Some("stockfish".to_string());
    }
    None
}
