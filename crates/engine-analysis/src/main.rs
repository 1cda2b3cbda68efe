//! Analyze one game from a PGN file for a given player and print the report as JSON.

use std::path::PathBuf;

use anyhow::Context;
use chess_core::{pgn, GameImport};
use clap::Parser;
use tracing::info;

use engine_analysis::{
    AnalysisSettings, Classifier, EngineConfig, EngineSession, EvalScheduler, PositionEvaluator,
};

#[derive(Parser)]
#[command(name = "analyze-game")]
#[command(about = "Find blunders and missed mates in a player's game")]
struct Cli {
    /// PGN file; the first game featuring the player is analyzed
    #[arg(long)]
    pgn: PathBuf,
    /// Player to analyze
    #[arg(short, long)]
    username: String,
    /// Search depth per position (overrides ANALYSIS_DEPTH)
    #[arg(short, long)]
    depth: Option<u32>,
    /// Engine binary (overrides STOCKFISH_PATH)
    #[arg(long)]
    engine: Option<String>,
    /// Blunder threshold in centipawns (overrides BLUNDER_THRESHOLD)
    #[arg(long)]
    threshold: Option<i32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut engine_config = EngineConfig::from_env();
    if let Some(path) = cli.engine {
        engine_config.path = path;
    }
    let mut settings = AnalysisSettings::from_env();
    if let Some(depth) = cli.depth {
        settings.depth = depth;
    }
    if let Some(threshold) = cli.threshold {
        settings.blunder_threshold = threshold;
    }

    let text = std::fs::read_to_string(&cli.pgn)
        .with_context(|| format!("reading {}", cli.pgn.display()))?;
    let game = pgn::find_game_for_user(&text, &cli.username)
        .with_context(|| format!("no game for {} in {}", cli.username, cli.pgn.display()))?;
    info!(
        white = %game.metadata.white,
        black = %game.metadata.black,
        moves = game.moves.len(),
        "Game loaded"
    );

    let session = EngineSession::start(&engine_config).await?;
    let (scheduler, worker) = EvalScheduler::spawn(session, &engine_config);
    let classifier = Classifier::new(PositionEvaluator::new(scheduler), settings);

    let report = classifier
        .classify(&GameImport::from(game), &cli.username)
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    // Dropping the last scheduler handle lets the worker quit the engine
    drop(classifier);
    worker.await?;
    Ok(())
}
