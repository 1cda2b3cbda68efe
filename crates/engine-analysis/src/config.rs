//! Engine and analysis configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chess_core::IllegalMovePolicy;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub path: String,

    /// Limit for each handshake step and idle probe
    pub handshake_timeout: Duration,

    /// Limit for a single position search
    pub eval_timeout: Duration,

    /// `Threads` option, engine default when unset
    pub threads: Option<u32>,

    /// `Hash` option in MB, engine default when unset
    pub hash_mb: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "/usr/local/bin/stockfish".to_string(),
            handshake_timeout: Duration::from_secs(10),
            eval_timeout: Duration::from_secs(30),
            threads: None,
            hash_mb: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            path: env::var("STOCKFISH_PATH").unwrap_or(defaults.path),
            handshake_timeout: env_parse("ENGINE_HANDSHAKE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.handshake_timeout),
            eval_timeout: env_parse("EVAL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.eval_timeout),
            threads: env_parse("ENGINE_THREADS"),
            hash_mb: env_parse("ENGINE_HASH_MB"),
        }
    }

    /// `setoption` pairs sent during the handshake.
    pub(crate) fn options(&self) -> Vec<(String, String)> {
        let mut options = Vec::new();
        if let Some(threads) = self.threads {
            options.push(("Threads".to_string(), threads.to_string()));
        }
        if let Some(hash) = self.hash_mb {
            options.push(("Hash".to_string(), hash.to_string()));
        }
        options
    }
}

/// Knobs for blunder and missed-mate classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Search depth per position
    pub depth: u32,

    /// Centipawn drop that counts as a blunder; Black is checked against its negation
    pub blunder_threshold: i32,

    pub illegal_moves: IllegalMovePolicy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            depth: 12,
            blunder_threshold: 300,
            illegal_moves: IllegalMovePolicy::SkipAndContinue,
        }
    }
}

impl AnalysisSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let illegal_moves = match env::var("ILLEGAL_MOVE_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!(error = %e, "Ignoring ILLEGAL_MOVE_POLICY");
                defaults.illegal_moves
            }),
            Err(_) => defaults.illegal_moves,
        };

        Self {
            depth: env_parse("ANALYSIS_DEPTH").unwrap_or(defaults.depth),
            blunder_threshold: env_parse("BLUNDER_THRESHOLD").unwrap_or(defaults.blunder_threshold),
            illegal_moves,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}
