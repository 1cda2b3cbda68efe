//! Engine and analysis error types

use std::time::Duration;

use thiserror::Error;

use crate::session::HandshakeState;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn engine at {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine not ready for `{command}` (state: {state:?})")]
    NotReady {
        command: String,
        state: HandshakeState,
    },

    #[error("Engine output listener already registered")]
    ListenerBusy,

    #[error("Engine process terminated")]
    Terminated,

    #[error("Timed out after {after:?} waiting for `{expected}`")]
    Timeout {
        after: Duration,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Evaluation of {fen} timed out after {after:?}")]
    EvalTimeout { fen: String, after: Duration },

    #[error("Engine unavailable after a failed reset")]
    EngineUnavailable,

    #[error("Evaluation scheduler shut down")]
    SchedulerClosed,

    #[error(transparent)]
    Replay(#[from] chess_core::ReplayError),
}
