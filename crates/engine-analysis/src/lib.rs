//! Blunder and missed-mate analysis on top of a single UCI engine process.
//!
//! Layers, bottom to top: [`uci`] wire format, [`session`] process and
//! handshake, [`scheduler`] FIFO job queue, [`evaluator`] per-position
//! results and [`classifier`] per-game reports.

pub mod classifier;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod scheduler;
pub mod session;
pub mod uci;

#[cfg(any(test, feature = "fake-engine"))]
pub mod fake;

pub use classifier::{BlunderRecord, Classifier, GameReport, MissedMateRecord};
pub use config::{AnalysisSettings, EngineConfig};
pub use error::{AnalysisError, EngineError};
pub use evaluator::{EvalResult, Evaluate, PositionEvaluator};
pub use scheduler::{EvalScheduler, PendingEval};
pub use session::{EngineSession, HandshakeState};
