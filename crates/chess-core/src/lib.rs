//! Chess primitives shared by the analysis engine and the API server:
//! PGN ingestion, participant lookup and move replay.

pub mod error;
pub mod game_data;
pub mod notation;
pub mod pgn;
pub mod replay;

pub use error::ReplayError;
pub use game_data::{GameData, GameImport, GameMetadata, Participants};
pub use replay::{replay, IllegalMovePolicy, MoveRecord, Replay, SkippedMove};

/// FEN of the standard initial position.
pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
