//! Move replay: applies a game's recorded moves from the initial position and
//! captures the FEN on either side of every ply.
//!
//! Legality and move application are delegated to `shakmaty`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Square};
use tracing::{debug, warn};

use crate::error::ReplayError;
use crate::notation;

/// What to do with a move that cannot be applied to the current board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalMovePolicy {
    /// Abort the replay with [`ReplayError::IllegalMove`].
    FailFast,
    /// Log the move, leave the board untouched and keep going. Later plies keep
    /// their index in the submitted list, so the replay is flagged as partial.
    #[default]
    SkipAndContinue,
}

impl FromStr for IllegalMovePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail_fast" | "failfast" => Ok(Self::FailFast),
            "skip" | "skip_and_continue" | "skipandcontinue" => Ok(Self::SkipAndContinue),
            other => Err(format!("unknown illegal move policy: {other}")),
        }
    }
}

/// One applied ply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Index of the move in the submitted list (0-based).
    pub ply: usize,
    /// Move text exactly as submitted.
    pub san: String,
    /// Same move in UCI coordinates, castling as king-to-destination (`e1g1`).
    pub uci: String,
    pub color: Color,
    pub fen_before: String,
    pub fen_after: String,
}

impl MoveRecord {
    /// 1-based move number shared by both plies of a full move.
    pub fn move_number(&self) -> u32 {
        (self.ply / 2) as u32 + 1
    }

    pub fn squares(&self) -> Option<(Square, Square)> {
        notation::uci_squares(&self.uci)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMove {
    pub ply: usize,
    pub san: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replay {
    pub records: Vec<MoveRecord>,
    pub skipped: Vec<SkippedMove>,
}

impl Replay {
    /// True when at least one move was skipped and later FENs may be off.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Replay `moves` from the standard initial position.
pub fn replay<S: AsRef<str>>(
    moves: &[S],
    policy: IllegalMovePolicy,
) -> Result<Replay, ReplayError> {
    let mut pos = Chess::default();
    let mut replay = Replay {
        records: Vec::with_capacity(moves.len()),
        skipped: Vec::new(),
    };

    for (ply, raw) in moves.iter().enumerate() {
        let text = raw.as_ref().trim();
        // Captured before the board is touched for this ply
        let fen_before = fen_of(&pos);

        let mv = match parse_move(&pos, text) {
            Ok(mv) => mv,
            Err(reason) => match policy {
                IllegalMovePolicy::FailFast => {
                    return Err(ReplayError::IllegalMove {
                        ply,
                        san: text.to_string(),
                        reason,
                    });
                }
                IllegalMovePolicy::SkipAndContinue => {
                    warn!(ply, san = text, %reason, "Skipping move that does not apply");
                    replay.skipped.push(SkippedMove {
                        ply,
                        san: text.to_string(),
                        reason,
                    });
                    continue;
                }
            },
        };

        let color = pos.turn();
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        pos.play_unchecked(mv);

        replay.records.push(MoveRecord {
            ply,
            san: text.to_string(),
            uci,
            color,
            fen_before,
            fen_after: fen_of(&pos),
        });
    }

    debug!(
        plies = replay.records.len(),
        skipped = replay.skipped.len(),
        "Replay finished"
    );
    Ok(replay)
}

fn parse_move(pos: &Chess, text: &str) -> Result<Move, String> {
    let san: San = notation::strip_annotations(text)
        .parse()
        .map_err(|e| format!("unparsable notation ({e})"))?;
    san.to_move(pos)
        .map_err(|e| format!("not playable in this position ({e})"))
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}
