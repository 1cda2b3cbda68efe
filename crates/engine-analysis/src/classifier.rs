//! Blunder and missed-mate detection for one player's moves in a game.

use chess_core::{GameImport, MoveRecord};
use serde::Serialize;
use shakmaty::Color;
use tracing::{debug, info, warn};

use crate::config::AnalysisSettings;
use crate::error::AnalysisError;
use crate::evaluator::{EvalResult, Evaluate};

/// A move that lost at least the blunder threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlunderRecord {
    pub move_number: u32,
    #[serde(rename = "move")]
    pub san: String,
    pub fen_before: String,
    pub best_move: String,
    /// White-perspective score before minus score after; negative for Black blunders
    pub eval_drop: i32,
}

/// A move played in a position where the engine saw a mate and suggested
/// something else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedMateRecord {
    pub move_number: u32,
    #[serde(rename = "move")]
    pub san: String,
    pub fen_before: String,
    pub best_move: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReport {
    pub blunders: Vec<BlunderRecord>,
    pub missed_mates: Vec<MissedMateRecord>,
    /// Set when moves were skipped or some evaluations failed
    pub partial: bool,
}

pub struct Classifier<E> {
    evaluator: E,
    settings: AnalysisSettings,
}

impl<E: Evaluate> Classifier<E> {
    pub fn new(evaluator: E, settings: AnalysisSettings) -> Self {
        Self {
            evaluator,
            settings,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Evaluate every move `username` made in `game`.
    pub async fn classify(
        &self,
        game: &GameImport,
        username: &str,
    ) -> Result<GameReport, AnalysisError> {
        let mut report = GameReport::default();

        if game.moves.is_empty() {
            debug!("Game has no moves");
            return Ok(report);
        }
        let Some(color) = game.participants.color_of(username) else {
            info!(username, "User did not play in this game");
            return Ok(report);
        };

        let replay = chess_core::replay(game.moves.as_slice(), self.settings.illegal_moves)?;
        report.partial = replay.is_partial();

        for record in replay.records.iter().filter(|r| r.color == color) {
            let Some(before) = self.evaluate_or_skip(&record.fen_before, &mut report).await else {
                continue;
            };
            let Some(after) = self.evaluate_or_skip(&record.fen_after, &mut report).await else {
                continue;
            };

            if let Some(blunder) = self.check_blunder(record, &before, &after) {
                debug!(ply = record.ply, san = %record.san, drop = blunder.eval_drop, "Blunder");
                report.blunders.push(blunder);
            }
            if let Some(missed) = check_missed_mate(record, &before) {
                debug!(
                    ply = record.ply,
                    san = %record.san,
                    best = %missed.best_move,
                    "Missed mate"
                );
                report.missed_mates.push(missed);
            }
        }

        info!(
            username,
            color = ?color,
            blunders = report.blunders.len(),
            missed_mates = report.missed_mates.len(),
            partial = report.partial,
            "Game classified"
        );
        Ok(report)
    }

    async fn evaluate_or_skip(&self, fen: &str, report: &mut GameReport) -> Option<EvalResult> {
        match self.evaluator.evaluate(fen, self.settings.depth).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(fen, error = %e, "Evaluation failed, skipping move");
                report.partial = true;
                None
            }
        }
    }

    fn check_blunder(
        &self,
        record: &MoveRecord,
        before: &EvalResult,
        after: &EvalResult,
    ) -> Option<BlunderRecord> {
        let (Some(score_before), Some(score_after)) = (before.eval_score, after.eval_score) else {
            debug!(ply = record.ply, san = %record.san, "Score unknown, skipping blunder check");
            return None;
        };
        let drop = score_before.saturating_sub(score_after);
        is_blunder(record.color, drop, self.settings.blunder_threshold).then(|| BlunderRecord {
            move_number: record.move_number(),
            san: record.san.clone(),
            fen_before: record.fen_before.clone(),
            best_move: before.best_move.clone(),
            eval_drop: drop,
        })
    }
}

/// `drop` is from White's side, so a Black blunder shows up as a rise.
fn is_blunder(color: Color, drop: i32, threshold: i32) -> bool {
    match color {
        Color::White => drop >= threshold,
        Color::Black => drop <= threshold.saturating_neg(),
    }
}

fn check_missed_mate(record: &MoveRecord, before: &EvalResult) -> Option<MissedMateRecord> {
    if !before.found_mate {
        return None;
    }
    let best = before.best_move_squares()?;
    (record.squares() != Some(best)).then(|| MissedMateRecord {
        move_number: record.move_number(),
        san: record.san.clone(),
        fen_before: record.fen_before.clone(),
        best_move: before.best_move.clone(),
    })
}
