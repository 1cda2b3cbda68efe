//! Position evaluation: turns a search's output into a single result.

use std::future::Future;

use chess_core::notation;
use serde::Serialize;
use shakmaty::Square;

use crate::error::AnalysisError;
use crate::scheduler::EvalScheduler;
use crate::uci::EngineLine;

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalResult {
    /// Engine's best move in UCI notation, as sent
    pub best_move: String,
    /// Last centipawn score, from White's point of view; `None` if the engine
    /// only reported mate scores or nothing at all
    pub eval_score: Option<i32>,
    /// Whether any mate score was reported during the search
    pub found_mate: bool,
}

impl EvalResult {
    pub fn best_move_squares(&self) -> Option<(Square, Square)> {
        notation::uci_squares(&self.best_move)
    }
}

/// Accumulates `info` lines until `bestmove` completes the result.
#[derive(Debug)]
pub struct SearchParser {
    black_to_move: bool,
    score: Option<i32>,
    found_mate: bool,
}

impl SearchParser {
    pub fn new(fen: &str) -> Self {
        Self {
            black_to_move: fen.split_whitespace().nth(1) == Some("b"),
            score: None,
            found_mate: false,
        }
    }

    pub fn feed(&mut self, line: &EngineLine) -> Option<EvalResult> {
        match line {
            EngineLine::Info(info) => {
                if let Some(cp) = info.cp {
                    // Engine scores are relative to the side to move
                    self.score = Some(if self.black_to_move { -cp } else { cp });
                }
                if info.mate.is_some() {
                    self.found_mate = true;
                }
                None
            }
            EngineLine::BestMove { mv, .. } => Some(EvalResult {
                best_move: mv.clone(),
                eval_score: self.score,
                found_mate: self.found_mate,
            }),
            _ => None,
        }
    }
}

/// Anything that can evaluate a position to a fixed depth.
pub trait Evaluate: Send + Sync {
    fn evaluate(
        &self,
        fen: &str,
        depth: u32,
    ) -> impl Future<Output = Result<EvalResult, AnalysisError>> + Send;
}

/// Evaluates positions through the shared engine queue.
#[derive(Clone)]
pub struct PositionEvaluator {
    scheduler: EvalScheduler,
}

impl PositionEvaluator {
    pub fn new(scheduler: EvalScheduler) -> Self {
        Self { scheduler }
    }
}

impl Evaluate for PositionEvaluator {
    async fn evaluate(&self, fen: &str, depth: u32) -> Result<EvalResult, AnalysisError> {
        self.scheduler.submit(fen, depth).result().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::parse_line;

    const WHITE_TO_MOVE: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
    const BLACK_TO_MOVE: &str = "rnbqkbnr/pppp1ppp/8/4p2Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 1 2";

    fn run(fen: &str, lines: &[&str]) -> Option<EvalResult> {
        let mut parser = SearchParser::new(fen);
        lines.iter().find_map(|line| parser.feed(&parse_line(line)))
    }

    #[test]
    fn test_white_to_move_keeps_sign() {
        let result = run(
            WHITE_TO_MOVE,
            &[
                "info depth 10 score cp 15 pv g1f3",
                "info depth 12 score cp 20 pv g1f3",
                "bestmove g1f3",
            ],
        )
        .unwrap();
        assert_eq!(result.eval_score, Some(20));
        assert_eq!(result.best_move, "g1f3");
        assert!(!result.found_mate);
    }

    #[test]
    fn test_black_to_move_is_negated() {
        let result = run(
            BLACK_TO_MOVE,
            &["info depth 12 score cp 400 pv b8c6", "bestmove b8c6"],
        )
        .unwrap();
        assert_eq!(result.eval_score, Some(-400));
    }

    #[test]
    fn test_mate_score_sets_flag_and_keeps_last_cp() {
        let result = run(
            WHITE_TO_MOVE,
            &[
                "info depth 5 score cp 250 pv d1h5",
                "info depth 6 score mate 2 pv d1h5",
                "bestmove d1h5",
            ],
        )
        .unwrap();
        assert!(result.found_mate);
        assert_eq!(result.eval_score, Some(250));
    }

    #[test]
    fn test_no_cp_line_leaves_score_unknown() {
        let result = run(
            WHITE_TO_MOVE,
            &["info depth 3 score mate 1 pv d1f7", "bestmove d1f7"],
        )
        .unwrap();
        assert_eq!(result.eval_score, None);
        assert!(result.found_mate);
        assert_eq!(
            result.best_move_squares(),
            Some((Square::D1, Square::F7))
        );
    }

    #[test]
    fn test_noise_is_ignored_until_bestmove() {
        let mut parser = SearchParser::new(WHITE_TO_MOVE);
        assert!(parser.feed(&parse_line("info string NNUE enabled")).is_none());
        assert!(parser.feed(&parse_line("readyok")).is_none());
        assert!(parser
            .feed(&parse_line("info depth 1 score cp -5 pv a2a3"))
            .is_none());
        let result = parser.feed(&parse_line("bestmove a2a3")).unwrap();
        assert_eq!(result.eval_score, Some(-5));
    }
}
