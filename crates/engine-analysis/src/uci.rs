//! The subset of the UCI protocol spoken to the analysis engine.

use std::fmt;

/// Commands written to the engine, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: String },
    UciNewGame,
    Position { fen: String },
    GoDepth(u32),
    Stop,
    Quit,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uci => f.write_str("uci"),
            Self::IsReady => f.write_str("isready"),
            Self::SetOption { name, value } => write!(f, "setoption name {name} value {value}"),
            Self::UciNewGame => f.write_str("ucinewgame"),
            Self::Position { fen } => write!(f, "position fen {fen}"),
            Self::GoDepth(depth) => write!(f, "go depth {depth}"),
            Self::Stop => f.write_str("stop"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

/// Score fields of an `info depth ...` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    /// Centipawns from the side to move's point of view
    pub cp: Option<i32>,
    /// Mate in N (negative = side to move gets mated)
    pub mate: Option<i32>,
}

/// A line read from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLine {
    UciOk,
    ReadyOk,
    Info(SearchInfo),
    BestMove { mv: String, ponder: Option<String> },
    /// Anything else: id/option banners, `info string`, unknown output
    Other(String),
}

/// Parse one line of engine output. Never fails; unknown input becomes [`EngineLine::Other`].
pub fn parse_line(line: &str) -> EngineLine {
    let trimmed = line.trim();
    match trimmed {
        "uciok" => return EngineLine::UciOk,
        "readyok" => return EngineLine::ReadyOk,
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts.first() {
        Some(&"info") if parts.get(1) == Some(&"depth") => EngineLine::Info(SearchInfo {
            depth: value_after(&parts, "depth"),
            cp: score_value(&parts, "cp"),
            mate: score_value(&parts, "mate"),
        }),
        Some(&"bestmove") if parts.len() >= 2 => EngineLine::BestMove {
            mv: parts[1].to_string(),
            ponder: match parts.get(2) {
                Some(&"ponder") => parts.get(3).map(|p| p.to_string()),
                _ => None,
            },
        },
        _ => EngineLine::Other(trimmed.to_string()),
    }
}

fn value_after<T: std::str::FromStr>(parts: &[&str], key: &str) -> Option<T> {
    let idx = parts.iter().position(|p| *p == key)?;
    parts.get(idx + 1)?.parse().ok()
}

/// Value of `score <kind> <n>`; ignores `cp`/`mate` tokens outside a score clause.
fn score_value(parts: &[&str], kind: &str) -> Option<i32> {
    parts
        .windows(3)
        .find(|w| w[0] == "score" && w[1] == kind)
        .and_then(|w| w[2].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lines() {
        assert_eq!(EngineCommand::Uci.to_string(), "uci");
        assert_eq!(EngineCommand::GoDepth(12).to_string(), "go depth 12");
        assert_eq!(
            EngineCommand::Position {
                fen: "8/8/8/8/8/8/8/K6k w - - 0 1".into()
            }
            .to_string(),
            "position fen 8/8/8/8/8/8/8/K6k w - - 0 1"
        );
        assert_eq!(
            EngineCommand::SetOption {
                name: "Hash".into(),
                value: "256".into()
            }
            .to_string(),
            "setoption name Hash value 256"
        );
    }

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(
            parse_line(line),
            EngineLine::Info(SearchInfo {
                depth: Some(20),
                cp: Some(35),
                mate: None,
            })
        );
    }

    #[test]
    fn test_parse_negative_cp_with_bound() {
        let line = "info depth 7 score cp -48 upperbound nodes 2048 pv d7d5";
        match parse_line(line) {
            EngineLine::Info(info) => assert_eq!(info.cp, Some(-48)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate 3 nodes 100000 pv e2e4";
        assert_eq!(
            parse_line(line),
            EngineLine::Info(SearchInfo {
                depth: Some(20),
                cp: None,
                mate: Some(3),
            })
        );
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(
            parse_line("bestmove e2e4 ponder e7e5"),
            EngineLine::BestMove {
                mv: "e2e4".into(),
                ponder: Some("e7e5".into()),
            }
        );
        assert_eq!(
            parse_line("bestmove (none)"),
            EngineLine::BestMove {
                mv: "(none)".into(),
                ponder: None,
            }
        );
    }

    #[test]
    fn test_handshake_and_noise() {
        assert_eq!(parse_line("uciok\r"), EngineLine::UciOk);
        assert_eq!(parse_line("readyok"), EngineLine::ReadyOk);
        assert!(matches!(parse_line("id name Stockfish 17"), EngineLine::Other(_)));
        assert!(matches!(
            parse_line("info string NNUE evaluation using nn-1111cefa1111.nnue"),
            EngineLine::Other(_)
        ));
        assert!(matches!(parse_line("info currmove e2e4 currmovenumber 1"), EngineLine::Other(_)));
        assert!(matches!(parse_line("bestmove"), EngineLine::Other(_)));
    }
}
