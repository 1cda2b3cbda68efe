//! Small helpers for moving between the notations in play: SAN as recorded in
//! game archives and UCI coordinates as printed by engines.

use shakmaty::{uci::UciMove, Square};

const ANNOTATION_CHARS: &[char] = &['!', '?', '+', '#'];

/// Drop check/mate markers and `!`/`?` annotations from a SAN token.
pub fn strip_annotations(token: &str) -> &str {
    token.trim().trim_end_matches(ANNOTATION_CHARS)
}

/// From/to squares of a UCI move string such as `e2e4` or `e7e8q`.
/// Returns `None` for null moves, drops and engine placeholders like `(none)`.
pub fn uci_squares(uci: &str) -> Option<(Square, Square)> {
    match uci.trim().parse::<UciMove>().ok()? {
        UciMove::Normal { from, to, .. } => Some((from, to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_annotations() {
        assert_eq!(strip_annotations("Qh5??"), "Qh5");
        assert_eq!(strip_annotations("Nf3+"), "Nf3");
        assert_eq!(strip_annotations("Qxf7#"), "Qxf7");
        assert_eq!(strip_annotations("e8=Q+!?"), "e8=Q");
        assert_eq!(strip_annotations(" O-O "), "O-O");
    }

    #[test]
    fn test_uci_squares() {
        assert_eq!(uci_squares("e2e4"), Some((Square::E2, Square::E4)));
        assert_eq!(uci_squares("e7e8q"), Some((Square::E7, Square::E8)));
        assert_eq!(uci_squares("(none)"), None);
        assert_eq!(uci_squares("0000"), None);
        assert_eq!(uci_squares(""), None);
    }
}
