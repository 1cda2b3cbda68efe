//! Lightweight regex-based PGN parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::game_data::{GameData, GameMetadata};
use crate::STANDARD_START_FEN;

static HEADER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid header regex"));
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid header regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid comment regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O")
        .expect("valid move regex")
});

/// Parse a single-game PGN string into a GameData struct.
/// Games that start from a non-standard position are rejected.
pub fn parse_pgn(pgn: &str) -> Option<GameData> {
    let mut white = "Unknown".to_string();
    let mut black = "Unknown".to_string();
    let mut result = "*".to_string();
    let mut date = None;
    let mut time_control = None;
    let mut eco = None;
    let mut event = None;
    let mut link = None;
    let mut setup = None;
    let mut fen = None;

    for cap in HEADER_TAG_RE.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => white = value,
            "Black" => black = value,
            "Result" => result = value,
            "Date" => date = Some(value),
            "TimeControl" => time_control = Some(value),
            "ECO" => eco = Some(value),
            "Event" => event = Some(value),
            "Link" => link = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // Replay always starts from the initial position
    if setup.as_deref() == Some("1") {
        if let Some(ref f) = fen {
            if f != STANDARD_START_FEN {
                return None;
            }
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return None;
    }

    Some(GameData {
        metadata: GameMetadata {
            white,
            black,
            result,
            date,
            time_control,
            eco,
            event,
            link,
        },
        moves,
        pgn: pgn.to_string(),
    })
}

/// Split a multi-game PGN file into one string per game.
/// A new game starts at the first header line that follows movetext.
pub fn split_games(text: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();
    let mut seen_movetext = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && seen_movetext {
            games.push(std::mem::take(&mut current));
            seen_movetext = false;
        }
        if !trimmed.is_empty() && !trimmed.starts_with('[') {
            seen_movetext = true;
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.trim().is_empty() {
        games.push(current);
    }
    games
}

/// First game in `text` where `username` played either side (case-insensitive).
pub fn find_game_for_user(text: &str, username: &str) -> Option<GameData> {
    split_games(text)
        .iter()
        .filter_map(|g| parse_pgn(g))
        .find(|game| game.participants().color_of(username).is_some())
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_variations = strip_variations(&no_comments);

    MOVE_RE
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Drop `( ... )` variations, including nested ones.
fn strip_variations(text: &str) -> String {
    let mut depth = 0usize;
    text.chars()
        .filter(|&c| match c {
            '(' => {
                depth += 1;
                false
            }
            ')' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect()
}

/// Extract a string value from a PGN header (e.g. Link, WhiteTitle).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}
