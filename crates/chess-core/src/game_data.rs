use serde::{Deserialize, Serialize};
use shakmaty::Color;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub event: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
    pub pgn: String,
}

impl GameData {
    pub fn participants(&self) -> Participants {
        Participants::new(&self.metadata.white, &self.metadata.black)
    }
}

/// The two named sides of a game as declared by whoever supplied it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub white: Option<String>,
    pub black: Option<String>,
}

impl Participants {
    pub fn new(white: impl Into<String>, black: impl Into<String>) -> Self {
        Self {
            white: Some(white.into()),
            black: Some(black.into()),
        }
    }

    /// Color played by `username`, compared case-insensitively.
    /// When both names match, Black wins (same as the import format's own lookup order).
    pub fn color_of(&self, username: &str) -> Option<Color> {
        let wanted = username.to_lowercase();
        let matches = |name: &Option<String>| {
            name.as_deref().is_some_and(|n| n.to_lowercase() == wanted)
        };

        if matches(&self.black) {
            Some(Color::Black)
        } else if matches(&self.white) {
            Some(Color::White)
        } else {
            None
        }
    }
}

/// A game as handed to the classifier: the ordered move list plus who played it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameImport {
    pub moves: Vec<String>,
    pub participants: Participants,
}

impl From<GameData> for GameImport {
    fn from(game: GameData) -> Self {
        let participants = game.participants();
        Self {
            moves: game.moves,
            participants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_of_is_case_insensitive() {
        let players = Participants::new("Honorable_Knight00", "opponent");
        assert_eq!(players.color_of("honorable_knight00"), Some(Color::White));
        assert_eq!(players.color_of("OPPONENT"), Some(Color::Black));
        assert_eq!(players.color_of("someone_else"), None);
    }

    #[test]
    fn test_color_of_missing_names() {
        let players = Participants {
            white: None,
            black: Some("bob".into()),
        };
        assert_eq!(players.color_of("alice"), None);
        assert_eq!(players.color_of("Bob"), Some(Color::Black));
        assert_eq!(Participants::default().color_of(""), None);
    }
}
