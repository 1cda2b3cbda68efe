use chess_core::{GameImport, Participants};
use reqwest::Client;
use serde_json::Value;

/// A game as exported by Lichess: SAN moves plus the named players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LichessGame {
    pub moves: Vec<String>,
    pub players: Participants,
}

impl From<LichessGame> for GameImport {
    fn from(game: LichessGame) -> Self {
        Self {
            moves: game.moves,
            participants: game.players,
        }
    }
}

pub struct LichessClient {
    client: Client,
    base_url: String,
    token: String,
}

impl LichessClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("BlunderScan/1.0")
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Import a PGN and return the new Lichess game id.
    pub async fn import_pgn(&self, pgn: &str) -> Result<String, String> {
        let url = format!("{}/api/import", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .form(&[("pgn", pgn)])
            .send()
            .await
            .map_err(|e| format!("Import request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("Import HTTP {}", resp.status()));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("Import JSON parse error: {e}"))?;

        let id = data
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "Import response has no game id".to_string())?;

        if let Some(link) = data.get("url").and_then(|v| v.as_str()) {
            tracing::info!(%link, "Imported game to Lichess");
        }
        Ok(id.to_string())
    }

    /// Export a game as JSON.
    pub async fn export_game(&self, id: &str) -> Result<LichessGame, String> {
        let url = format!("{}/game/export/{}", self.base_url, id);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| format!("Export request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("Export HTTP {}", resp.status()));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("Export JSON parse error: {e}"))?;

        parse_export(&data).ok_or_else(|| "Export response has no moves".to_string())
    }
}

fn parse_export(data: &Value) -> Option<LichessGame> {
    let moves = data.get("moves")?.as_str()?;

    // Imported games carry a bare name; Lichess accounts nest it under `user`
    let player = |color: &str| {
        let side = data.get("players")?.get(color)?;
        side.get("user")
            .and_then(|u| u.get("name"))
            .or_else(|| side.get("name"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    Some(LichessGame {
        moves: moves.split_whitespace().map(|m| m.to_string()).collect(),
        players: Participants {
            white: player("white"),
            black: player("black"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_imported_game() {
        let data = json!({
            "id": "AbCd1234",
            "moves": "e4 e5 Qh5 Nc6",
            "players": {
                "white": {"name": "honorable_knight00"},
                "black": {"name": "Opponent"}
            }
        });
        let game = parse_export(&data).unwrap();
        assert_eq!(game.moves, vec!["e4", "e5", "Qh5", "Nc6"]);
        assert_eq!(game.players.white.as_deref(), Some("honorable_knight00"));
        assert_eq!(game.players.black.as_deref(), Some("Opponent"));
    }

    #[test]
    fn test_parse_account_players() {
        let data = json!({
            "moves": "d4",
            "players": {
                "white": {"user": {"name": "Alice", "id": "alice"}, "rating": 1500},
                "black": {"aiLevel": 3}
            }
        });
        let game = parse_export(&data).unwrap();
        assert_eq!(game.players.white.as_deref(), Some("Alice"));
        assert_eq!(game.players.black, None);
    }

    #[test]
    fn test_parse_missing_moves() {
        assert!(parse_export(&json!({"players": {}})).is_none());
    }
}
