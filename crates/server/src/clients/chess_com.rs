use reqwest::Client;
use serde_json::Value;

/// Monthly archives scanned, newest first, before giving up on finding a game.
const MAX_ARCHIVES_SCANNED: usize = 3;

pub struct ChessComClient {
    client: Client,
    base_url: String,
}

impl ChessComClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("BlunderScan/1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the list of monthly archives that actually contain games.
    /// Returns (year, month) pairs sorted newest-first.
    pub async fn fetch_archives(&self, username: &str) -> Result<Vec<(i32, u32)>, String> {
        let url = format!(
            "{}/player/{}/games/archives",
            self.base_url,
            username.to_lowercase()
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Archives request error: {e}"))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        if !resp.status().is_success() {
            return Err(format!("Archives HTTP {}", resp.status()));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("Archives JSON parse error: {e}"))?;

        Ok(parse_archives(&data))
    }

    /// Raw game objects of one monthly archive, oldest first as served.
    pub async fn fetch_month(
        &self,
        username: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<Value>, String> {
        let url = format!(
            "{}/player/{}/games/{}/{:02}",
            self.base_url,
            username.to_lowercase(),
            year,
            month
        );

        // Rate limit
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Request error: {e}"))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(vec![]);
        }
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("JSON parse error: {e}"))?;

        Ok(data["games"].as_array().cloned().unwrap_or_default())
    }

    /// PGN of the user's most recent standard game in one of `time_classes`.
    pub async fn fetch_latest_game(
        &self,
        username: &str,
        time_classes: &[String],
    ) -> Result<Option<String>, String> {
        let archives = self.fetch_archives(username).await?;
        if archives.is_empty() {
            tracing::info!(username, "No Chess.com archives");
            return Ok(None);
        }

        for (year, month) in archives.into_iter().take(MAX_ARCHIVES_SCANNED) {
            let games = self.fetch_month(username, year, month).await?;
            if let Some(pgn) = latest_eligible(&games, time_classes) {
                tracing::debug!(username, year, month, "Found latest eligible game");
                return Ok(Some(pgn));
            }
        }

        Ok(None)
    }
}

fn parse_archives(data: &Value) -> Vec<(i32, u32)> {
    let mut months: Vec<(i32, u32)> = data["archives"]
        .as_array()
        .map(|a| a.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(|v| {
            // URLs look like "https://api.chess.com/pub/player/username/games/2024/03"
            let s = v.as_str()?;
            let parts: Vec<&str> = s.trim_end_matches('/').rsplit('/').collect();
            let month: u32 = parts.first()?.parse().ok()?;
            let year: i32 = parts.get(1)?.parse().ok()?;
            Some((year, month))
        })
        .collect();

    months.sort_by(|a, b| b.cmp(a));
    months
}

/// Newest game (by `end_time`) that is standard chess, in an eligible time class, with a PGN.
fn latest_eligible(games: &[Value], time_classes: &[String]) -> Option<String> {
    games
        .iter()
        .enumerate()
        .filter(|(_, game)| {
            let rules = game.get("rules").and_then(|v| v.as_str()).unwrap_or("chess");
            let time_class = game.get("time_class").and_then(|v| v.as_str()).unwrap_or("");
            rules == "chess" && time_classes.iter().any(|c| c == time_class)
        })
        .filter_map(|(idx, game)| {
            let pgn = game.get("pgn").and_then(|v| v.as_str())?;
            let end_time = game.get("end_time").and_then(|v| v.as_i64()).unwrap_or(0);
            // Archive order breaks ties
            Some(((end_time, idx), pgn))
        })
        .max_by_key(|(key, _)| *key)
        .map(|(_, pgn)| pgn.to_string())
}
