use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Enables the Lichess import/export round trip for fetched games
    pub lichess_api_token: Option<String>,
    /// Chess.com `time_class` values eligible for analysis
    pub chess_com_time_classes: Vec<String>,
    pub chess_com_api_url: String,
    pub lichess_api_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4000),
            lichess_api_token: env::var("LICHESS_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            chess_com_time_classes: env::var("CHESS_COM_TIME_CLASSES")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| parse_list("bullet,rapid,blitz")),
            chess_com_api_url: env::var("CHESS_COM_API_URL")
                .unwrap_or_else(|_| "https://api.chess.com/pub".to_string()),
            lichess_api_url: env::var("LICHESS_API_URL")
                .unwrap_or_else(|_| "https://lichess.org".to_string()),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
