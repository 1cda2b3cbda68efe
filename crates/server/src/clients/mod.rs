pub mod chess_com;
pub mod lichess;

use crate::config::Config;
use chess_com::ChessComClient;
use lichess::LichessClient;

/// Where `GET /api/analyze/{username}` gets its games from.
pub struct GameSources {
    pub chess_com: ChessComClient,
    /// Only set when a Lichess token is configured
    pub lichess: Option<LichessClient>,
}

impl GameSources {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let lichess = match &config.lichess_api_token {
            Some(token) => Some(LichessClient::new(&config.lichess_api_url, token)?),
            None => None,
        };

        Ok(Self {
            chess_com: ChessComClient::new(&config.chess_com_api_url)?,
            lichess,
        })
    }
}
