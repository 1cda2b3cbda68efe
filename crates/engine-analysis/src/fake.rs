//! Scripted in-memory UCI engine for tests.
//!
//! Speaks just enough of the protocol for a session to handshake and search.
//! Every command received and line sent is appended to a shared log, prefixed
//! with `< ` and `> ` respectively.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::Notify;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::session::EngineSession;

const DEFAULT_SEARCH: [&str; 2] = ["info depth 1 score cp 13 pv e2e4", "bestmove e2e4 ponder e7e5"];

#[derive(Default)]
pub struct FakeEngine {
    replies: HashMap<String, Vec<String>>,
    hangs: HashSet<String>,
    log: Arc<Mutex<Vec<String>>>,
    kill: Arc<Notify>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to answer `go` with when the last position was `fen`.
    pub fn with_reply(mut self, fen: &str, lines: &[&str]) -> Self {
        self.replies.insert(
            fen.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    /// Never answer `go` for `fen` until told to `stop`.
    pub fn hang_on(mut self, fen: &str) -> Self {
        self.hangs.insert(fen.to_string());
        self
    }

    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }

    /// Notify to make the engine exit as if it crashed.
    pub fn kill_switch(&self) -> Arc<Notify> {
        self.kill.clone()
    }

    /// Start serving on an in-memory pipe and return our end of it.
    pub fn spawn(self) -> DuplexStream {
        let (ours, theirs) = tokio::io::duplex(64 * 1024);
        tokio::spawn(self.serve(theirs));
        ours
    }

    /// Spawn and run the handshake against it.
    pub async fn connect(self, config: &EngineConfig) -> Result<EngineSession, EngineError> {
        let (reader, writer) = tokio::io::split(self.spawn());
        EngineSession::connect(reader, writer, config).await
    }

    fn record(&self, entry: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(entry);
        }
    }

    async fn serve(self, stream: DuplexStream) {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut lines = BufReader::new(reader).lines();
        let mut fen = String::new();
        let mut hanging = false;

        loop {
            let line = tokio::select! {
                _ = self.kill.notified() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => line,
                    _ => break,
                },
            };
            self.record(format!("< {line}"));

            let replies: Vec<String> = match line.split_whitespace().next() {
                Some("uci") => vec!["id name FakeFish".into(), "uciok".into()],
                Some("isready") => vec!["readyok".into()],
                Some("position") => {
                    fen = line.strip_prefix("position fen ").unwrap_or_default().to_string();
                    Vec::new()
                }
                Some("go") if self.hangs.contains(&fen) => {
                    hanging = true;
                    Vec::new()
                }
                Some("go") => self
                    .replies
                    .get(&fen)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_SEARCH.iter().map(|l| l.to_string()).collect()),
                Some("stop") if hanging => {
                    hanging = false;
                    vec!["bestmove 0000".into()]
                }
                Some("quit") => break,
                _ => Vec::new(),
            };

            for reply in replies {
                self.record(format!("> {reply}"));
                if writer.write_all(format!("{reply}\n").as_bytes()).await.is_err() {
                    return;
                }
            }
            if writer.flush().await.is_err() {
                return;
            }
        }
    }
}
