//! Engine session: owns the engine process, runs the UCI handshake and routes
//! its output lines to at most one listener at a time.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::uci::{parse_line, EngineCommand, EngineLine};

/// Handshake progress. Only `Ready` accepts search commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    NotStarted,
    /// `uci` sent, waiting for `uciok`
    AwaitingEngineReady,
    /// `isready` sent after `uciok`, waiting for `readyok`
    AwaitingSearchReady,
    Ready,
    /// Idle probe: `isready` sent after a search, waiting for `readyok`
    AwaitingIdle,
}

struct ListenerSlot {
    next_id: u64,
    active: Option<(u64, mpsc::UnboundedSender<EngineLine>)>,
}

type SharedSlot = Arc<Mutex<ListenerSlot>>;

fn lock(slot: &SharedSlot) -> MutexGuard<'_, ListenerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The registered output listener. Dropping it frees the slot.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<EngineLine>,
    slot: SharedSlot,
}

impl Subscription {
    /// Next parsed line, or `None` once the engine output has closed.
    pub async fn next_line(&mut self) -> Option<EngineLine> {
        self.rx.recv().await
    }

    /// Skip output until the engine prints exactly `expected`.
    async fn wait_for(
        &mut self,
        expected: &'static str,
        after: Duration,
    ) -> Result<(), EngineError> {
        let target = parse_line(expected);
        let wait = async {
            while let Some(line) = self.rx.recv().await {
                if line == target {
                    return Ok(());
                }
            }
            Err(EngineError::Terminated)
        };
        tokio::time::timeout(after, wait)
            .await
            .map_err(|_| EngineError::Timeout { after, expected })?
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.active.as_ref().is_some_and(|(id, _)| *id == self.id) {
            slot.active = None;
        }
    }
}

pub struct EngineSession {
    child: Option<Child>,
    stdin: Box<dyn AsyncWrite + Send + Unpin>,
    state: HandshakeState,
    slot: SharedSlot,
    alive: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    options: Vec<(String, String)>,
    handshake_timeout: Duration,
}

impl EngineSession {
    /// Spawn the engine binary and complete the handshake.
    pub async fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: config.path.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(EngineError::Spawn {
                path: config.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "engine stdio was not captured",
                ),
            });
        };
        info!(path = %config.path, pid = ?child.id(), "Engine process spawned");

        let mut session = Self::attach(stdout, stdin, Some(child), config);
        session.handshake().await?;
        Ok(session)
    }

    /// Run the handshake over an already-connected byte stream pair.
    pub async fn connect<R, W>(
        reader: R,
        writer: W,
        config: &EngineConfig,
    ) -> Result<Self, EngineError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut session = Self::attach(reader, writer, None, config);
        session.handshake().await?;
        Ok(session)
    }

    fn attach<R, W>(reader: R, writer: W, child: Option<Child>, config: &EngineConfig) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let slot = Arc::new(Mutex::new(ListenerSlot {
            next_id: 0,
            active: None,
        }));
        let alive = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(pump_output(reader, slot.clone(), alive.clone()));

        Self {
            child,
            stdin: Box::new(writer),
            state: HandshakeState::NotStarted,
            slot,
            alive,
            reader,
            options: config.options(),
            handshake_timeout: config.handshake_timeout,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// False once the engine's output stream has closed.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Register the single output listener.
    pub fn set_listener(&self) -> Result<Subscription, EngineError> {
        let mut slot = lock(&self.slot);
        if !self.is_alive() {
            return Err(EngineError::Terminated);
        }
        if slot.active.as_ref().is_some_and(|(_, tx)| !tx.is_closed()) {
            return Err(EngineError::ListenerBusy);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        slot.next_id += 1;
        let id = slot.next_id;
        slot.active = Some((id, tx));

        Ok(Subscription {
            id,
            rx,
            slot: self.slot.clone(),
        })
    }

    /// Drop whatever listener is registered; its `next_line` then yields `None`.
    pub fn clear_listener(&self) {
        lock(&self.slot).active = None;
    }

    /// Send one command. Anything but `stop`/`quit` requires the `Ready` state.
    pub async fn send(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        let accepted = match command {
            EngineCommand::Stop | EngineCommand::Quit => true,
            _ => self.state == HandshakeState::Ready,
        };
        if !accepted {
            return Err(EngineError::NotReady {
                command: command.to_string(),
                state: self.state,
            });
        }
        self.write_line(command).await
    }

    async fn write_line(&mut self, command: &EngineCommand) -> Result<(), EngineError> {
        if !self.is_alive() {
            return Err(EngineError::Terminated);
        }
        let line = command.to_string();
        debug!(cmd = %line, "engine <");
        self.stdin.write_all(format!("{line}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// `uci` → `uciok` → options → `isready` → `readyok`.
    pub async fn handshake(&mut self) -> Result<(), EngineError> {
        let timeout = self.handshake_timeout;
        self.state = HandshakeState::NotStarted;
        let mut sub = self.set_listener()?;

        self.write_line(&EngineCommand::Uci).await?;
        self.state = HandshakeState::AwaitingEngineReady;
        sub.wait_for("uciok", timeout).await?;

        for (name, value) in self.options.clone() {
            let option = EngineCommand::SetOption { name, value };
            self.write_line(&option).await?;
        }

        self.write_line(&EngineCommand::IsReady).await?;
        self.state = HandshakeState::AwaitingSearchReady;
        sub.wait_for("readyok", timeout).await?;

        self.state = HandshakeState::Ready;
        info!("Engine handshake complete");
        Ok(())
    }

    /// Ask the engine whether it is idle; returns once `readyok` arrives.
    pub async fn probe_idle(&mut self, after: Duration) -> Result<(), EngineError> {
        if self.state != HandshakeState::Ready {
            return Err(EngineError::NotReady {
                command: EngineCommand::IsReady.to_string(),
                state: self.state,
            });
        }
        let mut sub = self.set_listener()?;

        self.write_line(&EngineCommand::IsReady).await?;
        self.state = HandshakeState::AwaitingIdle;
        sub.wait_for("readyok", after).await?;

        self.state = HandshakeState::Ready;
        Ok(())
    }

    /// Abort any running search and redo the handshake from scratch.
    pub async fn reset(&mut self) -> Result<(), EngineError> {
        warn!(state = ?self.state, "Resetting engine session");
        self.clear_listener();
        self.write_line(&EngineCommand::Stop).await?;
        self.handshake().await
    }

    /// Send `quit` and wait briefly for the process to exit, killing it otherwise.
    pub async fn shutdown(mut self) {
        let _ = self.write_line(&EngineCommand::Quit).await;
        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(Duration::from_secs(1), child.wait()).await {
                Ok(Ok(status)) => info!(%status, "Engine exited"),
                _ => {
                    warn!("Engine still running after quit, killing it");
                    let _ = child.kill().await;
                }
            }
        }
        self.reader.abort();
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
        self.reader.abort();
    }
}

/// Read engine stdout until EOF, handing each parsed line to the active listener.
async fn pump_output<R>(reader: R, slot: SharedSlot, alive: Arc<AtomicBool>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(raw)) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    continue;
                }
                trace!(line = trimmed, "engine >");
                let line = parse_line(trimmed);

                let guard = lock(&slot);
                match &guard.active {
                    Some((_, tx)) => {
                        let _ = tx.send(line);
                    }
                    None => trace!("No listener registered, dropping engine line"),
                }
            }
            Ok(None) => {
                warn!("Engine output closed, process terminated");
                break;
            }
            Err(e) => {
                error!(error = %e, "Failed to read engine output");
                break;
            }
        }
    }

    alive.store(false, Ordering::Release);
    lock(&slot).active = None;
}
