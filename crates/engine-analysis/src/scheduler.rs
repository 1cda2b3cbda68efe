//! FIFO evaluation queue in front of the single engine session.
//!
//! One worker task owns the session and runs jobs strictly one at a time in
//! submission order. A job's reply is sent before the engine is probed for
//! idleness, and the next job never starts until that probe (or a reset)
//! has completed, so output from one search can never reach another's parser.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{AnalysisError, EngineError};
use crate::evaluator::{EvalResult, SearchParser};
use crate::session::EngineSession;
use crate::uci::EngineCommand;

type Reply = oneshot::Sender<Result<EvalResult, AnalysisError>>;

struct EvalJob {
    fen: String,
    depth: u32,
    reply: Reply,
}

/// Handle for submitting evaluations. Cheap to clone; the worker shuts the
/// engine down once every handle is dropped and the queue has drained.
#[derive(Clone)]
pub struct EvalScheduler {
    tx: mpsc::UnboundedSender<EvalJob>,
    queued: Arc<AtomicUsize>,
}

/// A submitted evaluation. Dropping it before completion cancels the job if
/// it has not started yet.
pub struct PendingEval {
    rx: oneshot::Receiver<Result<EvalResult, AnalysisError>>,
}

impl PendingEval {
    pub async fn result(self) -> Result<EvalResult, AnalysisError> {
        self.rx.await.unwrap_or(Err(AnalysisError::SchedulerClosed))
    }
}

impl EvalScheduler {
    /// Move `session` into a worker task and return the submission handle.
    pub fn spawn(session: EngineSession, config: &EngineConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queued = Arc::new(AtomicUsize::new(0));

        let worker = Worker {
            session,
            rx,
            queued: queued.clone(),
            eval_timeout: config.eval_timeout,
            idle_timeout: config.handshake_timeout,
            healthy: true,
        };
        let handle = tokio::spawn(worker.run());

        (Self { tx, queued }, handle)
    }

    /// Enqueue an evaluation of `fen` at `depth`.
    pub fn submit(&self, fen: impl Into<String>, depth: u32) -> PendingEval {
        let (reply, rx) = oneshot::channel();
        let job = EvalJob {
            fen: fen.into(),
            depth,
            reply,
        };

        self.queued.fetch_add(1, Ordering::AcqRel);
        if self.tx.send(job).is_err() {
            // Worker is gone; the dropped reply resolves as SchedulerClosed
            self.queued.fetch_sub(1, Ordering::AcqRel);
        }
        PendingEval { rx }
    }

    /// Jobs waiting behind the one currently running.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }
}

struct Worker {
    session: EngineSession,
    rx: mpsc::UnboundedReceiver<EvalJob>,
    queued: Arc<AtomicUsize>,
    eval_timeout: Duration,
    idle_timeout: Duration,
    healthy: bool,
}

impl Worker {
    async fn run(mut self) {
        info!("Evaluation scheduler started");

        while let Some(job) = self.rx.recv().await {
            self.queued.fetch_sub(1, Ordering::AcqRel);

            if job.reply.is_closed() {
                debug!(fen = %job.fen, "Skipping evaluation nobody is waiting for");
                continue;
            }
            if !self.healthy {
                let _ = job.reply.send(Err(AnalysisError::EngineUnavailable));
                continue;
            }

            let start = Instant::now();
            let outcome = self.search(&job.fen, job.depth).await;

            match outcome {
                Ok(result) => {
                    debug!(
                        fen = %job.fen,
                        best_move = %result.best_move,
                        score = ?result.eval_score,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Evaluation complete"
                    );
                    let _ = job.reply.send(Ok(result));

                    if let Err(e) = self.session.probe_idle(self.idle_timeout).await {
                        warn!(error = %e, "Engine did not confirm idle after search");
                        self.recover().await;
                    }
                }
                Err(e @ AnalysisError::EvalTimeout { .. }) => {
                    warn!(error = %e, "Evaluation timed out, resetting engine");
                    let _ = job.reply.send(Err(e));
                    self.recover().await;
                }
                Err(e) => {
                    error!(fen = %job.fen, error = %e, "Evaluation failed");
                    let _ = job.reply.send(Err(e));
                    if self.session.is_alive() {
                        self.recover().await;
                    } else {
                        self.healthy = false;
                    }
                }
            }
        }

        info!("Evaluation queue closed, shutting down engine");
        self.session.shutdown().await;
    }

    async fn search(&mut self, fen: &str, depth: u32) -> Result<EvalResult, AnalysisError> {
        let mut sub = self.session.set_listener()?;

        self.session.send(&EngineCommand::UciNewGame).await?;
        self.session
            .send(&EngineCommand::Position {
                fen: fen.to_string(),
            })
            .await?;
        self.session.send(&EngineCommand::GoDepth(depth)).await?;

        let mut parser = SearchParser::new(fen);
        let search = async {
            while let Some(line) = sub.next_line().await {
                if let Some(result) = parser.feed(&line) {
                    return Ok(result);
                }
            }
            Err(AnalysisError::from(EngineError::Terminated))
        };

        tokio::time::timeout(self.eval_timeout, search)
            .await
            .map_err(|_| AnalysisError::EvalTimeout {
                fen: fen.to_string(),
                after: self.eval_timeout,
            })?
    }

    async fn recover(&mut self) {
        if let Err(e) = self.session.reset().await {
            error!(error = %e, "Engine reset failed, failing remaining evaluations");
            self.healthy = false;
        }
    }
}
