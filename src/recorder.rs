//! Best-effort, ordered persistence of game events.
//!
//! The game applies moves locally and hands the resulting [`GameEvent`]s to a
//! [`SessionRecorder`]. A single worker task writes them to the store in the
//! order they were recorded. Failures are logged and kept in the
//! [`RecorderStatus`]; they never touch the local game.

use std::sync::Arc;

use derive_getters::Getters;
use knight_swap_rules::GameEvent;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::{SessionId, SessionStore};

/// Snapshot of what the recorder has persisted so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct RecorderStatus {
    /// Session currently being written, if creation succeeded.
    session_id: Option<SessionId>,
    /// Most recent write failure.
    last_error: Option<String>,
    /// Number of failed writes.
    failures: u32,
    /// Moves acknowledged by the store across all sessions.
    persisted_moves: u32,
}

enum Command {
    Event(GameEvent),
    Flush(oneshot::Sender<()>),
}

/// Queues game events for a single background writer.
#[derive(Debug)]
pub struct SessionRecorder {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<RecorderStatus>,
    worker: JoinHandle<()>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl SessionRecorder {
    /// Spawns the writer task on the current runtime.
    #[instrument(skip(store))]
    pub fn spawn(store: Arc<dyn SessionStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(RecorderStatus::default());
        let worker = tokio::spawn(run_worker(store, rx, status_tx));
        info!("Session recorder started");
        Self { tx, status, worker }
    }

    /// Queues one event. Never blocks.
    pub fn record(&self, event: GameEvent) {
        if self.tx.send(Command::Event(event)).is_err() {
            warn!(?event, "Recorder worker is gone; event dropped");
        }
    }

    /// Queues events in order.
    pub fn record_all(&self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.record(event);
        }
    }

    /// Current status.
    pub fn status(&self) -> RecorderStatus {
        self.status.borrow().clone()
    }

    /// Waits until every event queued before this call has been written or has failed.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Drains the queue, stops the worker and returns the final status.
    #[instrument(skip(self))]
    pub async fn shutdown(self) -> RecorderStatus {
        let Self { tx, status, worker } = self;
        drop(tx);
        if let Err(e) = worker.await {
            warn!(error = %e, "Recorder worker ended abnormally");
        }
        let last = status.borrow().clone();
        info!(failures = last.failures, persisted_moves = last.persisted_moves, "Session recorder stopped");
        last
    }
}

async fn run_worker(
    store: Arc<dyn SessionStore>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<RecorderStatus>,
) {
    let mut current: Option<SessionId> = None;

    while let Some(command) = rx.recv().await {
        let event = match command {
            Command::Event(event) => event,
            Command::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };

        let outcome = match event {
            GameEvent::SessionStarted => match store.create_session().await {
                Ok(id) => {
                    debug!(session_id = %id, "Recording session");
                    current = Some(id.clone());
                    status.send_modify(|s| s.session_id = Some(id));
                    Ok(())
                }
                Err(e) => {
                    current = None;
                    status.send_modify(|s| s.session_id = None);
                    Err(e.to_string())
                }
            },
            GameEvent::MoveRecorded(mv) => match &current {
                Some(id) => match store.append_move(id, mv).await {
                    Ok(()) => {
                        status.send_modify(|s| s.persisted_moves += 1);
                        Ok(())
                    }
                    Err(e) => Err(e.to_string()),
                },
                None => {
                    warn!(mv = %mv, "No session for move; dropped");
                    Ok(())
                }
            },
            GameEvent::SessionCompleted(completion) => match current.take() {
                Some(id) => store
                    .complete_session(&id, completion.is_won, completion.duration_seconds)
                    .await
                    .map_err(|e| e.to_string()),
                None => {
                    warn!(?completion, "No session for completion; dropped");
                    Ok(())
                }
            },
        };

        if let Err(message) = outcome {
            warn!(?event, error = %message, "Failed to persist game event");
            status.send_modify(|s| {
                s.failures += 1;
                s.last_error = Some(message);
            });
        }
    }

    debug!("Recorder queue closed");
}
