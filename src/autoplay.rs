//! Timed replay playback.

use std::time::Duration;

use knight_swap_rules::{Replay, ReplayError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::ReplayFrame;

/// Delay between automatic steps when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(800);

/// A running autoplay task.
///
/// Advances its cursor one move per interval and sends each frame on the
/// channel returned by [`Autoplay::start`]. Ends at the last move, on a corrupt
/// log, or when stopped.
#[derive(Debug)]
pub struct Autoplay {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Replay>,
}

impl Autoplay {
    /// Starts advancing `replay` from its current index.
    #[instrument(skip(replay), fields(index = replay.index(), last = replay.last_index()))]
    pub fn start(
        replay: Replay,
        interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Result<ReplayFrame, ReplayError>>) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run(replay, interval, frames_tx, stop_rx));
        info!(interval_ms = interval.as_millis() as u64, "Autoplay started");
        (
            Self {
                stop: Some(stop_tx),
                task,
            },
            frames_rx,
        )
    }

    /// Whether the task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the ticker and returns the cursor where it halted.
    pub async fn stop(mut self) -> Replay {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.join().await
    }

    /// Waits for playback to reach its end and returns the cursor.
    pub async fn finished(mut self) -> Replay {
        self.join().await
    }

    async fn join(&mut self) -> Replay {
        match (&mut self.task).await {
            Ok(replay) => replay,
            Err(e) => {
                warn!(error = %e, "Autoplay task failed");
                Replay::new(Vec::new())
            }
        }
    }
}

async fn run(
    mut replay: Replay,
    interval: Duration,
    frames: mpsc::UnboundedSender<Result<ReplayFrame, ReplayError>>,
    mut stop: oneshot::Receiver<()>,
) -> Replay {
    while !replay.at_end() {
        tokio::select! {
            _ = &mut stop => {
                debug!(index = replay.index(), "Autoplay stopped");
                return replay;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        let frame = replay.next().and_then(|_| ReplayFrame::capture(&replay));
        let failed = frame.is_err();
        if frames.send(frame).is_err() || failed {
            break;
        }
    }

    debug!(index = replay.index(), "Autoplay finished");
    replay
}
