use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Periodic one-second signal for a running session.
///
/// Spawns a task on the current tokio runtime that sends one tick per period;
/// the first tick arrives one period after [`Ticker::start`]. Disposing (or
/// dropping) the ticker stops the task so no tick is delivered afterwards.
pub struct Ticker {
    rx: mpsc::Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking every `period`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self {
            rx,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn every_second() -> Self {
        Self::start(Duration::from_secs(1))
    }

    /// Wait for the next tick. `None` once disposed.
    pub async fn tick(&mut self) -> Option<()> {
        self.handle.as_ref()?;
        self.rx.recv().await
    }

    /// Stop ticking. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            self.rx.close();
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.dispose();
    }
}
