//! Periodic refresh of unread counts

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::counts::CountSource;
use crate::store::ReadStateStore;

use super::UnreadReconciler;

/// Re-runs [`UnreadReconciler::refresh_counts`] on a fixed cadence
///
/// The first refresh happens one interval after [`start`](Self::start); run
/// an initial refresh yourself if the counts are needed sooner. The task stops
/// on [`stop`](Self::stop), on drop, or once the reconciler is shut down.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Create a stopped scheduler
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: None,
        }
    }

    /// Refresh cadence
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Start refreshing `reconciler`, replacing any running task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<S: ReadStateStore, C: CountSource>(&mut self, reconciler: UnreadReconciler<S, C>) {
        self.stop();

        let period = self.interval;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !reconciler.is_alive() {
                    log::debug!("Reconciler shut down, stopping refresh");
                    break;
                }
                reconciler.refresh_counts().await;
            }
        }));
        log::debug!("Refreshing unread counts every {period:?}");
    }

    /// Cancel the refresh task
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a refresh task is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
