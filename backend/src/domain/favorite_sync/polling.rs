//! Periodic status refresh for mounted trackers.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use super::status::FavoriteStatusTracker;
use crate::domain::ports::{FavoritesCommand, FavoritesQuery};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running poll task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop polling now.
    pub fn cancel(self) {
        drop(self);
    }

    /// Whether the poll task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<R> FavoriteStatusTracker<R>
where
    R: FavoritesQuery + FavoritesCommand + 'static,
{
    /// Refresh immediately and then every `interval` on the Tokio runtime.
    ///
    /// The task holds only a weak reference: it exits once every strong
    /// handle to the tracker is gone or the tracker is detached.
    pub fn spawn_polling(self: &Arc<Self>, interval: Duration) -> PollHandle {
        let tracker: Weak<Self> = Arc::downgrade(self);
        let period = interval.max(MIN_POLL_INTERVAL);
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(tracker) = tracker.upgrade() else {
                    break;
                };
                if !tracker.is_mounted() {
                    debug!(book_key = %tracker.key(), "stopping poll for detached tracker");
                    break;
                }
                tracker.refresh().await;
            }
        });
        PollHandle { task }
    }
}
