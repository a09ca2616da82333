//! Keeping rendered views in step with the favourites store.
//!
//! Purpose: give each view an owned, cancellable handle on favourite state
//! instead of ad-hoc effects. A [`FavoriteStatusTracker`] follows one book,
//! optionally polled through a [`PollHandle`]; a [`FavoritesListView`]
//! follows the whole collection and reloads it after every toggle.
//!
//! Public surface:
//! - [`SyncSettings`]: poll interval and post-toggle refetch delay.
//! - [`FavoriteSync`]: builds trackers and list views over one repository.
//! - [`FavoriteStatus`], [`FavoriteStatusTracker`], [`PollHandle`].
//! - [`FavoritesListState`], [`FavoritesListView`].

mod list_view;
mod polling;
mod status;

use std::sync::Arc;
use std::time::Duration;

pub use self::list_view::{FavoritesListState, FavoritesListView, LOAD_FAILED_MESSAGE};
pub use self::polling::PollHandle;
pub use self::status::{FavoriteStatus, FavoriteStatusTracker};

use crate::domain::ports::{FavoritesCommand, FavoritesQuery};
use crate::domain::{BookData, BookKey, Session};

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default wait between a list toggle and the refetch.
pub const DEFAULT_LIST_REFETCH_DELAY: Duration = Duration::from_millis(100);

/// Timing knobs for synchronised views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Wait after a list toggle before reloading.
    pub list_refetch_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            list_refetch_delay: DEFAULT_LIST_REFETCH_DELAY,
        }
    }
}

/// Factory for trackers and list views sharing one repository.
pub struct FavoriteSync<R> {
    favorites: Arc<R>,
    settings: SyncSettings,
}

impl<R> FavoriteSync<R>
where
    R: FavoritesQuery + FavoritesCommand + 'static,
{
    /// Create a factory over `favorites`.
    pub fn new(favorites: Arc<R>, settings: SyncSettings) -> Self {
        Self {
            favorites,
            settings,
        }
    }

    /// Active timing settings.
    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// Tracker for `key` that refreshes only when asked.
    pub fn tracker(
        &self,
        session: Session,
        key: BookKey,
        book: BookData,
    ) -> Arc<FavoriteStatusTracker<R>> {
        Arc::new(FavoriteStatusTracker::new(
            Arc::clone(&self.favorites),
            session,
            key,
            book,
        ))
    }

    /// Tracker for `key` polled at the configured interval.
    ///
    /// The first refresh runs immediately. Polling stops when the returned
    /// handle is dropped.
    pub fn watch(
        &self,
        session: Session,
        key: BookKey,
        book: BookData,
    ) -> (Arc<FavoriteStatusTracker<R>>, PollHandle) {
        let tracker = self.tracker(session, key, book);
        let handle = tracker.spawn_polling(self.settings.poll_interval);
        (tracker, handle)
    }

    /// List view using the configured refetch delay.
    pub fn list_view(&self, session: Session) -> FavoritesListView<R> {
        FavoritesListView::new(
            Arc::clone(&self.favorites),
            session,
            self.settings.list_refetch_delay,
        )
    }
}
