//! Per-view favourite status tracking.
//!
//! A [`FavoriteStatusTracker`] owns the published status for one book in one
//! view. Results of lookups and toggles are applied only while the tracker is
//! mounted, and a refresh that started before a toggle never overwrites the
//! toggle's result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::ports::{FavoritesCommand, FavoritesQuery, ToggleOutcome};
use crate::domain::{BookData, BookKey, Error, FavoriteId, Session};

/// Favourite status of one book as seen by one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteStatus {
    /// No lookup has completed yet.
    Checking,
    /// The book is favourited under this record id.
    Favorited(FavoriteId),
    /// The book is not favourited, or the lookup failed.
    NotFavorited,
}

impl FavoriteStatus {
    /// Whether the status shows the book as favourited.
    pub fn is_favorited(&self) -> bool {
        matches!(self, Self::Favorited(_))
    }

    /// Record id when favourited.
    pub fn favorite_id(&self) -> Option<&FavoriteId> {
        match self {
            Self::Favorited(id) => Some(id),
            Self::Checking | Self::NotFavorited => None,
        }
    }
}

impl From<ToggleOutcome> for FavoriteStatus {
    fn from(value: ToggleOutcome) -> Self {
        match value {
            ToggleOutcome::Added(id) => Self::Favorited(id),
            ToggleOutcome::Removed(_) => Self::NotFavorited,
        }
    }
}

/// Clears the in-flight toggle flag when the toggle finishes or is dropped.
struct ToggleGuard<'a>(&'a AtomicBool);

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps one view's favourite status in step with the store.
pub struct FavoriteStatusTracker<R> {
    favorites: Arc<R>,
    session: Session,
    key: BookKey,
    book: BookData,
    status: watch::Sender<FavoriteStatus>,
    mounted: AtomicBool,
    toggling: AtomicBool,
    generation: AtomicU64,
}

impl<R> FavoriteStatusTracker<R>
where
    R: FavoritesQuery + FavoritesCommand,
{
    /// Create a mounted tracker for `key` in the `Checking` state.
    ///
    /// `book` is the payload stored when a toggle adds the favourite.
    pub fn new(favorites: Arc<R>, session: Session, key: BookKey, book: BookData) -> Self {
        let (status, _) = watch::channel(FavoriteStatus::Checking);
        Self {
            favorites,
            session,
            key,
            book,
            status,
            mounted: AtomicBool::new(true),
            toggling: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<FavoriteStatus> {
        self.status.subscribe()
    }

    /// Current published status.
    pub fn status(&self) -> FavoriteStatus {
        self.status.borrow().clone()
    }

    /// Book key this tracker follows.
    pub fn key(&self) -> &BookKey {
        &self.key
    }

    /// Whether results are still applied.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Stop applying results. In-flight calls still complete.
    pub fn detach(&self) {
        self.mounted.store(false, Ordering::Release);
        debug!(book_key = %self.key, "favorite tracker detached");
    }

    /// Look the book up again and publish the result.
    ///
    /// Failures, including an anonymous session, publish `NotFavorited`.
    pub async fn refresh(&self) {
        if !self.is_mounted() {
            return;
        }
        let generation = self.generation.load(Ordering::Acquire);
        let next = match self.favorites.find_by_key(&self.session, &self.key).await {
            Ok(Some(id)) => FavoriteStatus::Favorited(id),
            Ok(None) => FavoriteStatus::NotFavorited,
            Err(error) => {
                warn!(
                    book_key = %self.key,
                    error = %error,
                    "favorite status check failed; showing not favorited"
                );
                FavoriteStatus::NotFavorited
            }
        };
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(book_key = %self.key, "discarding refresh superseded by a toggle");
            return;
        }
        self.publish(next);
    }

    /// Toggle the favourite and publish the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Conflict`] when a toggle on this
    /// tracker is already running, otherwise the repository error. The
    /// published status is left unchanged on error.
    pub async fn toggle(&self) -> Result<FavoriteStatus, Error> {
        if self.toggling.swap(true, Ordering::AcqRel) {
            return Err(Error::conflict("a favorite toggle is already in progress"));
        }
        let _guard = ToggleGuard(&self.toggling);

        let outcome = self
            .favorites
            .toggle_favorite(&self.session, &self.key, &self.book)
            .await?;
        let next = FavoriteStatus::from(outcome);
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.publish(next.clone());
        Ok(next)
    }

    fn publish(&self, next: FavoriteStatus) {
        if !self.is_mounted() {
            debug!(book_key = %self.key, "tracker unmounted; dropping status update");
            return;
        }
        let changed = self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });
        if changed {
            debug!(book_key = %self.key, status = ?next, "favorite status changed");
        }
    }
}
