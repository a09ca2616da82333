//! Favourites list view state.
//!
//! The list view always reloads the whole collection after a toggle rather
//! than patching its local copy, so it reflects whatever the store holds.
//! Loads are numbered when they start; a load never replaces the result of a
//! load that started after it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::ports::{FavoritesCommand, FavoritesQuery, ToggleOutcome};
use crate::domain::{BookData, BookKey, Error, ErrorCode, FavoriteRecord, Session};

/// Message shown when the list cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load favorites. Please try again later.";

/// What the favourites list currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesListState {
    /// A load is in progress and nothing has been shown yet.
    Loading,
    /// The user's favourites in store order.
    Loaded(Vec<FavoriteRecord>),
    /// The user has no favourites.
    Empty,
    /// No user is signed in.
    Unauthenticated,
    /// The last load failed.
    Failed(String),
}

impl FavoritesListState {
    /// Records currently shown, if any.
    pub fn records(&self) -> &[FavoriteRecord] {
        match self {
            Self::Loaded(records) => records,
            Self::Loading | Self::Empty | Self::Unauthenticated | Self::Failed(_) => &[],
        }
    }
}

/// State holder for a favourites list screen.
pub struct FavoritesListView<R> {
    favorites: Arc<R>,
    session: Session,
    refetch_delay: Duration,
    state: watch::Sender<FavoritesListState>,
    mounted: AtomicBool,
    next_load: AtomicU64,
    published_load: AtomicU64,
}

impl<R> FavoritesListView<R>
where
    R: FavoritesQuery + FavoritesCommand,
{
    /// Create a view in the `Loading` state.
    pub fn new(favorites: Arc<R>, session: Session, refetch_delay: Duration) -> Self {
        let (state, _) = watch::channel(FavoritesListState::Loading);
        Self {
            favorites,
            session,
            refetch_delay,
            state,
            mounted: AtomicBool::new(true),
            next_load: AtomicU64::new(0),
            published_load: AtomicU64::new(0),
        }
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FavoritesListState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> FavoritesListState {
        self.state.borrow().clone()
    }

    /// Stop applying load results.
    pub fn detach(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    /// Fetch the full list and publish the resulting state.
    ///
    /// The fetched state is returned either way; it is published only while
    /// the view is mounted and no later load has published already.
    pub async fn load(&self) -> FavoritesListState {
        let ticket = self.next_load.fetch_add(1, Ordering::AcqRel) + 1;
        let next = match self.favorites.list(&self.session).await {
            Ok(records) if records.is_empty() => FavoritesListState::Empty,
            Ok(records) => FavoritesListState::Loaded(records),
            Err(error) if error.code() == ErrorCode::Unauthenticated => {
                FavoritesListState::Unauthenticated
            }
            Err(error) => {
                warn!(error = %error, "failed to load favorites list");
                FavoritesListState::Failed(LOAD_FAILED_MESSAGE.to_owned())
            }
        };
        if self.mounted.load(Ordering::Acquire) {
            self.publish(ticket, next.clone());
        }
        next
    }

    fn publish(&self, ticket: u64, next: FavoritesListState) {
        // The watch lock serialises publishers, so the ticket check and the
        // replacement happen together.
        let published = self.state.send_if_modified(|current| {
            if self.published_load.load(Ordering::Acquire) > ticket {
                return false;
            }
            self.published_load.store(ticket, Ordering::Release);
            *current = next.clone();
            true
        });
        if published {
            debug!(records = next.records().len(), "favorites list updated");
        } else {
            debug!(load = ticket, "discarding list load superseded by a later one");
        }
    }

    /// Toggle `key`, wait for the write to become visible, then reload.
    ///
    /// # Errors
    ///
    /// Returns the toggle error; the state is left untouched in that case.
    pub async fn toggle(&self, key: &BookKey, book: &BookData) -> Result<ToggleOutcome, Error> {
        let outcome = self
            .favorites
            .toggle_favorite(&self.session, key, book)
            .await?;
        tokio::time::sleep(self.refetch_delay).await;
        self.load().await;
        Ok(outcome)
    }

    /// Toggle a record shown in the list, keyed by its stored book key.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::InvalidRequest`] when the record has no key,
    /// otherwise as [`FavoritesListView::toggle`].
    pub async fn toggle_record(&self, record: &FavoriteRecord) -> Result<ToggleOutcome, Error> {
        let key = record
            .book
            .key
            .clone()
            .ok_or_else(|| Error::invalid_request("favorite has no book key"))?;
        self.toggle(&key, &record.book).await
    }
}
