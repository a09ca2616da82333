//! Favourites repository: the domain service behind the favourites ports.
//!
//! This service owns the mapping between the favourite concept and documents
//! in the user-scoped store collection. Lookups list the whole collection and
//! filter by key; there is no indexed query and no atomic upsert.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    FavoritesCommand, FavoritesQuery, FavoritesStore, FavoritesStoreError, ToggleOutcome,
};
use crate::domain::{
    BookData, BookKey, Error, FavoriteDocument, FavoriteId, FavoriteRecord, Session, UserId,
};

/// What lookups do when the store fails.
///
/// `find_by_key` and `is_favorite` historically swallowed store failures and
/// reported "not favourited". [`LookupFailurePolicy::FailOpen`] keeps that
/// behaviour; [`LookupFailurePolicy::Propagate`] surfaces the failure like
/// every other operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupFailurePolicy {
    /// Log the failure and report the book as not favourited.
    #[default]
    FailOpen,
    /// Return the failure to the caller.
    Propagate,
}

impl LookupFailurePolicy {
    /// Map the `fail_open_on_lookup_error` flag to a policy.
    ///
    /// # Examples
    /// ```
    /// use bookfoo::domain::LookupFailurePolicy;
    ///
    /// assert_eq!(LookupFailurePolicy::from_fail_open(true), LookupFailurePolicy::FailOpen);
    /// assert_eq!(LookupFailurePolicy::from_fail_open(false), LookupFailurePolicy::Propagate);
    /// ```
    pub fn from_fail_open(fail_open: bool) -> Self {
        if fail_open {
            Self::FailOpen
        } else {
            Self::Propagate
        }
    }
}

fn map_store_error(error: FavoritesStoreError) -> Error {
    match error {
        FavoritesStoreError::Unavailable { message } => {
            Error::service_unavailable(format!("favorites store unavailable: {message}"))
        }
        FavoritesStoreError::Rejected { message } => {
            Error::internal(format!("favorites store rejected the request: {message}"))
        }
        FavoritesStoreError::Decode { message } => {
            Error::internal(format!("favorites store payload invalid: {message}"))
        }
    }
}

/// Favourites repository implementing the favourites driving ports.
#[derive(Clone)]
pub struct FavoritesRepository<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    lookup_policy: LookupFailurePolicy,
}

impl<S> FavoritesRepository<S> {
    /// Create a repository over `store`, stamping inserts with `clock`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            lookup_policy: LookupFailurePolicy::default(),
        }
    }

    /// Replace the lookup failure policy.
    #[must_use]
    pub fn with_lookup_policy(mut self, lookup_policy: LookupFailurePolicy) -> Self {
        self.lookup_policy = lookup_policy;
        self
    }

    /// The active lookup failure policy.
    pub fn lookup_policy(&self) -> LookupFailurePolicy {
        self.lookup_policy
    }
}

impl<S> FavoritesRepository<S>
where
    S: FavoritesStore,
{
    async fn load(&self, user_id: &UserId) -> Result<Vec<FavoriteRecord>, Error> {
        let records = self
            .store
            .list_items(user_id)
            .await
            .map_err(map_store_error)?;
        debug!(user_id = %user_id, count = records.len(), "listed favorites");
        Ok(records)
    }

    async fn resolve(&self, user_id: &UserId, key: &BookKey) -> Result<Option<FavoriteId>, Error> {
        let records = self.load(user_id).await?;
        Ok(records
            .into_iter()
            .find(|record| record.has_key(key))
            .map(|record| record.id))
    }

    async fn insert(&self, user_id: &UserId, book: BookData) -> Result<FavoriteId, Error> {
        let document = FavoriteDocument {
            book,
            created_at: self.clock.utc(),
        };
        let favorite_id = self
            .store
            .insert_item(user_id, &document)
            .await
            .map_err(map_store_error)?;
        debug!(
            user_id = %user_id,
            favorite_id = %favorite_id,
            book_key = document.book.key.as_ref().map(BookKey::as_str),
            "added favorite"
        );
        Ok(favorite_id)
    }

    async fn delete(&self, user_id: &UserId, favorite_id: &FavoriteId) -> Result<(), Error> {
        self.store
            .delete_item(user_id, favorite_id)
            .await
            .map_err(map_store_error)?;
        debug!(user_id = %user_id, favorite_id = %favorite_id, "removed favorite");
        Ok(())
    }
}

#[async_trait]
impl<S> FavoritesQuery for FavoritesRepository<S>
where
    S: FavoritesStore,
{
    async fn list(&self, session: &Session) -> Result<Vec<FavoriteRecord>, Error> {
        let user_id = session.require_user()?;
        self.load(user_id).await
    }

    async fn find_by_key(
        &self,
        session: &Session,
        key: &BookKey,
    ) -> Result<Option<FavoriteId>, Error> {
        let user_id = session.require_user()?;
        match self.resolve(user_id, key).await {
            Ok(found) => Ok(found),
            Err(error) if self.lookup_policy == LookupFailurePolicy::FailOpen => {
                warn!(
                    user_id = %user_id,
                    book_key = %key,
                    error = %error,
                    "favorite lookup failed; reporting not favorited"
                );
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl<S> FavoritesCommand for FavoritesRepository<S>
where
    S: FavoritesStore,
{
    async fn add(&self, session: &Session, book: &BookData) -> Result<FavoriteId, Error> {
        let user_id = session.require_user()?;
        self.insert(user_id, book.clone()).await
    }

    async fn remove(&self, session: &Session, favorite_id: &FavoriteId) -> Result<bool, Error> {
        let user_id = session.require_user()?;
        self.delete(user_id, favorite_id).await?;
        Ok(true)
    }

    async fn toggle_favorite(
        &self,
        session: &Session,
        key: &BookKey,
        book: &BookData,
    ) -> Result<ToggleOutcome, Error> {
        let user_id = session.require_user()?;

        // Strict lookup: a failed check must never turn into an insert.
        match self.resolve(user_id, key).await? {
            Some(favorite_id) => {
                self.delete(user_id, &favorite_id).await?;
                Ok(ToggleOutcome::Removed(favorite_id))
            }
            None => {
                let mut book = book.clone();
                book.key = Some(key.clone());
                let favorite_id = self.insert(user_id, book).await?;
                Ok(ToggleOutcome::Added(favorite_id))
            }
        }
    }
}

#[cfg(test)]
#[path = "favorites_repository_tests.rs"]
mod tests;
