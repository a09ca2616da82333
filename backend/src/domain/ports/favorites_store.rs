//! Port for the remote favourites document store.
//!
//! The store holds, per user, a collection of favourite documents at
//! `users/{user_id}/items/{favorite_id}`. It supports listing, insertion with
//! a generated id, and deletion by id. It offers no uniqueness constraint,
//! no indexed queries, and no multi-document transactions.

use async_trait::async_trait;

use crate::domain::{FavoriteDocument, FavoriteId, FavoriteRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by favourites store adapters.
    pub enum FavoritesStoreError {
        /// The store could not be reached or timed out.
        Unavailable { message: String } =>
            "favorites store unavailable: {message}",
        /// The store refused the request (permissions, malformed path).
        Rejected { message: String } =>
            "favorites store rejected the request: {message}",
        /// The store answered with a payload the adapter cannot decode.
        Decode { message: String } =>
            "favorites store returned an undecodable payload: {message}",
    }
}

/// Document store collaborator scoped by user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// List every favourite in the user's collection, in store order.
    async fn list_items(&self, user_id: &UserId)
    -> Result<Vec<FavoriteRecord>, FavoritesStoreError>;

    /// Insert a document and return the id the store generated for it.
    async fn insert_item(
        &self,
        user_id: &UserId,
        document: &FavoriteDocument,
    ) -> Result<FavoriteId, FavoritesStoreError>;

    /// Delete a document by id. Deleting a missing id succeeds.
    async fn delete_item(
        &self,
        user_id: &UserId,
        favorite_id: &FavoriteId,
    ) -> Result<(), FavoritesStoreError>;
}

/// Fixture implementation for testing without a real store.
///
/// Lists are always empty, inserts return a fresh id, and deletes succeed.
/// Use it where favourites persistence is not under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFavoritesStore;

#[async_trait]
impl FavoritesStore for FixtureFavoritesStore {
    async fn list_items(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<FavoriteRecord>, FavoritesStoreError> {
        Ok(Vec::new())
    }

    async fn insert_item(
        &self,
        _user_id: &UserId,
        _document: &FavoriteDocument,
    ) -> Result<FavoriteId, FavoritesStoreError> {
        Ok(FavoriteId::random())
    }

    async fn delete_item(
        &self,
        _user_id: &UserId,
        _favorite_id: &FavoriteId,
    ) -> Result<(), FavoritesStoreError> {
        Ok(())
    }
}
