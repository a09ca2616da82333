//! In-process favourites store.
//!
//! Keeps each user's collection in insertion order behind an async lock and
//! generates ids the way the remote store does. Like the remote store it
//! enforces no uniqueness on book keys.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{FavoritesStore, FavoritesStoreError};
use crate::domain::{FavoriteDocument, FavoriteId, FavoriteRecord, UserId};

/// Favourites store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryFavoritesStore {
    collections: RwLock<HashMap<UserId, Vec<FavoriteRecord>>>,
}

impl InMemoryFavoritesStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held for `user_id`.
    pub async fn item_count(&self, user_id: &UserId) -> usize {
        self.collections
            .read()
            .await
            .get(user_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl FavoritesStore for InMemoryFavoritesStore {
    async fn list_items(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<FavoriteRecord>, FavoritesStoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_item(
        &self,
        user_id: &UserId,
        document: &FavoriteDocument,
    ) -> Result<FavoriteId, FavoritesStoreError> {
        let favorite_id = FavoriteId::random();
        let record = FavoriteRecord::from_document(favorite_id.clone(), document.clone());
        self.collections
            .write()
            .await
            .entry(user_id.clone())
            .or_default()
            .push(record);
        Ok(favorite_id)
    }

    async fn delete_item(
        &self,
        user_id: &UserId,
        favorite_id: &FavoriteId,
    ) -> Result<(), FavoritesStoreError> {
        if let Some(items) = self.collections.write().await.get_mut(user_id) {
            items.retain(|record| &record.id != favorite_id);
        }
        Ok(())
    }
}
