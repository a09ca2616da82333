//! Test utilities for the bookfoo crate.
//!
//! This module provides store wrappers shared by unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Semaphore, watch};

use crate::domain::ports::{FavoritesStore, FavoritesStoreError};
use crate::domain::{FavoriteDocument, FavoriteId, FavoriteRecord, UserId};

/// Store wrapper whose reads or writes can be switched to fail.
///
/// Failures surface as [`FavoritesStoreError::Unavailable`], the same as a
/// dropped connection to the remote store.
#[derive(Debug, Default)]
pub struct FlakyFavoritesStore<S> {
    inner: S,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<S> FlakyFavoritesStore<S> {
    /// Wrap `inner`; all calls pass through until a switch is flipped.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make `list_items` fail (or recover).
    pub fn fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    /// Make `insert_item` and `delete_item` fail (or recover).
    pub fn fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Borrow the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(flag: &AtomicBool) -> Result<(), FavoritesStoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(FavoritesStoreError::unavailable("simulated outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S> FavoritesStore for FlakyFavoritesStore<S>
where
    S: FavoritesStore,
{
    async fn list_items(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<FavoriteRecord>, FavoritesStoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.list_items(user_id).await
    }

    async fn insert_item(
        &self,
        user_id: &UserId,
        document: &FavoriteDocument,
    ) -> Result<FavoriteId, FavoritesStoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.insert_item(user_id, document).await
    }

    async fn delete_item(
        &self,
        user_id: &UserId,
        favorite_id: &FavoriteId,
    ) -> Result<(), FavoritesStoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.delete_item(user_id, favorite_id).await
    }
}

/// Store wrapper that can hold `list_items` calls at a gate.
///
/// Closing the gate parks every subsequent list call until the gate is
/// opened, which lets tests line up concurrent check-then-act sequences so
/// that all of them observe the same snapshot.
#[derive(Debug)]
pub struct GatedFavoritesStore<S> {
    inner: S,
    gate: Mutex<Option<Arc<Semaphore>>>,
    waiting: watch::Sender<usize>,
}

impl<S> GatedFavoritesStore<S> {
    /// Wrap `inner` with an open gate.
    pub fn new(inner: S) -> Self {
        let (waiting, _) = watch::channel(0);
        Self {
            inner,
            gate: Mutex::new(None),
            waiting,
        }
    }

    /// Park subsequent list calls until [`GatedFavoritesStore::open_gate`].
    ///
    /// Calls parked at a gate that was already closed are released.
    pub fn close_gate(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = gate.replace(Arc::new(Semaphore::new(0))) {
            previous.close();
        }
    }

    /// Release every parked list call and let new ones through.
    pub fn open_gate(&self) {
        let released = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(semaphore) = released {
            semaphore.close();
        }
    }

    /// Wait until at least `count` list calls are parked at the gate.
    pub async fn wait_for_parked(&self, count: usize) {
        let mut waiting = self.waiting.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = waiting.wait_for(|parked| *parked >= count).await;
    }

    /// Borrow the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn pass_gate(&self) {
        let gate = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(semaphore) = gate else {
            return;
        };
        self.waiting.send_modify(|parked| *parked += 1);
        // Closing the semaphore is the release signal.
        let _ = semaphore.acquire().await;
        self.waiting.send_modify(|parked| *parked -= 1);
    }
}

#[async_trait]
impl<S> FavoritesStore for GatedFavoritesStore<S>
where
    S: FavoritesStore,
{
    async fn list_items(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<FavoriteRecord>, FavoritesStoreError> {
        self.pass_gate().await;
        self.inner.list_items(user_id).await
    }

    async fn insert_item(
        &self,
        user_id: &UserId,
        document: &FavoriteDocument,
    ) -> Result<FavoriteId, FavoritesStoreError> {
        self.inner.insert_item(user_id, document).await
    }

    async fn delete_item(
        &self,
        user_id: &UserId,
        favorite_id: &FavoriteId,
    ) -> Result<(), FavoritesStoreError> {
        self.inner.delete_item(user_id, favorite_id).await
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the gated store wrapper.

    use super::*;
    use crate::outbound::in_memory::InMemoryFavoritesStore;

    #[tokio::test]
    async fn closing_the_gate_again_releases_parked_calls() {
        let store = Arc::new(GatedFavoritesStore::new(InMemoryFavoritesStore::new()));
        let user_id = UserId::new("reader-a").expect("valid id");
        store.close_gate();

        let parked = tokio::spawn({
            let store = Arc::clone(&store);
            let user_id = user_id.clone();
            async move { store.list_items(&user_id).await }
        });
        store.wait_for_parked(1).await;

        store.close_gate();
        let records = parked.await.expect("task joins").expect("list succeeds");
        assert!(records.is_empty());

        let again = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.list_items(&user_id).await }
        });
        store.wait_for_parked(1).await;
        store.open_gate();
        assert!(again.await.expect("task joins").expect("list succeeds").is_empty());
    }
}
