//! Firestore outbound adapters.
//!
//! This module provides a thin REST implementation of the `FavoritesStore`
//! port.

mod dto;
mod http_store;

pub use http_store::{
    DEFAULT_DATABASE, DEFAULT_FIRESTORE_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT,
    FirestoreConnection, FirestoreFavoritesStore, FirestoreStoreBuildError,
};
