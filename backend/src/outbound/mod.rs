//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of the `FavoritesStore` port:
//!
//! - **firestore**: Firestore REST-backed document store using reqwest
//! - **in_memory**: process-local store for tests and offline hosts
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod firestore;
pub mod in_memory;
