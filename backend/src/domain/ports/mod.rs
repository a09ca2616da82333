//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod favorites_command;
mod favorites_query;
mod favorites_store;

#[cfg(test)]
pub use favorites_command::MockFavoritesCommand;
pub use favorites_command::{FavoritesCommand, ToggleOutcome};
#[cfg(test)]
pub use favorites_query::MockFavoritesQuery;
pub use favorites_query::{FavoritesQuery, FixtureFavoritesQuery};
#[cfg(test)]
pub use favorites_store::MockFavoritesStore;
pub use favorites_store::{FavoritesStore, FavoritesStoreError, FixtureFavoritesStore};
