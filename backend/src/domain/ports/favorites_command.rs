//! Driving port for changing a user's favourites.
//!
//! The [`FavoritesCommand`] trait is the single entry point views use to add,
//! remove, or toggle favourites. Toggling performs the check-then-act
//! sequence in one place instead of in every view.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BookData, BookKey, Error, FavoriteId, Session};

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "id", rename_all = "camelCase")]
pub enum ToggleOutcome {
    /// The book was not favourited; a record with this id was inserted.
    Added(FavoriteId),
    /// The book was favourited; the record with this id was deleted.
    Removed(FavoriteId),
}

impl ToggleOutcome {
    /// Whether the book is favourited after the toggle.
    pub fn is_favorited(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    /// Id of the record that was inserted or deleted.
    pub fn favorite_id(&self) -> &FavoriteId {
        match self {
            Self::Added(id) | Self::Removed(id) => id,
        }
    }
}

/// Driving port for favourite mutations.
///
/// # Races
///
/// Neither `add` nor `toggle_favorite` is atomic with respect to other
/// callers. Two toggles for the same user and key that both start before
/// either insert is visible will both add, leaving duplicate records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesCommand: Send + Sync {
    /// Insert a favourite without checking for an existing record with the
    /// same key. Returns the new id.
    async fn add(&self, session: &Session, book: &BookData) -> Result<FavoriteId, Error>;

    /// Delete a favourite by id. Removing a missing id succeeds.
    async fn remove(&self, session: &Session, favorite_id: &FavoriteId) -> Result<bool, Error>;

    /// Re-resolve the favourite for `key`, then remove it when present or add
    /// `book` (keyed by `key`) when absent.
    async fn toggle_favorite(
        &self,
        session: &Session,
        key: &BookKey,
        book: &BookData,
    ) -> Result<ToggleOutcome, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn outcome_reports_final_state() {
        let id = FavoriteId::new("abc").expect("valid id");
        assert!(ToggleOutcome::Added(id.clone()).is_favorited());
        assert!(!ToggleOutcome::Removed(id.clone()).is_favorited());
        assert_eq!(ToggleOutcome::Removed(id.clone()).favorite_id(), &id);
    }

    #[rstest]
    fn outcome_serialises_with_action_tag() {
        let id = FavoriteId::new("abc").expect("valid id");
        let value = serde_json::to_value(ToggleOutcome::Added(id)).expect("serialises");
        assert_eq!(value, json!({ "action": "added", "id": "abc" }));
    }
}
