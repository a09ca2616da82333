//! Driving port for reading a user's favourites.
//!
//! Views use this port to list favourites and check whether a book is
//! favourited without importing store concerns.

use async_trait::async_trait;

use crate::domain::{BookKey, Error, FavoriteId, FavoriteRecord, Session};

/// Domain use-case port for favourite lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesQuery: Send + Sync {
    /// Every favourite of the session's user, in store order.
    ///
    /// Store failures always propagate.
    async fn list(&self, session: &Session) -> Result<Vec<FavoriteRecord>, Error>;

    /// Id of the first favourite whose key equals `key`, or `None`.
    ///
    /// Whether store failures propagate or degrade to `None` depends on the
    /// implementation's lookup failure policy.
    async fn find_by_key(
        &self,
        session: &Session,
        key: &BookKey,
    ) -> Result<Option<FavoriteId>, Error>;

    /// Whether `key` is favourited; same failure policy as
    /// [`FavoritesQuery::find_by_key`].
    async fn is_favorite(&self, session: &Session, key: &BookKey) -> Result<bool, Error> {
        Ok(self.find_by_key(session, key).await?.is_some())
    }
}

/// Fixture query reporting an empty favourites list.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFavoritesQuery;

#[async_trait]
impl FavoritesQuery for FixtureFavoritesQuery {
    async fn list(&self, session: &Session) -> Result<Vec<FavoriteRecord>, Error> {
        session.require_user()?;
        Ok(Vec::new())
    }

    async fn find_by_key(
        &self,
        session: &Session,
        _key: &BookKey,
    ) -> Result<Option<FavoriteId>, Error> {
        session.require_user()?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, UserId};

    #[tokio::test]
    async fn fixture_query_reports_nothing_favourited() {
        let session = Session::authenticated(UserId::new("user-1").expect("valid id"));
        let key = BookKey::new("/works/OL1W").expect("valid key");

        let favourited = FixtureFavoritesQuery
            .is_favorite(&session, &key)
            .await
            .expect("lookup succeeds");
        assert!(!favourited);
    }

    #[tokio::test]
    async fn fixture_query_requires_a_user() {
        let error = FixtureFavoritesQuery
            .list(&Session::anonymous())
            .await
            .expect_err("anonymous sessions fail");
        assert_eq!(error.code(), ErrorCode::Unauthenticated);
    }
}
