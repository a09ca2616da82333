//! Explicit session context threaded through every favourites call.
//!
//! Views never read an ambient "current user"; they hold a [`Session`] and
//! pass it to the repository, which refuses to touch the store when no user
//! is attached.

use super::{Error, UserId};

/// Session context for one signed-in (or anonymous) viewer.
///
/// # Examples
/// ```
/// use bookfoo::domain::{ErrorCode, Session, UserId};
///
/// let session = Session::authenticated(UserId::new("user-1").expect("valid id"));
/// assert_eq!(session.require_user().expect("user").as_ref(), "user-1");
///
/// let anonymous = Session::anonymous();
/// let err = anonymous.require_user().expect_err("no user");
/// assert_eq!(err.code(), ErrorCode::Unauthenticated);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<UserId>,
}

impl Session {
    /// Session bound to a signed-in user.
    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Session without a user; every favourites operation fails.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    /// The signed-in user, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Whether a user is attached.
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Borrow the user or fail with [`crate::domain::ErrorCode::Unauthenticated`].
    pub fn require_user(&self) -> Result<&UserId, Error> {
        self.user_id
            .as_ref()
            .ok_or_else(|| Error::unauthenticated("sign in to manage favorites"))
    }
}

impl From<UserId> for Session {
    fn from(value: UserId) -> Self {
        Self::authenticated(value)
    }
}
