//! Domain primitives, ports, and services for book favourites.
//!
//! Purpose: Define strongly typed domain entities used by the favourites
//! repository, the view synchronisers, and the store adapters. Keep types
//! immutable and document invariants and serialisation contracts (serde) in
//! each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): domain error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - UserId / Session: who a favourites call acts for.
//! - BookKey / BookData / FavoriteRecord: the favourite data model.
//! - FavoritesRepository: the service behind the favourites ports.

pub mod catalogue;
pub mod error;
pub mod favorite;
pub mod favorite_sync;
pub mod favorites_repository;
pub mod ports;
pub mod session;
pub mod user;

pub use self::catalogue::{
    CatalogueBook, CatalogueSearchPage, CatalogueWork, UNKNOWN_AUTHOR, UNTITLED, WorkAuthor,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::favorite::{
    BookData, BookKey, FavoriteDocument, FavoriteId, FavoriteRecord, FavoriteValidationError,
};
pub use self::favorites_repository::{FavoritesRepository, LookupFailurePolicy};
pub use self::session::Session;
pub use self::user::{UserId, UserValidationError};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use bookfoo::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<bool> {
///     Err(Error::unauthenticated("sign in to manage favorites"))
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
