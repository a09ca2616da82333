//! Favourite book records and their identifiers.
//!
//! A favourite is a user-specific saved reference to a book. Book metadata is
//! denormalised into the record when it is added, so later catalogue changes
//! never reach stored favourites.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const WORKS_PREFIX: &str = "/works/";

/// Validation errors returned by [`BookKey`] and [`FavoriteId`] constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteValidationError {
    EmptyBookKey,
    BookKeyContainsWhitespace,
    EmptyFavoriteId,
    InvalidFavoriteId,
}

impl fmt::Display for FavoriteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBookKey => write!(f, "book key must not be empty"),
            Self::BookKeyContainsWhitespace => {
                write!(f, "book key must not contain surrounding whitespace")
            }
            Self::EmptyFavoriteId => write!(f, "favorite id must not be empty"),
            Self::InvalidFavoriteId => {
                write!(f, "favorite id must not contain whitespace or path separators")
            }
        }
    }
}

impl std::error::Error for FavoriteValidationError {}

/// Stable catalogue identifier for a work, e.g. `/works/OL45804W`.
///
/// The key is the natural key for favourite lookups. The store enforces no
/// uniqueness on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookKey(String);

impl BookKey {
    /// Validate and construct a key.
    ///
    /// # Examples
    /// ```
    /// use bookfoo::domain::BookKey;
    ///
    /// let key = BookKey::new("/works/OL1W").expect("valid key");
    /// assert_eq!(key.work_id(), "OL1W");
    /// assert!(BookKey::new(" /works/OL1W").is_err());
    /// ```
    pub fn new(value: impl Into<String>) -> Result<Self, FavoriteValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(FavoriteValidationError::EmptyBookKey);
        }
        if raw.trim() != raw {
            return Err(FavoriteValidationError::BookKeyContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Build a work key from the bare work id used in detail routes.
    ///
    /// # Examples
    /// ```
    /// use bookfoo::domain::BookKey;
    ///
    /// let key = BookKey::from_work_id("OL1W").expect("valid key");
    /// assert_eq!(key.as_str(), "/works/OL1W");
    /// ```
    pub fn from_work_id(work_id: &str) -> Result<Self, FavoriteValidationError> {
        let trimmed = work_id.trim();
        if trimmed.is_empty() {
            return Err(FavoriteValidationError::EmptyBookKey);
        }
        Self::new(format!("{WORKS_PREFIX}{trimmed}"))
    }

    /// The key with any `/works/` prefix removed.
    pub fn work_id(&self) -> &str {
        self.0.strip_prefix(WORKS_PREFIX).unwrap_or(&self.0)
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for BookKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<BookKey> for String {
    fn from(value: BookKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for BookKey {
    type Error = FavoriteValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Opaque identifier the store assigns to a favourite on insertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FavoriteId(String);

impl FavoriteId {
    /// Validate and construct an identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, FavoriteValidationError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(FavoriteValidationError::EmptyFavoriteId);
        }
        if raw.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(FavoriteValidationError::InvalidFavoriteId);
        }
        Ok(Self(raw))
    }

    /// Generate a fresh identifier (20 hex characters, like store-issued ids).
    pub fn random() -> Self {
        let mut raw = Uuid::new_v4().simple().to_string();
        raw.truncate(20);
        Self(raw)
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FavoriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for FavoriteId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<FavoriteId> for String {
    fn from(value: FavoriteId) -> Self {
        value.0
    }
}

impl TryFrom<String> for FavoriteId {
    type Error = FavoriteValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Book metadata copied into a favourite. Any subset of fields may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookData {
    /// Catalogue work key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<BookKey>,
    /// Book title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// First listed author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    /// Catalogue cover image reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_id: Option<i64>,
    /// Year of first publication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i32>,
}

impl BookData {
    /// Book data carrying only a key.
    pub fn for_key(key: BookKey) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the author.
    #[must_use]
    pub fn with_author_name(mut self, author_name: impl Into<String>) -> Self {
        self.author_name = Some(author_name.into());
        self
    }

    /// Set the cover reference.
    #[must_use]
    pub fn with_cover_image_id(mut self, cover_image_id: i64) -> Self {
        self.cover_image_id = Some(cover_image_id);
        self
    }

    /// Set the publication year.
    #[must_use]
    pub fn with_first_publish_year(mut self, year: i32) -> Self {
        self.first_publish_year = Some(year);
        self
    }
}

/// Document written to the store when a favourite is added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteDocument {
    /// Denormalised book metadata.
    pub book: BookData,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// One book saved by one user, as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    /// Store-assigned identifier, unique within the user's collection.
    pub id: FavoriteId,
    /// Denormalised book metadata.
    #[serde(flatten)]
    pub book: BookData,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

impl FavoriteRecord {
    /// Combine a store id with the stored document.
    pub fn from_document(id: FavoriteId, document: FavoriteDocument) -> Self {
        Self {
            id,
            book: document.book,
            created_at: document.created_at,
        }
    }

    /// Whether this record refers to `key`.
    pub fn has_key(&self, key: &BookKey) -> bool {
        self.book.key.as_ref() == Some(key)
    }
}
