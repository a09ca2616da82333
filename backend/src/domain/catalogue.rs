//! Catalogue document shapes.
//!
//! Only the data shapes of Open Library search results and work documents are
//! modelled here; the catalogue client itself lives outside this crate. Both
//! convert into [`BookData`] so a search hit or a detail page can be
//! favourited verbatim.

use serde::Deserialize;

use super::{BookData, BookKey};

/// Author placeholder used when a document lists no authors.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
/// Title placeholder used when a work document has no title.
pub const UNTITLED: &str = "Untitled";

/// One document from an Open Library `search.json` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogueBook {
    /// Work key, e.g. `/works/OL45804W`.
    pub key: BookKey,
    /// Work title.
    #[serde(default)]
    pub title: Option<String>,
    /// All listed authors, in catalogue order.
    #[serde(default)]
    pub author_name: Vec<String>,
    /// Cover image id.
    #[serde(default, rename = "cover_i")]
    pub cover_image_id: Option<i64>,
    /// Year of first publication.
    #[serde(default)]
    pub first_publish_year: Option<i32>,
}

/// Envelope of an Open Library `search.json` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogueSearchPage {
    /// Matching documents.
    #[serde(default)]
    pub docs: Vec<CatalogueBook>,
}

impl CatalogueBook {
    /// Whether the hit carries a cover; search listings drop coverless hits.
    pub fn has_cover(&self) -> bool {
        self.cover_image_id.is_some()
    }
}

impl From<CatalogueBook> for BookData {
    fn from(value: CatalogueBook) -> Self {
        let author_name = value
            .author_name
            .into_iter()
            .next()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());
        Self {
            key: Some(value.key),
            title: value.title,
            author_name: Some(author_name),
            cover_image_id: value.cover_image_id,
            first_publish_year: value.first_publish_year,
        }
    }
}

/// An Open Library work document (`/works/{id}.json`), as shown on a detail
/// page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogueWork {
    /// Work key, e.g. `/works/OL45804W`.
    pub key: BookKey,
    /// Work title.
    #[serde(default)]
    pub title: Option<String>,
    /// Cover image ids; the first is the primary cover.
    #[serde(default)]
    pub covers: Vec<i64>,
    /// Author entries; only inline names are used.
    #[serde(default)]
    pub authors: Vec<WorkAuthor>,
    /// Free-form first publication date, e.g. `"August 1965"`.
    #[serde(default)]
    pub first_publish_date: Option<String>,
    #[serde(default)]
    description: Option<WorkDescription>,
}

/// One author entry of a work document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkAuthor {
    /// Display name when the entry carries one.
    #[serde(default)]
    pub name: Option<String>,
}

/// Work descriptions arrive either as plain text or as a typed text object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum WorkDescription {
    Plain(String),
    Typed { value: String },
}

impl CatalogueWork {
    /// Description text, if any.
    pub fn description(&self) -> Option<&str> {
        match self.description.as_ref()? {
            WorkDescription::Plain(text) | WorkDescription::Typed { value: text } => {
                Some(text.as_str())
            }
        }
    }

    /// Primary cover id. Open Library marks missing covers with
    /// non-positive ids.
    pub fn cover_image_id(&self) -> Option<i64> {
        self.covers.first().copied().filter(|id| *id > 0)
    }
}

impl From<CatalogueWork> for BookData {
    fn from(value: CatalogueWork) -> Self {
        let cover_image_id = value.cover_image_id();
        let title = value
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNTITLED.to_owned());
        let author_name = value
            .authors
            .into_iter()
            .next()
            .and_then(|author| author.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());
        Self {
            key: Some(value.key),
            title: Some(title),
            author_name: Some(author_name),
            cover_image_id,
            first_publish_year: None,
        }
    }
}
