//! DTOs for the Firestore REST document format.
//!
//! Firestore wraps every field in a typed value object (`{"stringValue": ..}`,
//! `{"integerValue": "42"}`). The adapter decodes into these DTOs first and
//! then maps documents into favourite records in one pass. A field that does
//! not decode is dropped from its record; only a document without a readable
//! id is dropped as a whole.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{BookData, BookKey, FavoriteDocument, FavoriteId, FavoriteRecord};

pub(super) const FIELD_KEY: &str = "key";
pub(super) const FIELD_TITLE: &str = "title";
pub(super) const FIELD_AUTHOR_NAME: &str = "author_name";
pub(super) const FIELD_LEGACY_AUTHOR: &str = "author";
pub(super) const FIELD_COVER_IMAGE_ID: &str = "cover_i";
pub(super) const FIELD_FIRST_PUBLISH_YEAR: &str = "first_publish_year";
pub(super) const FIELD_CREATED_AT: &str = "createdAt";

/// One typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    /// int64 values travel as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValueDto),
    MapValue(MapValueDto),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(super) struct ArrayValueDto {
    #[serde(default)]
    pub(super) values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(super) struct MapValueDto {
    #[serde(default)]
    pub(super) fields: BTreeMap<String, FirestoreValue>,
}

impl FirestoreValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::NullValue(()) => "null",
            Self::BooleanValue(_) => "boolean",
            Self::IntegerValue(_) => "integer",
            Self::DoubleValue(_) => "double",
            Self::TimestampValue(_) => "timestamp",
            Self::StringValue(_) => "string",
            Self::BytesValue(_) => "bytes",
            Self::ReferenceValue(_) => "reference",
            Self::GeoPointValue(_) => "geo point",
            Self::ArrayValue(_) => "array",
            Self::MapValue(_) => "map",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DocumentDto {
    pub(super) name: String,
    #[serde(default)]
    pub(super) fields: BTreeMap<String, FirestoreValue>,
    pub(super) create_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ListDocumentsDto {
    #[serde(default)]
    pub(super) documents: Vec<DocumentDto>,
    pub(super) next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct WriteDocumentDto {
    pub(super) fields: BTreeMap<String, FirestoreValue>,
}

impl WriteDocumentDto {
    /// Encode a favourite with the field names used by stored documents.
    pub(super) fn from_document(document: &FavoriteDocument) -> Self {
        let book = &document.book;
        let mut fields = BTreeMap::new();
        if let Some(key) = &book.key {
            fields.insert(
                FIELD_KEY.to_owned(),
                FirestoreValue::StringValue(key.as_str().to_owned()),
            );
        }
        if let Some(title) = &book.title {
            fields.insert(FIELD_TITLE.to_owned(), FirestoreValue::StringValue(title.clone()));
        }
        if let Some(author_name) = &book.author_name {
            fields.insert(
                FIELD_AUTHOR_NAME.to_owned(),
                FirestoreValue::StringValue(author_name.clone()),
            );
        }
        if let Some(cover) = book.cover_image_id {
            fields.insert(
                FIELD_COVER_IMAGE_ID.to_owned(),
                FirestoreValue::IntegerValue(cover.to_string()),
            );
        }
        if let Some(year) = book.first_publish_year {
            fields.insert(
                FIELD_FIRST_PUBLISH_YEAR.to_owned(),
                FirestoreValue::IntegerValue(year.to_string()),
            );
        }
        fields.insert(
            FIELD_CREATED_AT.to_owned(),
            FirestoreValue::StringValue(
                document
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );
        Self { fields }
    }
}

impl DocumentDto {
    /// Document id: the last segment of the resource name.
    pub(super) fn document_id(&self) -> Result<FavoriteId, String> {
        let id = self.name.rsplit('/').next().unwrap_or_default();
        FavoriteId::new(id).map_err(|error| format!("document {}: {error}", self.name))
    }

    /// Map the document to a record.
    ///
    /// Fails only when the document id cannot be read. Undecodable fields are
    /// logged and left empty; a missing or invalid `createdAt` falls back to
    /// the document's `createTime`, then to the Unix epoch.
    pub(super) fn into_record(self) -> Result<FavoriteRecord, String> {
        let id = self.document_id()?;
        let fields = Fields {
            name: &self.name,
            fields: &self.fields,
        };
        let key = fields.lenient(fields.string(FIELD_KEY).and_then(|raw| {
            raw.map(|raw| BookKey::new(raw.trim()))
                .transpose()
                .map_err(|error| format!("document {}: field {FIELD_KEY}: {error}", self.name))
        }));
        let author_name = fields
            .lenient(fields.string(FIELD_AUTHOR_NAME))
            .or_else(|| fields.lenient(fields.string(FIELD_LEGACY_AUTHOR)));
        let first_publish_year =
            fields.lenient(fields.integer(FIELD_FIRST_PUBLISH_YEAR).and_then(|year| {
                year.map(i32::try_from).transpose().map_err(|_| {
                    format!("document {}: {FIELD_FIRST_PUBLISH_YEAR} out of range", self.name)
                })
            }));
        let created_at = fields
            .lenient(fields.timestamp(FIELD_CREATED_AT))
            .or_else(|| {
                let raw = self.create_time.as_deref()?;
                fields.lenient(parse_timestamp(&self.name, "createTime", raw).map(Some))
            })
            .unwrap_or_else(|| {
                warn!(document = %self.name, "favorite document has no timestamp");
                DateTime::<Utc>::UNIX_EPOCH
            });

        Ok(FavoriteRecord {
            id,
            book: BookData {
                key,
                title: fields.lenient(fields.string(FIELD_TITLE)),
                author_name,
                cover_image_id: fields.lenient(fields.integer(FIELD_COVER_IMAGE_ID)),
                first_publish_year,
            },
            created_at,
        })
    }
}

struct Fields<'a> {
    name: &'a str,
    fields: &'a BTreeMap<String, FirestoreValue>,
}

impl Fields<'_> {
    fn present(&self, field: &str) -> Option<&FirestoreValue> {
        self.fields
            .get(field)
            .filter(|value| !matches!(value, FirestoreValue::NullValue(())))
    }

    fn lenient<T>(&self, decoded: Result<Option<T>, String>) -> Option<T> {
        decoded.unwrap_or_else(|error| {
            warn!(document = %self.name, error = %error, "ignoring undecodable favorite field");
            None
        })
    }

    fn mismatch(&self, field: &str, expected: &str, value: &FirestoreValue) -> String {
        format!(
            "document {}: field {field} expected {expected}, found {}",
            self.name,
            value.kind()
        )
    }

    fn string(&self, field: &str) -> Result<Option<String>, String> {
        match self.present(field) {
            None => Ok(None),
            Some(FirestoreValue::StringValue(value)) => Ok(Some(value.clone())),
            Some(other) => Err(self.mismatch(field, "string", other)),
        }
    }

    fn integer(&self, field: &str) -> Result<Option<i64>, String> {
        match self.present(field) {
            None => Ok(None),
            Some(FirestoreValue::IntegerValue(raw)) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|error| format!("document {}: field {field}: {error}", self.name)),
            // Numbers written from JavaScript clients may arrive as doubles.
            Some(FirestoreValue::DoubleValue(value))
                if value.fract() == 0.0 && value.abs() < 9.0e15 =>
            {
                Ok(Some(*value as i64))
            }
            Some(other) => Err(self.mismatch(field, "integer", other)),
        }
    }

    fn timestamp(&self, field: &str) -> Result<Option<DateTime<Utc>>, String> {
        match self.present(field) {
            None => Ok(None),
            Some(FirestoreValue::StringValue(raw) | FirestoreValue::TimestampValue(raw)) => {
                parse_timestamp(self.name, field, raw).map(Some)
            }
            Some(other) => Err(self.mismatch(field, "timestamp", other)),
        }
    }
}

fn parse_timestamp(name: &str, field: &str, raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| format!("document {name}: field {field}: {error}"))
}

#[cfg(test)]
mod tests {
    //! Decoding and encoding of Firestore documents.

    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    const NAME: &str = "projects/p/databases/(default)/documents/users/u1/items/abc123";

    fn document(fields: serde_json::Value) -> DocumentDto {
        serde_json::from_value(json!({ "name": NAME, "fields": fields }))
            .expect("document should decode")
    }

    #[test]
    fn decodes_a_stored_favourite() {
        let record = document(json!({
            "key": { "stringValue": "/works/OL45883W" },
            "title": { "stringValue": "Dune" },
            "author_name": { "stringValue": "Frank Herbert" },
            "cover_i": { "integerValue": "11481354" },
            "first_publish_year": { "integerValue": "1965" },
            "createdAt": { "stringValue": "2024-11-01T09:30:00.000Z" }
        }))
        .into_record()
        .expect("record should map");

        assert_eq!(record.id.as_str(), "abc123");
        assert_eq!(record.book.key.as_ref().map(BookKey::as_str), Some("/works/OL45883W"));
        assert_eq!(record.book.title.as_deref(), Some("Dune"));
        assert_eq!(record.book.author_name.as_deref(), Some("Frank Herbert"));
        assert_eq!(record.book.cover_image_id, Some(11_481_354));
        assert_eq!(record.book.first_publish_year, Some(1965));
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2024, 11, 1, 9, 30, 0).single().expect("valid")
        );
    }

    #[test]
    fn accepts_legacy_author_and_native_timestamps() {
        let record = document(json!({
            "key": { "stringValue": "/works/OL1W" },
            "author": { "stringValue": "Jane Austen" },
            "cover_i": { "doubleValue": 42.0 },
            "createdAt": { "timestampValue": "2023-01-02T03:04:05Z" }
        }))
        .into_record()
        .expect("record should map");

        assert_eq!(record.book.author_name.as_deref(), Some("Jane Austen"));
        assert_eq!(record.book.cover_image_id, Some(42));
        assert_eq!(record.book.title, None);
    }

    #[test]
    fn falls_back_to_document_create_time() {
        let dto: DocumentDto = serde_json::from_value(json!({
            "name": NAME,
            "fields": { "title": { "stringValue": "Emma" }, "key": { "nullValue": null } },
            "createTime": "2022-05-06T07:08:09.123456Z"
        }))
        .expect("document should decode");

        let record = dto.into_record().expect("record should map");
        assert_eq!(record.book.key, None);
        assert_eq!(record.created_at.timestamp(), 1_651_820_889);
    }

    #[rstest]
    #[case::wrong_type(json!({ "title": { "integerValue": "3" } }), "title")]
    #[case::bad_integer(json!({ "cover_i": { "integerValue": "twelve" } }), "cover_i")]
    #[case::fractional_cover(json!({ "cover_i": { "doubleValue": 4.5 } }), "cover_i")]
    #[case::bad_year(json!({ "first_publish_year": { "integerValue": "9999999999" } }), "year")]
    #[case::blank_key(json!({ "key": { "stringValue": "  " } }), "key")]
    fn undecodable_fields_are_dropped_from_the_record(
        #[case] mut fields: serde_json::Value,
        #[case] field: &str,
    ) {
        fields["author_name"] = json!({ "stringValue": "Frank Herbert" });
        fields["createdAt"] = json!({ "stringValue": "2024-01-01T00:00:00Z" });

        let record = document(fields)
            .into_record()
            .unwrap_or_else(|error| panic!("{field}: record should survive: {error}"));

        assert_eq!(record.id.as_str(), "abc123");
        assert_eq!(record.book.author_name.as_deref(), Some("Frank Herbert"));
        match field {
            "title" => assert_eq!(record.book.title, None),
            "cover_i" => assert_eq!(record.book.cover_image_id, None),
            "year" => assert_eq!(record.book.first_publish_year, None),
            "key" => assert_eq!(record.book.key, None),
            _ => panic!("unsupported test expectation: {field}"),
        }
    }

    #[test]
    fn stored_keys_are_trimmed() {
        let record = document(json!({
            "key": { "stringValue": " /works/OL1W " },
            "createdAt": { "stringValue": "2024-01-01T00:00:00Z" }
        }))
        .into_record()
        .expect("record should map");

        assert_eq!(record.book.key.as_ref().map(BookKey::as_str), Some("/works/OL1W"));
    }

    #[rstest]
    #[case::bad_timestamp(json!({ "createdAt": { "stringValue": "yesterday" } }))]
    #[case::missing_timestamp(json!({ "title": { "stringValue": "Emma" } }))]
    fn unreadable_timestamps_fall_back_to_the_epoch(#[case] fields: serde_json::Value) {
        let record = document(fields).into_record().expect("record should survive");
        assert_eq!(record.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn documents_without_an_id_are_rejected() {
        let dto: DocumentDto = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/u1/items/",
            "fields": { "createdAt": { "stringValue": "2024-01-01T00:00:00Z" } }
        }))
        .expect("document should decode");

        let error = dto.into_record().expect_err("no id");
        assert!(error.contains("items/"), "unexpected error: {error}");
    }

    #[test]
    fn encodes_present_fields_with_stored_names() {
        let key = BookKey::new("/works/OL1W").expect("valid key");
        let created_at = Utc.with_ymd_and_hms(2024, 11, 1, 9, 30, 0).single().expect("valid");
        let dto = WriteDocumentDto::from_document(&FavoriteDocument {
            book: BookData::for_key(key)
                .with_title("Dune")
                .with_cover_image_id(7),
            created_at,
        });

        assert_eq!(
            serde_json::to_value(&dto).expect("serialises"),
            json!({
                "fields": {
                    "key": { "stringValue": "/works/OL1W" },
                    "title": { "stringValue": "Dune" },
                    "cover_i": { "integerValue": "7" },
                    "createdAt": { "stringValue": "2024-11-01T09:30:00.000Z" }
                }
            })
        );
    }

    #[test]
    fn list_page_defaults_to_empty() {
        let page: ListDocumentsDto = serde_json::from_str("{}").expect("empty page");
        assert!(page.documents.is_empty());
        assert_eq!(page.next_page_token, None);
    }
}
