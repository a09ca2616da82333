//! Reqwest-backed Firestore favourites store.
//!
//! This adapter owns transport details only: resource URLs, bearer
//! authentication, pagination, HTTP error mapping, and JSON decoding into
//! favourite records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::dto::{DocumentDto, ListDocumentsDto, WriteDocumentDto};
use crate::domain::ports::{FavoritesStore, FavoritesStoreError};
use crate::domain::{FavoriteDocument, FavoriteId, FavoriteRecord, UserId};

/// Public Firestore REST endpoint.
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1/";
/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "(default)";
/// Documents requested per list page.
pub const DEFAULT_PAGE_SIZE: u32 = 300;
/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while building a [`FirestoreFavoritesStore`].
#[derive(Debug, thiserror::Error)]
pub enum FirestoreStoreBuildError {
    /// The project id was blank.
    #[error("firestore project id must not be empty")]
    EmptyProjectId,
    /// The base URL cannot carry path segments.
    #[error("firestore base url `{0}` cannot be used as a base")]
    InvalidBaseUrl(String),
    /// The HTTP client could not be constructed.
    #[error("failed to build firestore http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Where and how to reach Firestore.
#[derive(Debug, Clone)]
pub struct FirestoreConnection {
    /// REST root, normally [`DEFAULT_FIRESTORE_BASE_URL`].
    pub base_url: Url,
    /// Google Cloud project id.
    pub project_id: String,
    /// Database id.
    pub database: String,
    /// OAuth or Firebase ID token sent as `Authorization: Bearer`.
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Documents requested per list page.
    pub page_size: u32,
}

impl FirestoreConnection {
    /// Connection to the public endpoint for `project_id` with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FirestoreStoreBuildError::InvalidBaseUrl`] if the built-in
    /// endpoint fails to parse.
    pub fn new(project_id: impl Into<String>) -> Result<Self, FirestoreStoreBuildError> {
        let base_url = Url::parse(DEFAULT_FIRESTORE_BASE_URL).map_err(|_| {
            FirestoreStoreBuildError::InvalidBaseUrl(DEFAULT_FIRESTORE_BASE_URL.to_owned())
        })?;
        Ok(Self {
            base_url,
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_owned(),
            bearer_token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }
}

/// Favourites store over the Firestore REST API.
///
/// Documents live at `users/{userId}/items/{documentId}`.
pub struct FirestoreFavoritesStore {
    client: Client,
    connection: FirestoreConnection,
}

impl FirestoreFavoritesStore {
    /// Build an adapter with a reqwest client using the connection timeout.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank project id, a base URL that cannot
    /// carry a path, or a client that cannot be constructed.
    pub fn new(connection: FirestoreConnection) -> Result<Self, FirestoreStoreBuildError> {
        if connection.project_id.trim().is_empty() {
            return Err(FirestoreStoreBuildError::EmptyProjectId);
        }
        if connection.base_url.cannot_be_a_base() {
            return Err(FirestoreStoreBuildError::InvalidBaseUrl(
                connection.base_url.to_string(),
            ));
        }
        let client = Client::builder().timeout(connection.timeout).build()?;
        Ok(Self { client, connection })
    }

    fn collection_url(&self, user_id: &UserId) -> Result<Url, FavoritesStoreError> {
        let mut url = self.connection.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FavoritesStoreError::rejected("firestore base url cannot be a base"))?
            .pop_if_empty()
            .extend([
                "projects",
                self.connection.project_id.as_str(),
                "databases",
                self.connection.database.as_str(),
                "documents",
                "users",
                user_id.as_ref(),
                "items",
            ]);
        Ok(url)
    }

    fn item_url(
        &self,
        user_id: &UserId,
        favorite_id: &FavoriteId,
    ) -> Result<Url, FavoritesStoreError> {
        let mut url = self.collection_url(user_id)?;
        url.path_segments_mut()
            .map_err(|()| FavoritesStoreError::rejected("firestore base url cannot be a base"))?
            .push(favorite_id.as_str());
        Ok(url)
    }

    fn list_page_url(
        &self,
        user_id: &UserId,
        page_token: Option<&str>,
    ) -> Result<Url, FavoritesStoreError> {
        let mut url = self.collection_url(user_id)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &self.connection.page_size.max(1).to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }

    fn authorise(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.connection.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), FavoritesStoreError> {
        let response = self
            .authorise(request)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl FavoritesStore for FirestoreFavoritesStore {
    async fn list_items(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<FavoriteRecord>, FavoritesStoreError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = self.list_page_url(user_id, page_token.as_deref())?;
            let (status, body) = self.send(self.client.get(url)).await?;
            if !status.is_success() {
                return Err(map_status_error(status, &body));
            }
            let page = parse_list_page(&body)?;
            records.extend(page.records);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(user_id = %user_id, count = records.len(), "listed firestore favorites");
        Ok(records)
    }

    async fn insert_item(
        &self,
        user_id: &UserId,
        document: &FavoriteDocument,
    ) -> Result<FavoriteId, FavoritesStoreError> {
        let url = self.collection_url(user_id)?;
        let payload = WriteDocumentDto::from_document(document);
        let (status, body) = self.send(self.client.post(url).json(&payload)).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        parse_created_id(&body)
    }

    async fn delete_item(
        &self,
        user_id: &UserId,
        favorite_id: &FavoriteId,
    ) -> Result<(), FavoritesStoreError> {
        let url = self.item_url(user_id, favorite_id)?;
        let (status, body) = self.send(self.client.delete(url)).await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(map_status_error(status, &body))
    }
}

#[derive(Debug)]
struct ListPage {
    records: Vec<FavoriteRecord>,
    next_page_token: Option<String>,
}

/// Decode one list page, skipping documents without a readable id.
fn parse_list_page(body: &[u8]) -> Result<ListPage, FavoritesStoreError> {
    let page: ListDocumentsDto = serde_json::from_slice(body).map_err(|error| {
        FavoritesStoreError::decode(format!("invalid firestore list payload: {error}"))
    })?;
    let records = page
        .documents
        .into_iter()
        .filter_map(|document| match document.into_record() {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(error = %error, "skipping favorite document without an id");
                None
            }
        })
        .collect();
    Ok(ListPage {
        records,
        next_page_token: page.next_page_token,
    })
}

fn parse_created_id(body: &[u8]) -> Result<FavoriteId, FavoritesStoreError> {
    let document: DocumentDto = serde_json::from_slice(body).map_err(|error| {
        FavoritesStoreError::decode(format!("invalid firestore document payload: {error}"))
    })?;
    document.document_id().map_err(FavoritesStoreError::decode)
}

fn map_transport_error(error: reqwest::Error) -> FavoritesStoreError {
    if error.is_timeout() {
        FavoritesStoreError::unavailable(format!("firestore request timed out: {error}"))
    } else {
        FavoritesStoreError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> FavoritesStoreError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            FavoritesStoreError::unavailable(message)
        }
        _ if status.is_client_error() => FavoritesStoreError::rejected(message),
        _ => FavoritesStoreError::unavailable(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network Firestore helpers.

    use super::*;
    use crate::domain::BookKey;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> FirestoreFavoritesStore {
        let connection = FirestoreConnection::new("bookfoo-test").expect("connection");
        FirestoreFavoritesStore::new(connection).expect("store should build")
    }

    #[fixture]
    fn user() -> UserId {
        UserId::new("uid-42").expect("valid id")
    }

    #[rstest]
    fn builds_collection_and_item_urls(store: FirestoreFavoritesStore, user: UserId) {
        let collection = store.collection_url(&user).expect("collection url");
        assert_eq!(
            collection.as_str(),
            "https://firestore.googleapis.com/v1/projects/bookfoo-test/databases/(default)/documents/users/uid-42/items"
        );

        let item = store
            .item_url(&user, &FavoriteId::new("doc1").expect("valid id"))
            .expect("item url");
        assert!(item.as_str().ends_with("/users/uid-42/items/doc1"));
    }

    #[rstest]
    fn list_urls_carry_page_size_and_token(store: FirestoreFavoritesStore, user: UserId) {
        let first = store.list_page_url(&user, None).expect("first page");
        assert_eq!(first.query(), Some("pageSize=300"));

        let next = store.list_page_url(&user, Some("tok/en")).expect("next page");
        assert_eq!(next.query(), Some("pageSize=300&pageToken=tok%2Fen"));
    }

    #[rstest]
    fn base_urls_without_trailing_slash_still_nest(user: UserId) {
        let mut connection = FirestoreConnection::new("p").expect("connection");
        connection.base_url = Url::parse("http://localhost:8080/v1").expect("url");
        let store = FirestoreFavoritesStore::new(connection).expect("store");

        let url = store.collection_url(&user).expect("collection url");
        assert_eq!(url.path(), "/v1/projects/p/databases/(default)/documents/users/uid-42/items");
    }

    #[rstest]
    #[case::blank_project("  ", "http://localhost/")]
    #[case::opaque_base("p", "mailto:ops@example.com")]
    fn rejects_unusable_connections(#[case] project: &str, #[case] base: &str) {
        let mut connection = FirestoreConnection::new(project).expect("connection");
        connection.base_url = Url::parse(base).expect("url");
        assert!(FirestoreFavoritesStore::new(connection).is_err());
    }

    #[rstest]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, "Rejected")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Rejected")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "Rejected")]
    #[case::not_found(StatusCode::NOT_FOUND, "Rejected")]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, "Unavailable")]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, "Unavailable")]
    #[case::server_error(StatusCode::SERVICE_UNAVAILABLE, "Unavailable")]
    fn maps_http_statuses_to_store_errors(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"{\"error\":{\"status\":\"X\"}}");
        match expected {
            "Rejected" => assert!(
                matches!(error, FavoritesStoreError::Rejected { .. }),
                "{status} should map to Rejected"
            ),
            "Unavailable" => assert!(
                matches!(error, FavoritesStoreError::Unavailable { .. }),
                "{status} should map to Unavailable"
            ),
            _ => panic!("unsupported test expectation: {expected}"),
        }
    }

    #[test]
    fn status_messages_include_a_compact_preview() {
        let long_body = format!("{{\n  \"error\": \"{}\"\n}}", "x".repeat(300));
        let error = map_status_error(StatusCode::INTERNAL_SERVER_ERROR, long_body.as_bytes());
        let message = error.to_string();
        assert!(message.contains("status 500: { \"error\""));
        assert!(message.ends_with("..."));

        let bare = map_status_error(StatusCode::BAD_GATEWAY, b"");
        assert!(bare.to_string().contains("status 502"));
    }

    #[test]
    fn list_pages_keep_partial_documents_and_skip_unnamed_ones() {
        let body = br#"{
            "documents": [
                {
                    "name": "projects/p/databases/(default)/documents/users/u/items/good",
                    "fields": {
                        "key": { "stringValue": "/works/OL1W" },
                        "createdAt": { "stringValue": "2024-01-01T00:00:00Z" }
                    }
                },
                {
                    "name": "projects/p/databases/(default)/documents/users/u/items/partial",
                    "fields": {
                        "key": { "stringValue": "/works/OL2W" },
                        "title": { "booleanValue": true },
                        "cover_i": { "doubleValue": 1.5 }
                    }
                },
                {
                    "name": "projects/p/databases/(default)/documents/users/u/items/",
                    "fields": { "key": { "stringValue": "/works/OL3W" } }
                }
            ],
            "nextPageToken": "page-2"
        }"#;

        let page = parse_list_page(body).expect("page should decode");
        let ids: Vec<_> = page.records.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "partial"]);
        let partial = &page.records[1].book;
        assert_eq!(partial.key.as_ref().map(BookKey::as_str), Some("/works/OL2W"));
        assert_eq!(partial.title, None);
        assert_eq!(partial.cover_image_id, None);
        assert_eq!(page.next_page_token.as_deref(), Some("page-2"));
    }

    #[test]
    fn malformed_bodies_are_decode_errors() {
        let list = parse_list_page(b"<html>").expect_err("not json");
        assert!(matches!(list, FavoritesStoreError::Decode { .. }));

        let created = parse_created_id(br#"{"name": "projects/p/items/"}"#).expect_err("no id");
        assert!(matches!(created, FavoritesStoreError::Decode { .. }));
    }

    #[test]
    fn created_documents_yield_their_id() {
        let id = parse_created_id(
            br#"{"name": "projects/p/databases/(default)/documents/users/u/items/Xy12", "fields": {}}"#,
        )
        .expect("id");
        assert_eq!(id.as_str(), "Xy12");
    }
}
