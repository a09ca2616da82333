//! Favourites configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::favorite_sync::{
    DEFAULT_LIST_REFETCH_DELAY, DEFAULT_POLL_INTERVAL, SyncSettings,
};
use crate::domain::{Error, LookupFailurePolicy};
use crate::outbound::firestore::{
    DEFAULT_FIRESTORE_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT, FirestoreConnection,
};

fn millis_or(value: Option<u64>, default: Duration) -> Duration {
    value.map_or(default, Duration::from_millis)
}

/// Configuration values controlling favourites sync and storage.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKFOO")]
pub struct FavoritesSettings {
    /// Milliseconds between favourite status polls.
    pub poll_interval_ms: Option<u64>,
    /// Milliseconds to wait after a list toggle before refetching.
    pub list_refetch_delay_ms: Option<u64>,
    /// Report "not favourited" instead of failing when a lookup errors.
    #[ortho_config(default = true)]
    pub fail_open_on_lookup_error: bool,
    /// Firestore project id; required for the Firestore store.
    pub firestore_project_id: Option<String>,
    /// Firestore REST root override.
    pub firestore_base_url: Option<String>,
    /// Bearer token sent to Firestore.
    pub firestore_bearer_token: Option<String>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Documents requested per Firestore list page.
    pub firestore_page_size: Option<u32>,
}

impl FavoritesSettings {
    /// Interval between status polls.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::InvalidRequest`] for a zero
    /// interval.
    pub fn poll_interval(&self) -> Result<Duration, Error> {
        let interval = millis_or(self.poll_interval_ms, DEFAULT_POLL_INTERVAL);
        if interval.is_zero() {
            return Err(Error::invalid_request("poll_interval_ms must be positive"));
        }
        Ok(interval)
    }

    /// Wait between a list toggle and the refetch.
    pub fn list_refetch_delay(&self) -> Duration {
        millis_or(self.list_refetch_delay_ms, DEFAULT_LIST_REFETCH_DELAY)
    }

    /// Timing settings for synchronised views.
    ///
    /// # Errors
    ///
    /// Fails when the poll interval is invalid.
    pub fn sync_settings(&self) -> Result<SyncSettings, Error> {
        Ok(SyncSettings {
            poll_interval: self.poll_interval()?,
            list_refetch_delay: self.list_refetch_delay(),
        })
    }

    /// Lookup failure policy for the repository.
    pub fn lookup_policy(&self) -> LookupFailurePolicy {
        LookupFailurePolicy::from_fail_open(self.fail_open_on_lookup_error)
    }

    /// Per-request timeout for the Firestore client.
    pub fn request_timeout(&self) -> Duration {
        millis_or(self.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Firestore connection built from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::InvalidRequest`] when the project
    /// id is missing or the base URL does not parse.
    pub fn firestore_connection(&self) -> Result<FirestoreConnection, Error> {
        let project_id = self
            .firestore_project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_request("firestore_project_id is required"))?;
        let raw_base = self
            .firestore_base_url
            .as_deref()
            .unwrap_or(DEFAULT_FIRESTORE_BASE_URL);
        let base_url = Url::parse(raw_base).map_err(|error| {
            Error::invalid_request(format!("invalid firestore_base_url `{raw_base}`: {error}"))
        })?;
        let mut connection = FirestoreConnection::new(project_id)
            .map_err(|error| Error::internal(error.to_string()))?;
        connection.base_url = base_url;
        connection.bearer_token = self.firestore_bearer_token.clone();
        connection.timeout = self.request_timeout();
        connection.page_size = self.firestore_page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        Ok(connection)
    }
}
