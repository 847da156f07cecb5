use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use crate::models::{DispatchEntity, DriverLocation, DriverRecord, NotificationRecord, NotifiedMarker};

/// Errors that can occur when talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal read/write surface the dispatch core needs from the store
///
/// Reads are full scans; the matcher filters in memory. Writes are inserts
/// under keys the caller controls, so concurrent notifications never
/// overwrite each other.
pub trait DocumentStore: Send + Sync + 'static {
    /// Every driver record
    fn list_drivers(&self) -> impl Future<Output = Result<Vec<DriverRecord>, StoreError>> + Send;

    /// Last valid location per driver id
    fn list_locations(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, DriverLocation>, StoreError>> + Send;

    fn get_driver(
        &self,
        driver_id: &str,
    ) -> impl Future<Output = Result<Option<DriverRecord>, StoreError>> + Send;

    /// Append to the driver's notification log under `record.id`
    fn append_notification(
        &self,
        record: &NotificationRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Record that a driver was notified about a ride or delivery
    ///
    /// Keyed by `(entity, marker.driver_id)`. Returns `false` when a marker
    /// for that pair already exists, in which case it is left untouched.
    fn record_notified_marker(
        &self,
        entity: &DispatchEntity,
        marker: &NotifiedMarker,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
