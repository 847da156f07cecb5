use thiserror::Error;
use crate::models::{DispatchEntity, ModelError};
use crate::services::StoreError;

/// Failures surfaced by the matching and notification core
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed or missing input; never retried
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Store read/write failure or timeout; callers may retry with backoff
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] StoreError),

    /// The driver notification was stored but the entity marker was not
    #[error(
        "notification {notification_id} stored for driver {driver_id} but marking {entity} failed: {source}"
    )]
    PartialNotifyFailure {
        notification_id: String,
        driver_id: String,
        entity: DispatchEntity,
        #[source]
        source: StoreError,
    },
}

impl DispatchError {
    pub fn driver_not_found(driver_id: impl Into<String>) -> Self {
        DispatchError::NotFound {
            entity: "Driver",
            id: driver_id.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::UpstreamUnavailable(_))
    }
}

impl From<ModelError> for DispatchError {
    fn from(err: ModelError) -> Self {
        DispatchError::InvalidRequest(err.to_string())
    }
}
