use serde::{Deserialize, Serialize};
use crate::models::domain::{Coordinate, MatchCandidate};

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDriversResponse {
    pub drivers: Vec<MatchCandidate>,
    pub total: usize,
    #[serde(rename = "pickupLocation")]
    pub pickup_location: Coordinate,
    #[serde(rename = "searchRadius")]
    pub search_radius: f64,
}

/// Response for the match endpoint when the store holds no drivers at all
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoDriversResponse {
    pub drivers: Vec<MatchCandidate>,
    pub message: String,
}

impl NoDriversResponse {
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
            message: "No drivers found".to_string(),
        }
    }
}

impl Default for NoDriversResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response for the notify endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyDriverResponse {
    pub success: bool,
    #[serde(rename = "notificationId")]
    pub notification_id: String,
    pub message: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
