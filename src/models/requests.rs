use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::core::error::DispatchError;
use crate::core::matcher::MatchPolicy;
use crate::models::domain::{Coordinate, MatchRequest, NotificationKind, NotifyContext};

/// Error text returned when a match request has no usable pickup point
pub const PICKUP_REQUIRED: &str = "Pickup location required";

/// Request to find drivers near a pickup point
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchDriversRequest {
    #[serde(rename = "pickupLat", default)]
    pub pickup_lat: Option<f64>,
    #[serde(rename = "pickupLng", default)]
    pub pickup_lng: Option<f64>,
    #[serde(rename = "rideId", default)]
    pub ride_id: Option<String>,
    #[serde(rename = "maxRadius", default)]
    pub max_radius: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MatchDriversRequest {
    /// Validate the wire request and apply the configured defaults
    pub fn to_match_request(&self, policy: &MatchPolicy) -> Result<MatchRequest, DispatchError> {
        let (lat, lng) = match (self.pickup_lat, self.pickup_lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            _ => return Err(DispatchError::InvalidRequest(PICKUP_REQUIRED.to_string())),
        };

        let pickup = Coordinate::new(lat, lng)?;
        let limit = self
            .limit
            .unwrap_or(policy.default_limit)
            .min(policy.max_limit);

        let mut request = MatchRequest::new(pickup)
            .with_radius_km(self.max_radius.unwrap_or(policy.default_radius_km))?
            .with_limit(limit)?;

        if let Some(ride_id) = self.ride_id.as_deref().filter(|id| !id.is_empty()) {
            request = request.with_ride_id(ride_id);
        }

        Ok(request)
    }
}

/// Request to notify a single driver
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NotifyDriverRequest {
    #[validate(length(min = 1, message = "driverId is required"))]
    #[serde(rename = "driverId", default)]
    pub driver_id: String,
    #[validate(length(min = 1, message = "type is required"))]
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "rideId", default)]
    pub ride_id: Option<String>,
    #[serde(rename = "deliveryId", default)]
    pub delivery_id: Option<String>,
    #[serde(rename = "pickupAddress", default)]
    pub pickup_address: Option<String>,
    #[serde(rename = "dropoffAddress", default)]
    pub dropoff_address: Option<String>,
    #[serde(default)]
    pub fare: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
}

impl NotifyDriverRequest {
    pub fn notification_kind(&self) -> NotificationKind {
        NotificationKind::from(self.kind.as_str())
    }

    pub fn context(&self) -> NotifyContext {
        NotifyContext {
            ride_id: self.ride_id.clone(),
            delivery_id: self.delivery_id.clone(),
            pickup_address: self.pickup_address.clone(),
            dropoff_address: self.dropoff_address.clone(),
            fare: self.fare,
            distance: self.distance,
        }
    }
}
