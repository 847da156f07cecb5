use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default search radius when a match request does not carry one
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Default number of candidates returned per match request
pub const DEFAULT_LIMIT: usize = 5;

/// Errors raised when constructing domain values from untrusted input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("coordinate is missing")]
    MissingCoordinate,

    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("location is the (0, 0) placeholder")]
    ZeroSentinel,

    #[error("invalid location timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("search radius must be a positive number of kilometers, got {0}")]
    InvalidRadius(f64),

    #[error("limit must be at least 1")]
    InvalidLimit,
}

/// A validated latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lng: Option<f64>,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ModelError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        match (raw.lat, raw.lng) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => Err(ModelError::MissingCoordinate),
        }
    }
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values
    pub fn new(lat: f64, lng: f64) -> Result<Self, ModelError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);

        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(ModelError::InvalidCoordinate { lat, lng })
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// True for the (0, 0) value clients write before they have a GPS fix
    pub fn is_zero_sentinel(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Last reported position of a driver
///
/// Written periodically by the driver client; the matcher only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDriverLocation")]
pub struct DriverLocation {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    #[serde(rename = "updatedAt")]
    pub updated_at_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

#[derive(Deserialize)]
struct RawDriverLocation {
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lng: Option<f64>,
    #[serde(rename = "updatedAt")]
    updated_at: Option<i64>,
    #[serde(default)]
    heading: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
}

impl TryFrom<RawDriverLocation> for DriverLocation {
    type Error = ModelError;

    fn try_from(raw: RawDriverLocation) -> Result<Self, Self::Error> {
        let coordinate = Coordinate::try_from(RawCoordinate {
            lat: raw.lat,
            lng: raw.lng,
        })?;
        let updated_at = raw.updated_at.ok_or(ModelError::InvalidTimestamp(0))?;

        Ok(DriverLocation::new(coordinate, updated_at)?.with_motion(raw.heading, raw.speed))
    }
}

impl DriverLocation {
    pub fn new(coordinate: Coordinate, updated_at_ms: i64) -> Result<Self, ModelError> {
        if coordinate.is_zero_sentinel() {
            return Err(ModelError::ZeroSentinel);
        }
        if updated_at_ms <= 0 {
            return Err(ModelError::InvalidTimestamp(updated_at_ms));
        }

        Ok(Self {
            coordinate,
            updated_at_ms,
            heading: None,
            speed: None,
        })
    }

    pub fn with_motion(mut self, heading: Option<f64>, speed: Option<f64>) -> Self {
        self.heading = heading.filter(|h| h.is_finite());
        self.speed = speed.filter(|s| s.is_finite());
        self
    }
}

/// Approval state managed by the driver-onboarding flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverRating {
    pub average: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "plateNumber", default, skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(rename = "vehicleType", default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
}

/// Driver as owned by the driver-management subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    #[serde(alias = "driverId")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub status: DriverStatus,
    #[serde(rename = "isOnline", default)]
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<DriverRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
}

impl DriverRecord {
    /// Average rating, with unrated drivers counted as 0
    pub fn rating_value(&self) -> f64 {
        self.rating
            .map(|r| r.average)
            .filter(|avg| avg.is_finite())
            .unwrap_or(0.0)
    }
}

/// A validated request for nearby drivers
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    pub pickup: Coordinate,
    pub ride_id: Option<String>,
    pub max_radius_km: f64,
    pub limit: usize,
}

impl MatchRequest {
    pub fn new(pickup: Coordinate) -> Self {
        Self {
            pickup,
            ride_id: None,
            max_radius_km: DEFAULT_RADIUS_KM,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Result<Self, ModelError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ModelError::InvalidRadius(radius_km));
        }
        self.max_radius_km = radius_km;
        Ok(self)
    }

    pub fn with_limit(mut self, limit: usize) -> Result<Self, ModelError> {
        if limit == 0 {
            return Err(ModelError::InvalidLimit);
        }
        self.limit = limit;
        Ok(self)
    }

    pub fn with_ride_id(mut self, ride_id: impl Into<String>) -> Self {
        self.ride_id = Some(ride_id.into());
        self
    }
}

/// A driver that passed eligibility for one match request
///
/// `distance_km` holds the exact distance used for ranking; it is rounded
/// to two decimals only when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub driver: DriverRecord,
    pub location: DriverLocation,
    #[serde(rename = "distanceKm", serialize_with = "serialize_rounded_km")]
    pub distance_km: f64,
    #[serde(rename = "etaMinutes")]
    pub eta_minutes: u32,
}

fn serialize_rounded_km<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(crate::core::geo::round_to_precision(*value))
}

/// Kind of driver-facing notification
///
/// Unrecognised type strings are preserved as `Other` and rendered with the
/// generic title and body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    RideRequest,
    RideCancelled,
    DeliveryRequest,
    DeliveryCancelled,
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::RideRequest => "RIDE_REQUEST",
            NotificationKind::RideCancelled => "RIDE_CANCELLED",
            NotificationKind::DeliveryRequest => "DELIVERY_REQUEST",
            NotificationKind::DeliveryCancelled => "DELIVERY_CANCELLED",
            NotificationKind::Other(raw) => raw,
        }
    }

    /// Entity whose notified-drivers list should record this notification
    pub fn marker_target(&self, context: &NotifyContext) -> Option<DispatchEntity> {
        match self {
            NotificationKind::RideRequest => context.ride_id.clone().map(DispatchEntity::Ride),
            NotificationKind::DeliveryRequest => {
                context.delivery_id.clone().map(DispatchEntity::Delivery)
            }
            _ => None,
        }
    }
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "RIDE_REQUEST" => NotificationKind::RideRequest,
            "RIDE_CANCELLED" => NotificationKind::RideCancelled,
            "DELIVERY_REQUEST" => NotificationKind::DeliveryRequest,
            "DELIVERY_CANCELLED" => NotificationKind::DeliveryCancelled,
            _ => NotificationKind::Other(value),
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(value: &str) -> Self {
        NotificationKind::from(value.to_string())
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ride or delivery details attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fare: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Entry in a driver's notification log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub driver_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[serde(flatten)]
    pub context: NotifyContext,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Marker stored under a ride or delivery once a driver has been notified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifiedMarker {
    pub driver_id: String,
    pub notified_at: DateTime<Utc>,
    #[serde(default)]
    pub responded: bool,
}

/// Ride or delivery aggregate that tracks which drivers were notified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DispatchEntity {
    Ride(String),
    Delivery(String),
}

impl DispatchEntity {
    pub fn collection(&self) -> &'static str {
        match self {
            DispatchEntity::Ride(_) => "rides",
            DispatchEntity::Delivery(_) => "deliveries",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DispatchEntity::Ride(id) | DispatchEntity::Delivery(id) => id,
        }
    }
}

impl fmt::Display for DispatchEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection(), self.id())
    }
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}
