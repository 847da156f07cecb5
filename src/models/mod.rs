// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, Coordinate, DispatchEntity, DriverLocation, DriverRating, DriverRecord,
    DriverStatus, MatchCandidate, MatchRequest, ModelError, NotificationKind, NotificationRecord,
    NotifiedMarker, NotifyContext, Vehicle, DEFAULT_LIMIT, DEFAULT_RADIUS_KM,
};
pub use requests::{MatchDriversRequest, NotifyDriverRequest};
pub use responses::{
    ErrorResponse, HealthResponse, MatchDriversResponse, NoDriversResponse, NotifyDriverResponse,
};
