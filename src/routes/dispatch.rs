use actix_web::{web, HttpResponse, Responder};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;
use crate::core::{DispatchError, MatchPolicy, Matcher, Notifier};
use crate::models::{
    HealthResponse, MatchDriversRequest, MatchDriversResponse, NoDriversResponse,
    NotifyDriverRequest, NotifyDriverResponse,
};
use crate::services::{DocumentStore, StoreError};

/// Application state shared across all handlers
pub struct AppState<S> {
    pub matcher: Matcher<S>,
    pub notifier: Notifier<S>,
    pub request_timeout: Duration,
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(store: Arc<S>, policy: MatchPolicy, request_timeout: Duration) -> Self {
        Self {
            matcher: Matcher::new(Arc::clone(&store), policy),
            notifier: Notifier::new(store),
            request_timeout,
        }
    }
}

/// Configure all dispatch routes
pub fn configure<S: DocumentStore>(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/match-drivers", web::post().to(match_drivers::<S>))
        .route("/notify-driver", web::post().to(notify_driver::<S>));
}

/// Run a core call under the request deadline
///
/// An elapsed deadline is reported as a retryable upstream failure.
async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, DispatchError>>,
) -> Result<T, DispatchError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Request exceeded deadline of {:?}", limit);
            Err(StoreError::Timeout(limit).into())
        }
    }
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find drivers near a pickup point
///
/// POST /api/v1/match-drivers
///
/// Request body:
/// ```json
/// {
///   "pickupLat": -15.4167,
///   "pickupLng": 28.2833,
///   "rideId": "string",
///   "maxRadius": 10,
///   "limit": 5
/// }
/// ```
async fn match_drivers<S: DocumentStore>(
    state: web::Data<AppState<S>>,
    req: web::Json<MatchDriversRequest>,
) -> Result<HttpResponse, DispatchError> {
    let request = req.to_match_request(state.matcher.policy()).map_err(|e| {
        tracing::info!(
            "Rejected match request: {} (pickupLat={:?}, pickupLng={:?}, maxRadius={:?}, limit={:?})",
            e,
            req.pickup_lat,
            req.pickup_lng,
            req.max_radius,
            req.limit
        );
        e
    })?;

    tracing::info!(
        "Matching drivers for pickup {} (radius {} km, limit {}, ride {:?})",
        request.pickup,
        request.max_radius_km,
        request.limit,
        request.ride_id
    );

    let result = with_deadline(state.request_timeout, state.matcher.find_drivers(&request)).await?;

    if result.fleet_is_empty() {
        return Ok(HttpResponse::Ok().json(NoDriversResponse::new()));
    }

    Ok(HttpResponse::Ok().json(MatchDriversResponse {
        drivers: result.candidates,
        total: result.total_eligible,
        pickup_location: result.pickup,
        search_radius: result.search_radius_km,
    }))
}

/// Notify a driver about a ride or delivery
///
/// POST /api/v1/notify-driver
///
/// Request body:
/// ```json
/// {
///   "driverId": "string",
///   "type": "RIDE_REQUEST|RIDE_CANCELLED|DELIVERY_REQUEST|DELIVERY_CANCELLED",
///   "rideId": "string",
///   "pickupAddress": "string",
///   "fare": 25
/// }
/// ```
async fn notify_driver<S: DocumentStore>(
    state: web::Data<AppState<S>>,
    req: web::Json<NotifyDriverRequest>,
) -> Result<HttpResponse, DispatchError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for notify request: field_errors={:?}", errors);
        return Err(DispatchError::InvalidRequest(
            "driverId and type are required".to_string(),
        ));
    }

    let record = with_deadline(
        state.request_timeout,
        state
            .notifier
            .notify(&req.driver_id, req.notification_kind(), req.context()),
    )
    .await?;

    Ok(HttpResponse::Ok().json(NotifyDriverResponse {
        success: true,
        notification_id: record.id,
        message: format!("Notification sent to driver {}", record.driver_id),
    }))
}
