// Route exports
pub mod dispatch;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use crate::core::DispatchError;
use crate::models::ErrorResponse;
use crate::services::{DocumentStore, StoreError};

pub use dispatch::AppState;

pub fn configure_routes<S: DocumentStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(dispatch::configure::<S>),
    );
}

impl DispatchError {
    /// Short label for the `error` field of the response body
    fn label(&self) -> String {
        match self {
            DispatchError::InvalidRequest(message) => message.clone(),
            DispatchError::NotFound { entity, .. } => format!("{} not found", entity),
            DispatchError::UpstreamUnavailable(StoreError::Timeout(_)) => "Upstream timeout".to_string(),
            DispatchError::UpstreamUnavailable(_) => "Upstream unavailable".to_string(),
            DispatchError::PartialNotifyFailure { .. } => "Partial notification failure".to_string(),
        }
    }
}

impl ResponseError for DispatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::PartialNotifyFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.label(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// JSON error response for payload errors
#[derive(Debug)]
struct PayloadError(ErrorResponse);

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// JSON extractor config shared by the server and the tests
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(handle_json_payload_error)
}
