//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Message returned for faults no handler step caught itself.
pub const UNHANDLED_ERROR_MESSAGE: &str = "Failed to fetch storage information";

/// API error type.
///
/// Each variant carries the user-facing message. Internal detail is logged
/// where the error occurs and never reaches the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(&'static str),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message placed in the response body.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized(msg) | Self::ServiceUnavailable(msg) | Self::Internal(msg) => {
                (*msg).to_string()
            }
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Map a panic caught by the router into the generic 500 response.
pub fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(error = %detail, "Storage info error");

    ApiError::Internal(UNHANDLED_ERROR_MESSAGE).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_variants() {
        assert_eq!(
            ApiError::Unauthorized("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::ServiceUnavailable("x").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn body_carries_only_the_public_message() {
        let err = ApiError::Internal("Failed to lookup user");
        assert_eq!(err.message(), "Failed to lookup user");

        let json = serde_json::to_value(ErrorResponse {
            error: err.message(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Failed to lookup user" }));
    }

    #[test]
    fn panic_maps_to_internal_error() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
