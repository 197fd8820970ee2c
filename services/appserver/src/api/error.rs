//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so handlers and the
//! authorization middleware return one error shape.
//!
//! # Key invariants and assumptions
//! - Error responses carry a stable `code` and a human-readable `message`.
//! - Status codes match the error category.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
//! - Authorization denials never say whether a hidden resource exists.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use warden_iam::{Denial, IamError};

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use appserver::api::error::ApiError;
/// use warden_iam::Denial;
///
/// let err = ApiError::from(Denial::Unauthenticated);
/// assert_eq!(err.status, StatusCode::UNAUTHORIZED);
/// assert_eq!(err.body.message, "User is not signed in");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotFound => api_not_found(denial.message()),
            Denial::Unauthenticated => api_unauthorized(denial.message()),
            Denial::Forbidden => api_forbidden(denial.message()),
        }
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 409 Conflict error.
pub fn api_conflict(code: &str, message: &str) -> ApiError {
    api_error(StatusCode::CONFLICT, code, message)
}

/// Build a 500 Internal Server Error from an engine error.
///
/// The error is logged; the response only carries `message`.
pub fn api_internal(message: &str, err: &IamError) -> ApiError {
    tracing::error!(error = %err, "permission store error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

/// Build a 401 Unauthorized error.
pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

/// Build a 403 Forbidden error.
pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 400 Bad Request validation error.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}
