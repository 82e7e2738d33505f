//! API error type and HTTP mapping
//!
//! NotAuthorized intentionally maps to 401 with the same generic body as
//! Unauthenticated, so a caller probing foreign lead files cannot tell
//! "wrong owner" from "not logged in". Database and internal errors are
//! logged with detail but answered generically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use portal_core::error::DomainError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, "Unauthorized", msg)
            }
            ApiError::NotAuthorized => {
                tracing::warn!("Not authorized");
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized",
                    "You are not authorized to access this resource".to_string(),
                )
            }
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "NotFound", msg)
            }
            ApiError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, "Conflict", msg)
            }
            ApiError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "UpstreamError", msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "Something went wrong. Please try again later.".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => ApiError::BadRequest(msg),
            DomainError::Unauthenticated(msg) => ApiError::Unauthorized(msg),
            DomainError::NotAuthorized => ApiError::NotAuthorized,
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Upstream(msg) => ApiError::Upstream(msg),
            DomainError::Database(msg) | DomainError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: ApiError) -> StatusCode {
        error.into_response().status()
    }

    #[test]
    fn domain_errors_map_to_the_documented_statuses() {
        let cases = [
            (
                DomainError::Validation("bad phone".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Unauthenticated("bad otp".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (DomainError::NotAuthorized, StatusCode::UNAUTHORIZED),
            (
                DomainError::NotFound("no campaign".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                DomainError::Conflict("user exists".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                DomainError::Upstream("gateway down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DomainError::Database("lost connection".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DomainError::Internal("bug".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (domain, status) in cases {
            assert_eq!(status_of(ApiError::from(domain)), status);
        }
    }

    #[test]
    fn ownership_violations_look_like_plain_unauthorized() {
        // Same status either way, so plot existence never leaks.
        assert_eq!(
            status_of(ApiError::NotAuthorized),
            status_of(ApiError::Unauthorized("no token".to_string()))
        );
    }
}
