//! Client-facing errors.
//!
//! Every variant maps to exactly one status and a short, non-sensitive
//! message. Internal detail is logged where the error is raised and never
//! rendered into a response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Body returned for any internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred. Please try again later.";

/// A rejection produced by one of the gates. Terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("No token provided")]
    NoToken,

    #[error("Invalid token format")]
    MalformedToken,

    /// Signature, expiry and parse failures, merged for the caller.
    #[error("Invalid or expired token")]
    TokenRejected,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid user role")]
    UnknownRole,

    #[error("Access denied")]
    PermissionDenied,

    #[error("Too many requests. Please try again later.")]
    RateLimitExceeded { retry_after: u64 },
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::NoToken
            | GateError::MalformedToken
            | GateError::TokenRejected
            | GateError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            GateError::UnknownRole | GateError::PermissionDenied => StatusCode::FORBIDDEN,
            GateError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Short label used for log fields and metric labels.
    pub fn reason(&self) -> &'static str {
        match self {
            GateError::NoToken => "no_token",
            GateError::MalformedToken => "malformed_token",
            GateError::TokenRejected => "token_rejected",
            GateError::AuthenticationRequired => "authentication_required",
            GateError::UnknownRole => "unknown_role",
            GateError::PermissionDenied => "permission_denied",
            GateError::RateLimitExceeded { .. } => "rate_limit_exceeded",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = match &self {
            GateError::RateLimitExceeded { retry_after } => json!({
                "error": self.to_string(),
                "retry_after": retry_after,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Errors returned by the built-in handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Gate(#[from] GateError),

    /// Logged with full detail; rendered as a generic 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::Gate(err) => err.into_response(),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error while handling request");
                internal_error_response()
            }
        }
    }
}

/// The generic 500 response.
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": INTERNAL_ERROR_MESSAGE,
            "status_code": 500,
        })),
    )
        .into_response()
}
