//! Common Error Types
//!
//! Edge error for HTTP handlers. Internal failures are logged where they are
//! converted; only the fixed public message reaches the client.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use swipemail_protocol::ErrorResponse;
use tracing::error;

/// Error categories surfaced by the REST API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No session, or the session holds no token set
    NotAuthenticated,
    /// Google rejected or failed a call
    UpstreamFailure,
    /// Anything else that went wrong inside the gateway
    InternalError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::UpstreamFailure | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Application error with a client-safe message
#[derive(Debug)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated, "Not authenticated")
    }

    /// Log `cause` and hide it behind a fixed public message.
    pub fn upstream(public_message: &str, cause: impl fmt::Display) -> Self {
        error!("{}: {}", public_message, cause);
        Self::new(ErrorCode::UpstreamFailure, public_message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.status().as_u16(), self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
        };
        (self.code.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::not_authenticated().code.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::upstream("Failed to send draft", "quota exceeded").code.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_hides_cause() {
        let err = AppError::upstream("Failed to flag draft", "Google API error 403: forbidden");
        assert_eq!(err.message, "Failed to flag draft");
        assert!(!err.to_string().contains("403"));
    }
}
