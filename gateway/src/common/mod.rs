//! Common Utilities
//!
//! Shared error types and HTTP client construction used across the gateway.

pub mod error;
pub mod http;
pub mod result;

pub use error::{AppError, ErrorCode};
pub use http::create_http_client;
pub use result::AppResult;
