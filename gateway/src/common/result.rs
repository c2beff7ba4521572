//! Common Result Type

use super::error::AppError;

/// Result type for request handlers.
///
/// `AppError` renders itself as a JSON error body, so handlers can return
/// `AppResult<Json<T>>` directly.
pub type AppResult<T> = Result<T, AppError>;
