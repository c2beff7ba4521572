//! Route handlers
//!
//! Each handler converts domain errors into [`AppError`](crate::common::AppError)
//! with the route's fixed public message.

pub mod auth;
pub mod drafts;

pub async fn health() -> &'static str {
    "OK"
}
