//! SwipeMail gateway
//!
//! Holds Google OAuth tokens per browser session and exposes a small REST
//! API for reviewing Gmail drafts: list the drafts labelled Review, send
//! one, or flag it for later.

pub mod api;
pub mod auth;
pub mod common;
pub mod config;
pub mod drafts;
pub mod google;

pub use api::{router, serve, AppState};
pub use config::GatewayConfig;
