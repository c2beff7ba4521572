//! Google API Client Module
//!
//! Authenticated HTTP access to the Gmail v1 REST API. Access tokens are
//! injected per request by the caller's session and never leave the gateway.

pub mod client;
pub mod gmail;
pub mod types;

pub use client::{GoogleApiError, GoogleClient};
pub use gmail::GmailApi;
