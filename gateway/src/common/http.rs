//! HTTP Client Utilities
//!
//! Shared outbound client for Google endpoints.

use std::time::Duration;

/// Create a reqwest client with the gateway's standard configuration
///
/// - 30 second request timeout
/// - 10 second connect timeout
/// - Reusable across requests (connection pooling)
pub fn create_http_client() -> Result<reqwest::Client, reqwest::Error> {
    create_http_client_with_timeout(30)
}

/// Create a reqwest client with a custom request timeout
pub fn create_http_client_with_timeout(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
}
