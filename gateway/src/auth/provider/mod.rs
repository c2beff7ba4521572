//! OAuth Provider Abstraction
//!
//! Authorization URL construction, code exchange and refresh behind a trait,
//! so the broker does not depend on Google's endpoint details.

pub mod google;

use chrono::{DateTime, Utc};

/// Tokens returned from an OAuth token exchange or refresh.
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expiry: DateTime<Utc>,
    pub scopes: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("{error}: {description}")]
    Grant { error: String, description: String },
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// OAuth provider trait.
#[allow(async_fn_in_trait)]
pub trait OAuthProvider {
    /// Provider name (e.g. "google")
    fn name(&self) -> &str;

    /// Build the consent URL for the PKCE authorization code flow.
    fn authorize_url(&self, scopes: &[String], state: &str, code_challenge: &str) -> String;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuthTokens, ProviderError>;

    /// Obtain a fresh access token with a refresh token.
    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthTokens, ProviderError>;

    /// Scopes requested at login.
    fn default_scopes(&self) -> Vec<String>;
}
