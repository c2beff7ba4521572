//! Google OAuth2 Provider
//!
//! PKCE Authorization Code flow for the Gmail scopes the triage flow needs.

use std::collections::HashMap;
use tracing::{error, info};

use super::{OAuthProvider, OAuthTokens, ProviderError};
use crate::config::GoogleConfig;

// ── Gmail scopes ────────────────────────────────────────────────────────────

pub const GMAIL_SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.compose",
];

/// Google OAuth2 provider.
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_endpoint: String,
    token_endpoint: String,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: &GoogleConfig, http: reqwest::Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_endpoint: config.auth_endpoint.clone(),
            token_endpoint: config.token_endpoint.clone(),
            http,
        }
    }

    /// POST a form-encoded request to the token endpoint and return the body.
    ///
    /// Secrets travel in the request body, never in the URL.
    async fn post_form(&self, params: &HashMap<&str, &str>) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Token endpoint HTTP error {}: {}", status, body);
            // Google reports grant failures as 400 with an OAuth error body
            if let Err(grant) = check_grant_error(&body) {
                return Err(grant);
            }
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

impl OAuthProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorize_url(&self, scopes: &[String], state: &str, code_challenge: &str) -> String {
        let scope_str = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
            self.auth_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scope_str),
            urlencoding::encode(state),
            urlencoding::encode(code_challenge),
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuthTokens, ProviderError> {
        info!("Exchanging authorization code for tokens");

        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());
        params.insert("code", code);
        params.insert("code_verifier", code_verifier);
        params.insert("grant_type", "authorization_code");
        params.insert("redirect_uri", self.redirect_uri.as_str());

        let response = self.post_form(&params).await?;
        parse_token_response(&response)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthTokens, ProviderError> {
        info!("Refreshing access token");

        let mut params = HashMap::new();
        params.insert("client_id", self.client_id.as_str());
        params.insert("client_secret", self.client_secret.as_str());
        params.insert("refresh_token", refresh_token);
        params.insert("grant_type", "refresh_token");

        let response = self.post_form(&params).await?;
        parse_token_response(&response)
    }

    fn default_scopes(&self) -> Vec<String> {
        GMAIL_SCOPES.iter().map(|s| s.to_string()).collect()
    }
}

fn check_grant_error(body: &str) -> Result<(), ProviderError> {
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(());
    };
    if let Some(err) = parsed.get("error").and_then(|v| v.as_str()) {
        let description = parsed
            .get("error_description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error");
        return Err(ProviderError::Grant {
            error: err.to_string(),
            description: description.to_string(),
        });
    }
    Ok(())
}

/// Parse a Google OAuth2 token response.
fn parse_token_response(body: &str) -> Result<OAuthTokens, ProviderError> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("invalid JSON: {}", e)))?;

    check_grant_error(body)?;

    let access_token = parsed
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ProviderError::InvalidResponse("missing access_token".to_string()))?
        .to_string();

    let refresh_token = parsed
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(String::from);

    let token_type = parsed
        .get("token_type")
        .and_then(|v| v.as_str())
        .unwrap_or("Bearer")
        .to_string();

    let expires_in = parsed
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .unwrap_or(3600);

    let expiry = chrono::Utc::now() + chrono::Duration::seconds(expires_in);

    let scopes = parsed
        .get("scope")
        .and_then(|v| v.as_str())
        .map(|s| s.split(' ').map(String::from).collect())
        .unwrap_or_default();

    Ok(OAuthTokens {
        access_token,
        refresh_token,
        token_type,
        expiry,
        scopes,
    })
}

// ── PKCE Utilities ──────────────────────────────────────────────────────────

/// Generate a PKCE code verifier (43-128 characters of unreserved URI characters).
pub fn generate_code_verifier() -> String {
    random_token()
}

/// 32 random bytes, base64url encoded. Used for PKCE verifiers, OAuth
/// `state` values and session ids.
pub fn random_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

/// Derive the PKCE code challenge from a code verifier using S256.
pub fn generate_code_challenge(verifier: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(verifier.as_bytes());
    base64_url_encode(&hash)
}

/// Base64url encoding (no padding) per RFC 4648 §5.
fn base64_url_encode(data: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    URL_SAFE_NO_PAD.encode(data)
}
