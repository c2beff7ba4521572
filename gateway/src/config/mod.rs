//! Configuration management
//!
//! Reads gateway settings from the environment (after loading `.env`), with
//! Google OAuth client credentials optionally kept in
//! `~/.swipemail/google_oauth.json`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error(
        "Google OAuth client is not configured: set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET \
         or write {0}"
    )]
    MissingCredentials(String),
    #[error("failed to read {path}: {reason}")]
    CredentialsFile { path: String, reason: String },
}

/// Persisted Google OAuth client credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub updated_at: String,
}

/// OAuth client registration plus the endpoints it talks to.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_endpoint: String,
    pub token_endpoint: String,
    pub gmail_api_base: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Front end origin; OAuth callbacks redirect here and CORS allows it.
    pub client_url: String,
    pub google: GoogleConfig,
}

impl GatewayConfig {
    /// Load `.env`, then build the configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok(), google_oauth_config_path())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `credentials_file` is consulted only when the client id or secret is
    /// absent from the lookup.
    pub fn from_lookup<F>(lookup: F, credentials_file: Option<PathBuf>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.trim().parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw,
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let client_url = get("CLIENT_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string());

        let (client_id, client_secret) = match (get("GOOGLE_CLIENT_ID"), get("GOOGLE_CLIENT_SECRET")) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                let path = credentials_file.ok_or_else(|| {
                    ConfigError::MissingCredentials("~/.swipemail/google_oauth.json".to_string())
                })?;
                let stored = read_google_oauth_config(&path)?;
                (stored.client_id, stored.client_secret)
            }
        };

        let redirect_uri = get("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|| format!("http://localhost:{}/auth/google/callback", port));

        let google = GoogleConfig {
            client_id,
            client_secret,
            redirect_uri,
            auth_endpoint: get("GOOGLE_AUTH_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_AUTH_ENDPOINT.to_string()),
            token_endpoint: get("GOOGLE_TOKEN_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string()),
            gmail_api_base: get("GMAIL_API_BASE")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GMAIL_API_BASE.to_string()),
        };

        debug!(
            "Gateway config: bind={} port={} client_url={}",
            bind_addr, port, client_url
        );

        Ok(Self {
            bind_addr,
            port,
            client_url,
            google,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn google_oauth_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".swipemail").join("google_oauth.json"))
}

fn read_google_oauth_config(path: &Path) -> Result<GoogleOAuthConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingCredentials(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CredentialsFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let config: GoogleOAuthConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::CredentialsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    if config.client_id.trim().is_empty() || config.client_secret.trim().is_empty() {
        return Err(ConfigError::MissingCredentials(path.display().to_string()));
    }

    Ok(config)
}
