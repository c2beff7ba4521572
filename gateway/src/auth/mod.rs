//! Auth Broker
//!
//! Runs the Google consent round-trip and hands out access tokens per
//! session. The OAuth `state` parameter binds each callback to the session
//! that asked for the consent URL, so the browser finishing consent and the
//! client that started it end up sharing one token set.

pub mod provider;
pub mod session;

use std::sync::Arc;

use tracing::{info, warn};

use self::provider::google::{generate_code_challenge, GoogleProvider};
use self::provider::{OAuthProvider, ProviderError};
use self::session::{Session, SessionStore, TokenSet};

/// Refresh access tokens that expire within this many seconds.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("unknown or expired login state")]
    UnknownState,
    #[error("authorization was declined: {0}")]
    Declined(String),
    #[error("token exchange failed: {0}")]
    Exchange(#[source] ProviderError),
    #[error("token refresh failed: {0}")]
    Refresh(String),
}

/// Result of starting a login.
#[derive(Debug, Clone)]
pub struct LoginStart {
    pub session_id: String,
    pub url: String,
}

pub struct AuthBroker {
    sessions: SessionStore,
    google: GoogleProvider,
}

impl AuthBroker {
    pub fn new(google: GoogleProvider) -> Self {
        info!("Auth broker initialized");
        Self {
            sessions: SessionStore::new(),
            google,
        }
    }

    /// Build the consent URL for the caller's session, creating the session
    /// if the caller has none.
    pub async fn initiate_login(&self, session_id: Option<&str>) -> LoginStart {
        let session = self.sessions.get_or_create(session_id).await;
        let login = self.sessions.begin_login(session.id()).await;
        let challenge = generate_code_challenge(&login.code_verifier);
        let url = self
            .google
            .authorize_url(&self.google.default_scopes(), &login.state, &challenge);

        info!("Issued {} consent URL", self.google.name());
        LoginStart {
            session_id: session.id().to_string(),
            url,
        }
    }

    /// Exchange `code` for tokens and store them on the session bound to
    /// `state`. Returns that session's id.
    pub async fn complete_login(&self, state: &str, code: &str) -> Result<String, AuthError> {
        let login = self
            .sessions
            .take_login(state)
            .await
            .ok_or(AuthError::UnknownState)?;

        let tokens = self
            .google
            .exchange_code(code, &login.code_verifier)
            .await
            .map_err(AuthError::Exchange)?;

        let session = self.sessions.get_or_create(Some(&login.session_id)).await;
        if session.id() != login.session_id {
            // Session was logged out mid-flow; the fresh one takes over.
            warn!("Login completed for a session that no longer exists");
        }
        session.store_tokens(TokenSet::from(tokens)).await;

        info!("Stored {} token set for session", self.google.name());
        Ok(session.id().to_string())
    }

    /// True iff the session currently holds a token set.
    pub async fn status(&self, session_id: Option<&str>) -> bool {
        match self.session(session_id).await {
            Some(session) => session.is_authenticated().await,
            None => false,
        }
    }

    /// Discard the session's token set and forget the session.
    pub async fn logout(&self, session_id: Option<&str>) {
        let Some(id) = session_id else {
            return;
        };
        if let Some(session) = self.sessions.remove(id).await {
            session.clear_tokens().await;
            info!("Session logged out");
        }
    }

    pub async fn session(&self, session_id: Option<&str>) -> Option<Arc<Session>> {
        self.sessions.get(session_id?).await
    }

    /// Session for `session_id` if it holds a token set.
    pub async fn authenticated_session(
        &self,
        session_id: Option<&str>,
    ) -> Result<Arc<Session>, AuthError> {
        let session = self
            .session(session_id)
            .await
            .ok_or(AuthError::NotAuthenticated)?;
        if !session.is_authenticated().await {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(session)
    }

    /// A usable access token for `session`, refreshed if close to expiry.
    ///
    /// The token lock is never held across the call to Google, so status
    /// checks and logout on the same session stay responsive while a refresh
    /// is in flight. Concurrent refreshes queue on the session's refresh lock.
    pub async fn access_token(&self, session: &Session) -> Result<String, AuthError> {
        if let Some(token) = current_token(session).await? {
            return Ok(token);
        }

        let _refreshing = session.lock_refresh().await;

        // Another request may have refreshed while we waited for the lock
        let (access_token, refresh_token, expired) = {
            let tokens = session.tokens_lock().read().await;
            let current = tokens.as_ref().ok_or(AuthError::NotAuthenticated)?;
            if !current.is_expiring(REFRESH_MARGIN_SECS) {
                return Ok(current.access_token.clone());
            }
            (
                current.access_token.clone(),
                current.refresh_token.clone(),
                current.is_expiring(0),
            )
        };

        let Some(refresh_token) = refresh_token else {
            if expired {
                return Err(AuthError::Refresh(
                    "access token expired and no refresh token was issued".to_string(),
                ));
            }
            return Ok(access_token);
        };

        match self.google.refresh_token(&refresh_token).await {
            Ok(fresh) => {
                let mut tokens = session.tokens_lock().write().await;
                // Logged out while the refresh was in flight
                let current = tokens.as_mut().ok_or(AuthError::NotAuthenticated)?;
                current.access_token = fresh.access_token.clone();
                if let Some(rt) = fresh.refresh_token.clone() {
                    current.refresh_token = Some(rt);
                }
                current.expiry = fresh.expiry;
                info!("Refreshed access token for session");
                Ok(current.access_token.clone())
            }
            Err(e) if !expired => {
                warn!("Token refresh failed but token not yet expired: {}", e);
                Ok(access_token)
            }
            Err(e) => Err(AuthError::Refresh(e.to_string())),
        }
    }
}

/// The session's access token, unless it is about to expire.
async fn current_token(session: &Session) -> Result<Option<String>, AuthError> {
    let tokens = session.tokens_lock().read().await;
    let current = tokens.as_ref().ok_or(AuthError::NotAuthenticated)?;
    Ok((!current.is_expiring(REFRESH_MARGIN_SECS)).then(|| current.access_token.clone()))
}
