//! Sessions
//!
//! Each client gets its own session holding at most one token set. Nothing
//! is persisted: sessions and pending logins live only in process memory.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::provider::google::{generate_code_verifier, random_token};
use super::provider::OAuthTokens;

/// How long a consent round-trip may take before its `state` is rejected.
pub const PENDING_LOGIN_TTL: Duration = Duration::from_secs(10 * 60);

/// OAuth credential bundle for one signed-in user.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[zeroize(skip)]
    pub token_type: String,
    #[zeroize(skip)]
    pub expiry: DateTime<Utc>,
    #[zeroize(skip)]
    pub scopes: Vec<String>,
}

impl TokenSet {
    /// True when the access token expires within `margin_secs`.
    pub fn is_expiring(&self, margin_secs: i64) -> bool {
        self.expiry - Utc::now() <= chrono::Duration::seconds(margin_secs)
    }
}

impl From<OAuthTokens> for TokenSet {
    fn from(t: OAuthTokens) -> Self {
        Self {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            token_type: t.token_type,
            expiry: t.expiry,
            scopes: t.scopes,
        }
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .field("scopes", &self.scopes)
            .finish()
    }
}

pub struct Session {
    id: String,
    tokens: RwLock<Option<TokenSet>>,
    /// Serializes label find-or-create for this session's flag actions.
    label_lock: Mutex<()>,
    /// Serializes token refreshes without blocking token readers.
    refresh_lock: Mutex<()>,
    created_at: Instant,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            tokens: RwLock::new(None),
            label_lock: Mutex::new(()),
            refresh_lock: Mutex::new(()),
            created_at: Instant::now(),
        }
    }

    /// Signed-out sessions older than [`PENDING_LOGIN_TTL`] can no longer
    /// complete a login. A session whose tokens are being written counts as
    /// signed in.
    fn is_idle_at(&self, now: Instant) -> bool {
        let signed_out = self
            .tokens
            .try_read()
            .map(|tokens| tokens.is_none())
            .unwrap_or(false);
        signed_out && now.saturating_duration_since(self.created_at) > PENDING_LOGIN_TTL
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Replace whatever token set the session held.
    pub async fn store_tokens(&self, tokens: TokenSet) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn clear_tokens(&self) {
        *self.tokens.write().await = None;
    }

    pub async fn tokens(&self) -> Option<TokenSet> {
        self.tokens.read().await.clone()
    }

    pub(crate) fn tokens_lock(&self) -> &RwLock<Option<TokenSet>> {
        &self.tokens
    }

    pub async fn lock_labels(&self) -> MutexGuard<'_, ()> {
        self.label_lock.lock().await
    }

    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

/// A consent round-trip in progress.
#[derive(Clone)]
pub struct PendingLogin {
    pub state: String,
    pub session_id: String,
    pub code_verifier: String,
    created_at: Instant,
}

impl PendingLogin {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > PENDING_LOGIN_TTL
    }
}

impl fmt::Debug for PendingLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLogin")
            .field("state", &self.state)
            .field("session_id", &self.session_id)
            .field("code_verifier", &"[REDACTED]")
            .finish()
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    pending: Mutex<HashMap<String, PendingLogin>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Return the session for `id`, or create a fresh one with a new id.
    pub async fn get_or_create(&self, id: Option<&str>) -> Arc<Session> {
        if let Some(id) = id {
            if let Some(existing) = self.get(id).await {
                return existing;
            }
        }

        let session = Arc::new(Session::new(random_token()));
        let mut sessions = self.sessions.write().await;
        prune_idle(&mut sessions, Instant::now());
        sessions.insert(session.id.clone(), Arc::clone(&session));
        debug!("Created session ({} live)", sessions.len());
        session
    }

    /// Drop sessions that never signed in and are past the login window.
    pub async fn prune_idle_at(&self, now: Instant) {
        prune_idle(&mut *self.sessions.write().await, now);
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.write().await.remove(id)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Register a new consent round-trip bound to `session_id`.
    pub async fn begin_login(&self, session_id: &str) -> PendingLogin {
        let login = PendingLogin {
            state: random_token(),
            session_id: session_id.to_string(),
            code_verifier: generate_code_verifier(),
            created_at: Instant::now(),
        };

        let mut pending = self.pending.lock().await;
        pending.retain(|_, p| !p.is_expired());
        pending.insert(login.state.clone(), login.clone());
        login
    }

    /// Consume the pending login for `state`. Each state works once.
    pub async fn take_login(&self, state: &str) -> Option<PendingLogin> {
        let login = self.pending.lock().await.remove(state)?;
        if login.is_expired() {
            debug!("Discarding expired login state");
            return None;
        }
        Some(login)
    }
}

fn prune_idle(sessions: &mut HashMap<String, Arc<Session>>, now: Instant) {
    let before = sessions.len();
    sessions.retain(|_, s| !s.is_idle_at(now));
    if sessions.len() < before {
        debug!("Pruned {} idle sessions", before - sessions.len());
    }
}
