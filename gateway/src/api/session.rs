//! Session cookie handling
//!
//! The session id travels in an HttpOnly cookie. Handlers either take the
//! raw id ([`SessionCookie`]) or require a signed-in session
//! ([`AuthedSession`]), which rejects with 401 before the handler runs.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use swipemail_protocol::SESSION_COOKIE;

use super::AppState;
use crate::auth::session::Session;
use crate::common::{AppError, ErrorCode};

/// Value of the session cookie, if present.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

const COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; SameSite=Lax";

/// `Set-Cookie` value binding the client to `session_id`.
pub fn session_cookie(session_id: &str) -> Result<HeaderValue, AppError> {
    set_cookie(&format!(
        "{}={}; {}",
        SESSION_COOKIE, session_id, COOKIE_ATTRIBUTES
    ))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_session_cookie() -> Result<HeaderValue, AppError> {
    set_cookie(&format!(
        "{}=; {}; Max-Age=0",
        SESSION_COOKIE, COOKIE_ATTRIBUTES
    ))
}

fn set_cookie(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value).map_err(|e| {
        tracing::error!("Unusable session cookie value: {}", e);
        AppError::new(ErrorCode::InternalError, "Internal error")
    })
}

/// The caller's session id, which may be absent or stale.
#[derive(Debug, Clone, Default)]
pub struct SessionCookie(pub Option<String>);

impl SessionCookie {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_id(&parts.headers)))
    }
}

/// A session that holds a token set.
pub struct AuthedSession(pub Arc<Session>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthedSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = session_id(&parts.headers);
        state
            .auth
            .authenticated_session(id.as_deref())
            .await
            .map(AuthedSession)
            .map_err(|_| AppError::not_authenticated())
    }
}
