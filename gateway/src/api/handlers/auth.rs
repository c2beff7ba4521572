//! Auth routes

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use swipemail_protocol::{AuthStatusResponse, AuthUrlResponse, SuccessResponse};
use tracing::{error, info, warn};

use crate::api::session::{expired_session_cookie, session_cookie, SessionCookie};
use crate::api::AppState;
use crate::auth::AuthError;
use crate::common::AppResult;

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /auth/google`
pub async fn login(
    State(state): State<Arc<AppState>>,
    cookie: SessionCookie,
) -> AppResult<impl IntoResponse> {
    let start = state.auth.initiate_login(cookie.as_deref()).await;
    let set_cookie = session_cookie(&start.session_id)?;
    Ok(([(SET_COOKIE, set_cookie)], Json(AuthUrlResponse { url: start.url })))
}

/// `GET /auth/google/callback`
///
/// Always redirects to the client; the outcome is the `auth` query marker.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let target = |outcome: &str| {
        format!(
            "{}?auth={}",
            state.config.client_url.trim_end_matches('/'),
            outcome
        )
    };

    match complete(&state, params).await {
        Ok(session_id) => match session_cookie(&session_id) {
            Ok(cookie) => {
                info!("Google sign-in completed");
                ([(SET_COOKIE, cookie)], Redirect::to(&target("success"))).into_response()
            }
            Err(e) => {
                error!("Sign-in completed but cookie could not be set: {}", e);
                Redirect::to(&target("error")).into_response()
            }
        },
        Err(e) => {
            warn!("Google sign-in failed: {}", e);
            Redirect::to(&target("error")).into_response()
        }
    }
}

async fn complete(state: &AppState, params: CallbackParams) -> Result<String, AuthError> {
    if let Some(reason) = params.error {
        return Err(AuthError::Declined(reason));
    }
    let login_state = params.state.ok_or(AuthError::UnknownState)?;
    let code = params
        .code
        .ok_or_else(|| AuthError::Declined("no authorization code".to_string()))?;
    state.auth.complete_login(&login_state, &code).await
}

/// `GET /auth/status`
pub async fn status(
    State(state): State<Arc<AppState>>,
    cookie: SessionCookie,
) -> Json<AuthStatusResponse> {
    let authenticated = state.auth.status(cookie.as_deref()).await;
    Json(AuthStatusResponse { authenticated })
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookie: SessionCookie,
) -> AppResult<impl IntoResponse> {
    state.auth.logout(cookie.as_deref()).await;
    Ok((
        [(SET_COOKIE, expired_session_cookie()?)],
        Json(SuccessResponse { success: true }),
    ))
}
