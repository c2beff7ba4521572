//! REST API for the triage client
//!
//! An axum router over shared [`AppState`]. Auth routes live under `/auth`,
//! draft routes under `/api` and require a signed-in session.

pub mod handlers;
pub mod server;
pub mod session;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::provider::google::GoogleProvider;
use crate::auth::session::Session;
use crate::auth::{AuthBroker, AuthError};
use crate::common::{create_http_client, AppError};
use crate::config::GatewayConfig;
use crate::google::{GmailApi, GoogleClient};

pub use server::{serve, ServeError};

/// State shared by every request.
pub struct AppState {
    pub config: GatewayConfig,
    pub auth: AuthBroker,
    /// Pooled client for all Google calls
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Arc<Self>, reqwest::Error> {
        let http = create_http_client()?;
        let auth = AuthBroker::new(GoogleProvider::new(&config.google, http.clone()));
        Ok(Arc::new(Self { config, auth, http }))
    }

    /// Gmail client authorized as `session`, refreshing its token if needed.
    ///
    /// Auth failures other than a missing token set surface as
    /// `failure_message`.
    pub async fn gmail_for(
        &self,
        session: &Session,
        failure_message: &str,
    ) -> Result<GmailApi, AppError> {
        let token = self
            .auth
            .access_token(session)
            .await
            .map_err(|e| match e {
                AuthError::NotAuthenticated => AppError::not_authenticated(),
                other => AppError::upstream(failure_message, other),
            })?;

        let client = GoogleClient::new(self.http.clone(), token);
        Ok(GmailApi::new(client, self.config.google.gmail_api_base.clone()))
    }
}

pub fn router(state: Arc<AppState>) -> Result<Router, ServeError> {
    let origin = HeaderValue::from_str(state.config.client_url.trim_end_matches('/'))
        .map_err(|_| ServeError::InvalidOrigin(state.config.client_url.clone()))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/google", get(handlers::auth::login))
        .route("/auth/google/callback", get(handlers::auth::callback))
        .route("/auth/status", get(handlers::auth::status))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/api/drafts", get(handlers::drafts::list))
        .route("/api/drafts/:id/send", post(handlers::drafts::send))
        .route("/api/drafts/:id/flag", post(handlers::drafts::flag))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}
