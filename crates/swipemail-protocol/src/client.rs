use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::types::{
    ActionResponse, AuthStatusResponse, AuthUrlResponse, DraftsResponse, ErrorResponse,
    FlagRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),
    #[error("request to gateway failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("gateway returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// HTTP client for the gateway's REST surface.
///
/// Keeps a cookie jar so the session issued by `/auth/google` is reused on
/// every later call.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /auth/google`: the consent URL to open in a browser.
    pub async fn auth_url(&self) -> Result<String, ApiError> {
        let resp: AuthUrlResponse = self.send(self.http.get(self.url(&["auth", "google"])?)).await?;
        Ok(resp.url)
    }

    pub async fn auth_status(&self) -> Result<bool, ApiError> {
        let resp: AuthStatusResponse =
            self.send(self.http.get(self.url(&["auth", "status"])?)).await?;
        Ok(resp.authenticated)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send(self.http.post(self.url(&["auth", "logout"])?))
            .await?;
        Ok(())
    }

    pub async fn list_drafts(&self) -> Result<DraftsResponse, ApiError> {
        self.send(self.http.get(self.url(&["api", "drafts"])?)).await
    }

    pub async fn send_draft(&self, draft_id: &str) -> Result<ActionResponse, ApiError> {
        let url = self.url(&["api", "drafts", draft_id, "send"])?;
        self.send(self.http.post(url)).await
    }

    pub async fn flag_draft(
        &self,
        draft_id: &str,
        request: &FlagRequest,
    ) -> Result<ActionResponse, ApiError> {
        let url = self.url(&["api", "drafts", draft_id, "flag"])?;
        self.send(self.http.post(url).json(request)).await
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated);
        }

        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}
