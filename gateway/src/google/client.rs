//! Google API Authenticated HTTP Client
//!
//! Injects the session's OAuth access token into each request and maps
//! Google's REST error envelope onto [`GoogleApiError`].

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Rate limited by Google API")]
    RateLimited,
    #[error("Google API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse JSON response: {0}")]
    Decode(String),
    #[error("{0}")]
    Unexpected(String),
}

impl GoogleApiError {
    /// HTTP status reported by Google, if the call got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            GoogleApiError::Api { status, .. } => Some(*status),
            GoogleApiError::RateLimited => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            _ => None,
        }
    }
}

/// A list response that may continue on another page.
pub trait Page: DeserializeOwned {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

/// Google API HTTP client bound to one access token
#[derive(Clone)]
pub struct GoogleClient {
    client: Client,
    access_token: String,
}

impl GoogleClient {
    /// Wrap a shared reqwest client with an OAuth access token
    pub fn new(client: Client, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }

    /// Make an authenticated GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, GoogleApiError> {
        let builder = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token);

        self.execute_request(builder).await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, GoogleApiError> {
        let builder = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body);

        self.execute_request(builder).await
    }

    /// Follow `nextPageToken` until the list is exhausted
    pub async fn get_paginated<P: Page>(
        &self,
        url: &str,
        base_query: &[(&str, String)],
    ) -> Result<Vec<P::Item>, GoogleApiError> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = base_query.to_vec();
            if let Some(ref token) = page_token {
                query.push(("pageToken", token.clone()));
            }

            let page: P = self.get(url, &query).await?;
            let (items, next) = page.into_parts();
            all_items.extend(items);

            match next {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all_items)
    }

    /// Execute a request and handle Google API response patterns
    async fn execute_request<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, GoogleApiError> {
        let response = builder.send().await?;

        let status = response.status();
        debug!("Google API response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by Google API");
            return Err(GoogleApiError::RateLimited);
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = extract_error_message(&body, status);
            error!("Google API error {}: {}", status.as_u16(), message);
            return Err(GoogleApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Empty successful responses (e.g. modify with no fields requested)
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };

        serde_json::from_str(body).map_err(|e| GoogleApiError::Decode(e.to_string()))
    }
}

/// Extract the message from Google's error envelope:
/// `{"error": {"code": 400, "message": "...", "errors": [...]}}`
fn extract_error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|parsed| {
            parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| format!("HTTP {} error", status))
}
