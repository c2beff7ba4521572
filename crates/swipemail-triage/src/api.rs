//! Gateway calls the triage app depends on.

use async_trait::async_trait;
use swipemail_protocol::{ActionResponse, ApiClient, ApiError, DraftsResponse, FlagRequest};

#[async_trait]
pub trait TriageApi: Send + Sync {
    async fn auth_url(&self) -> Result<String, ApiError>;
    async fn auth_status(&self) -> Result<bool, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn list_drafts(&self) -> Result<DraftsResponse, ApiError>;
    async fn send_draft(&self, draft_id: &str) -> Result<ActionResponse, ApiError>;
    async fn flag_draft(
        &self,
        draft_id: &str,
        request: &FlagRequest,
    ) -> Result<ActionResponse, ApiError>;
}

#[async_trait]
impl TriageApi for ApiClient {
    async fn auth_url(&self) -> Result<String, ApiError> {
        ApiClient::auth_url(self).await
    }

    async fn auth_status(&self) -> Result<bool, ApiError> {
        ApiClient::auth_status(self).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        ApiClient::logout(self).await
    }

    async fn list_drafts(&self) -> Result<DraftsResponse, ApiError> {
        ApiClient::list_drafts(self).await
    }

    async fn send_draft(&self, draft_id: &str) -> Result<ActionResponse, ApiError> {
        ApiClient::send_draft(self, draft_id).await
    }

    async fn flag_draft(
        &self,
        draft_id: &str,
        request: &FlagRequest,
    ) -> Result<ActionResponse, ApiError> {
        ApiClient::flag_draft(self, draft_id, request).await
    }
}
