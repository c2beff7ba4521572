//! Gmail API v1 Client
//!
//! Provides the calls the triage flow needs:
//! - List and create labels
//! - List drafts, fetch full drafts, send drafts
//! - Modify message labels

use super::client::{GoogleApiError, GoogleClient};
use super::types::{
    Draft, DraftList, DraftRef, Label, LabelList, MessageRef, ModifyRequest, NewLabel,
    SendDraftRequest,
};
use tracing::{debug, info};

#[derive(Clone)]
pub struct GmailApi {
    client: GoogleClient,
    base: String,
}

impl GmailApi {
    /// Create a Gmail client rooted at `base` (e.g. `https://gmail.googleapis.com/gmail/v1`)
    pub fn new(client: GoogleClient, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.base, path)
    }

    /// List all labels (system and user)
    pub async fn list_labels(&self) -> Result<Vec<Label>, GoogleApiError> {
        info!("Listing Gmail labels");

        let response: LabelList = self.client.get(&self.url("labels"), &[]).await?;

        debug!("Retrieved {} labels", response.labels.len());
        Ok(response.labels)
    }

    /// Create a user label, shown in both the label list and message list
    pub async fn create_label(&self, name: &str) -> Result<Label, GoogleApiError> {
        info!("Creating Gmail label: {}", name);

        let body = NewLabel {
            name,
            label_list_visibility: "labelShow",
            message_list_visibility: "show",
        };
        self.client.post(&self.url("labels"), &body).await
    }

    /// List every draft id, across all pages
    pub async fn list_drafts(&self) -> Result<Vec<DraftRef>, GoogleApiError> {
        info!("Listing Gmail drafts");

        let drafts = self
            .client
            .get_paginated::<DraftList>(&self.url("drafts"), &[])
            .await?;

        debug!("Retrieved {} drafts", drafts.len());
        Ok(drafts)
    }

    /// Fetch a draft with its full message payload
    pub async fn get_draft(&self, id: &str) -> Result<Draft, GoogleApiError> {
        debug!("Fetching Gmail draft: {}", id);

        let url = self.url(&format!("drafts/{}", urlencoding::encode(id)));
        self.client
            .get(&url, &[("format", "full".to_string())])
            .await
    }

    /// Send an existing draft
    pub async fn send_draft(&self, id: &str) -> Result<MessageRef, GoogleApiError> {
        info!("Sending Gmail draft: {}", id);

        let sent: MessageRef = self
            .client
            .post(&self.url("drafts/send"), &SendDraftRequest { id })
            .await?;

        info!("Draft {} sent as message {:?}", id, sent.id);
        Ok(sent)
    }

    /// Add and remove labels on a message
    pub async fn modify_message(
        &self,
        message_id: &str,
        add_label_ids: Vec<String>,
        remove_label_ids: Vec<String>,
    ) -> Result<MessageRef, GoogleApiError> {
        info!("Modifying labels for message: {}", message_id);

        let body = ModifyRequest {
            add_label_ids,
            remove_label_ids,
        };
        let url = self.url(&format!("messages/{}/modify", urlencoding::encode(message_id)));
        self.client.post(&url, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gmail(server: &MockServer) -> GmailApi {
        let client = GoogleClient::new(Client::new(), "token".to_string());
        GmailApi::new(client, format!("{}/gmail/v1", server.uri()))
    }

    #[tokio::test]
    async fn get_draft_requests_full_format() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/drafts/r-1"))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "r-1",
                "message": { "id": "m-1", "labelIds": ["Label_7"], "snippet": "hey" }
            })))
            .mount(&server)
            .await;

        let draft = gmail(&server).get_draft("r-1").await.unwrap();
        let message = draft.message.unwrap();
        assert_eq!(message.id.as_deref(), Some("m-1"));
        assert_eq!(message.label_ids, vec!["Label_7".to_string()]);
    }

    #[tokio::test]
    async fn create_label_sets_visibility() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/labels"))
            .and(body_json(serde_json::json!({
                "name": "Flagged",
                "labelListVisibility": "labelShow",
                "messageListVisibility": "show"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "Label_9",
                "name": "Flagged",
                "type": "user"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let label = gmail(&server).create_label("Flagged").await.unwrap();
        assert_eq!(label.id, "Label_9");
        assert_eq!(label.kind.as_deref(), Some("user"));
    }

    #[tokio::test]
    async fn modify_sends_both_label_lists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/m-1/modify"))
            .and(body_json(serde_json::json!({
                "addLabelIds": ["Label_9", "STARRED"],
                "removeLabelIds": []
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "m-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        gmail(&server)
            .modify_message("m-1", vec!["Label_9".into(), "STARRED".into()], vec![])
            .await
            .unwrap();
    }
}
