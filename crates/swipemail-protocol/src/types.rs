//! JSON bodies exchanged between the gateway and triage clients.

use serde::{Deserialize, Serialize};

/// A Gmail draft flattened for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftsResponse {
    pub drafts: Vec<DraftRecord>,
    /// Informational note, e.g. when the review label is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Result of a send or flag action.
///
/// Failures arrive as [`ErrorResponse`] with a 5xx status instead; `success`
/// is kept so clients can check it the way the browser front end does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of `POST /api/drafts/:id/flag`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_label_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_record_uses_camel_case_and_omits_missing_message_id() {
        let record = DraftRecord {
            id: "r-1".into(),
            message_id: None,
            to: "a@b.com".into(),
            subject: "Hi".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("messageId").is_none());
        assert_eq!(json["to"], "a@b.com");

        let with_id = DraftRecord {
            message_id: Some("m-1".into()),
            ..record
        };
        let json = serde_json::to_value(&with_id).unwrap();
        assert_eq!(json["messageId"], "m-1");
    }

    #[test]
    fn drafts_response_message_is_optional() {
        let empty = DraftsResponse::default();
        assert_eq!(serde_json::to_string(&empty).unwrap(), r#"{"drafts":[]}"#);

        let parsed: DraftsResponse =
            serde_json::from_str(r#"{"drafts":[],"message":"No label"}"#).unwrap();
        assert_eq!(parsed.message.as_deref(), Some("No label"));
    }

    #[test]
    fn flag_request_accepts_empty_body() {
        let req: FlagRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, FlagRequest::default());

        let req: FlagRequest = serde_json::from_str(r#"{"messageId":"m-9"}"#).unwrap();
        assert_eq!(req.message_id.as_deref(), Some("m-9"));
    }
}
