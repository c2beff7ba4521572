//! Draft triage operations
//!
//! Listing drafts carrying the review label, sending a draft, and flagging a
//! draft's message for manual follow-up. Each operation is a short sequence
//! of Gmail calls; nothing is cached between requests.

pub mod parse;

use std::sync::Arc;

use swipemail_protocol::{DraftRecord, DraftsResponse};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::auth::session::Session;
use crate::google::types::{Draft, Label};
use crate::google::{GmailApi, GoogleApiError};

pub use parse::parse_draft;

/// Label (matched case-insensitively) that selects drafts for triage.
pub const REVIEW_LABEL: &str = "review";
/// Label applied to drafts declined for sending.
pub const FLAGGED_LABEL: &str = "Flagged";
/// Gmail system label for starred messages.
pub const STARRED_LABEL: &str = "STARRED";

pub const MISSING_REVIEW_LABEL_MESSAGE: &str =
    "No \"Review\" label found. Please create a label named \"Review\" in Gmail.";
pub const SENT_MESSAGE: &str = "Email sent successfully!";
pub const FLAGGED_MESSAGE: &str = "Draft flagged for your review!";

/// Maximum concurrent draft fetches per listing.
const DRAFT_FETCH_CONCURRENCY: usize = 8;

/// Find a label by name, ignoring case.
pub fn find_label<'a>(labels: &'a [Label], name: &str) -> Option<&'a Label> {
    labels.iter().find(|l| l.name.eq_ignore_ascii_case(name))
}

pub async fn review_label_id(gmail: &GmailApi) -> Result<Option<String>, GoogleApiError> {
    let labels = gmail.list_labels().await?;
    Ok(find_label(&labels, REVIEW_LABEL).map(|l| l.id.clone()))
}

/// All drafts whose message carries the review label, in provider order.
pub async fn list_review_drafts(gmail: &GmailApi) -> Result<DraftsResponse, GoogleApiError> {
    let Some(review_id) = review_label_id(gmail).await? else {
        info!("No review label present; returning empty draft list");
        return Ok(DraftsResponse {
            drafts: Vec::new(),
            message: Some(MISSING_REVIEW_LABEL_MESSAGE.to_string()),
        });
    };

    let refs = gmail.list_drafts().await?;
    let ids: Vec<String> = refs.into_iter().map(|d| d.id).collect();
    let full = fetch_drafts(gmail, ids).await?;

    let drafts: Vec<DraftRecord> = full
        .iter()
        .filter(|d| {
            d.message
                .as_ref()
                .is_some_and(|m| m.label_ids.iter().any(|l| *l == review_id))
        })
        .map(parse_draft)
        .collect();

    info!("{} of {} drafts are awaiting review", drafts.len(), full.len());
    Ok(DraftsResponse {
        drafts,
        message: None,
    })
}

/// Fetch full drafts concurrently, preserving the order of `ids`.
/// The first failure aborts the remaining fetches.
async fn fetch_drafts(gmail: &GmailApi, ids: Vec<String>) -> Result<Vec<Draft>, GoogleApiError> {
    let limiter = Arc::new(Semaphore::new(DRAFT_FETCH_CONCURRENCY));
    let mut tasks = JoinSet::new();

    for (index, id) in ids.iter().cloned().enumerate() {
        let gmail = gmail.clone();
        let limiter = Arc::clone(&limiter);
        tasks.spawn(async move {
            let _permit = limiter
                .acquire_owned()
                .await
                .map_err(|e| GoogleApiError::Unexpected(e.to_string()))?;
            gmail.get_draft(&id).await.map(|draft| (index, draft))
        });
    }

    let mut slots: Vec<Option<Draft>> = vec![None; ids.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, draft) = joined.map_err(|e| GoogleApiError::Unexpected(e.to_string()))??;
        slots[index] = Some(draft);
    }

    debug!("Fetched {} full drafts", slots.len());
    Ok(slots.into_iter().flatten().collect())
}

pub async fn send_draft(gmail: &GmailApi, draft_id: &str) -> Result<(), GoogleApiError> {
    gmail.send_draft(draft_id).await?;
    Ok(())
}

/// What the client knows about the draft being flagged.
#[derive(Debug, Clone, Default)]
pub struct FlagTarget {
    pub draft_id: String,
    pub message_id: Option<String>,
    pub review_label_id: Option<String>,
}

/// Add {Flagged, STARRED} to the draft's message and drop the review label.
///
/// The Flagged label is found or created under the session's label lock.
/// The label changes are not atomic with respect to each other.
pub async fn flag_draft(
    gmail: &GmailApi,
    session: &Session,
    target: &FlagTarget,
) -> Result<(), GoogleApiError> {
    let (flagged_id, labels) = {
        let _guard = session.lock_labels().await;
        ensure_flagged_label(gmail).await?
    };

    let review_id = match &target.review_label_id {
        Some(id) => Some(id.clone()),
        None => find_label(&labels, REVIEW_LABEL).map(|l| l.id.clone()),
    };

    let message_id = match &target.message_id {
        Some(id) => id.clone(),
        None => {
            debug!("Resolving message id for draft {}", target.draft_id);
            gmail
                .get_draft(&target.draft_id)
                .await?
                .message
                .and_then(|m| m.id)
                .ok_or_else(|| {
                    GoogleApiError::Unexpected(format!(
                        "draft {} has no underlying message",
                        target.draft_id
                    ))
                })?
        }
    };

    gmail
        .modify_message(
            &message_id,
            vec![flagged_id, STARRED_LABEL.to_string()],
            review_id.into_iter().collect(),
        )
        .await?;

    info!("Flagged message {}", message_id);
    Ok(())
}

/// Id of the Flagged label, creating it if needed, plus the label list that
/// was consulted.
async fn ensure_flagged_label(gmail: &GmailApi) -> Result<(String, Vec<Label>), GoogleApiError> {
    let labels = gmail.list_labels().await?;
    if let Some(existing) = find_label(&labels, FLAGGED_LABEL) {
        return Ok((existing.id.clone(), labels));
    }

    match gmail.create_label(FLAGGED_LABEL).await {
        Ok(created) => {
            let mut labels = labels;
            let id = created.id.clone();
            labels.push(created);
            Ok((id, labels))
        }
        // Created elsewhere since we listed; use theirs
        Err(e) if e.status() == Some(409) => {
            warn!("Flagged label already exists, re-reading labels");
            let labels = gmail.list_labels().await?;
            let id = find_label(&labels, FLAGGED_LABEL)
                .map(|l| l.id.clone())
                .ok_or(e)?;
            Ok((id, labels))
        }
        Err(e) => Err(e),
    }
}
