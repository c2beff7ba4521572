//! Draft routes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use swipemail_protocol::{ActionResponse, DraftsResponse, FlagRequest};
use tracing::info;

use crate::api::session::AuthedSession;
use crate::api::AppState;
use crate::common::{AppError, AppResult};
use crate::drafts::{self, FlagTarget, FLAGGED_MESSAGE, SENT_MESSAGE};

const FETCH_FAILED: &str = "Failed to fetch drafts";
const SEND_FAILED: &str = "Failed to send draft";
const FLAG_FAILED: &str = "Failed to flag draft";

/// `GET /api/drafts`
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthedSession(session): AuthedSession,
) -> AppResult<Json<DraftsResponse>> {
    let gmail = state.gmail_for(&session, FETCH_FAILED).await?;
    let listing = drafts::list_review_drafts(&gmail)
        .await
        .map_err(|e| AppError::upstream(FETCH_FAILED, e))?;
    Ok(Json(listing))
}

/// `POST /api/drafts/:id/send`
pub async fn send(
    State(state): State<Arc<AppState>>,
    AuthedSession(session): AuthedSession,
    Path(id): Path<String>,
) -> AppResult<Json<ActionResponse>> {
    let gmail = state.gmail_for(&session, SEND_FAILED).await?;
    drafts::send_draft(&gmail, &id)
        .await
        .map_err(|e| AppError::upstream(SEND_FAILED, e))?;

    info!("Sent draft {}", id);
    Ok(Json(ActionResponse {
        success: true,
        message: SENT_MESSAGE.to_string(),
    }))
}

/// `POST /api/drafts/:id/flag`
///
/// The body is optional; without `messageId` the draft is fetched to find it.
pub async fn flag(
    State(state): State<Arc<AppState>>,
    AuthedSession(session): AuthedSession,
    Path(id): Path<String>,
    body: Option<Json<FlagRequest>>,
) -> AppResult<Json<ActionResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let target = FlagTarget {
        draft_id: id,
        message_id: request.message_id,
        review_label_id: request.review_label_id,
    };

    let gmail = state.gmail_for(&session, FLAG_FAILED).await?;
    drafts::flag_draft(&gmail, &session, &target)
        .await
        .map_err(|e| AppError::upstream(FLAG_FAILED, e))?;

    Ok(Json(ActionResponse {
        success: true,
        message: FLAGGED_MESSAGE.to_string(),
    }))
}
