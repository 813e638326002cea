use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::types::{ApproveResponse, EditPreviewRequest, MessageResponse, ReviewActionRequest};
use crate::api::{ApiError, AppState};
use crate::db::repository::{
    get_active_version, preview_has_edit_feedback, require_preview, update_preview_staged,
    update_preview_status,
};
use crate::feedback::capture::{
    capture_approval_without_edits, capture_manual_edits, FeedbackContext,
};
use crate::models::enums::PreviewStatus;
use crate::models::Preview;
use crate::pipeline::approval::reject_preview;
use crate::pipeline::dispatch::Job;

/// GET /previews/:id
pub async fn get_preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Preview>, ApiError> {
    let conn = state.conn();
    let preview = require_preview(&conn, &id).map_err(ApiError::from)?;
    Ok(Json(preview))
}

/// PATCH /previews/:id: apply a partial edit to the staged data.
/// Every change is captured as feedback before the preview is updated.
pub async fn edit_preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<EditPreviewRequest>,
) -> Result<Json<Preview>, ApiError> {
    if request.edit.is_empty() {
        return Err(ApiError::BadRequest("empty edit".into()));
    }

    let conn = state.conn();
    let mut preview = require_preview(&conn, &id).map_err(ApiError::from)?;
    if preview.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "preview is {}",
            preview.status.as_str()
        )));
    }

    let original = preview.staged_value();

    if let Some(customer) = request.edit.customer_data {
        preview.customer_data = customer;
    }
    if let Some(project) = request.edit.project_data {
        preview.project_data = Some(project);
    }
    if let Some(tasks) = request.edit.tasks_data {
        preview.tasks_data = tasks;
    }
    if let Some(billing) = request.edit.billing_data {
        preview.billing_data = billing;
    }

    let corrected = preview.staged_value();
    let ctx = FeedbackContext {
        user_id: request.user_id,
        document_id: Some(preview.document_id),
        preview_id: Some(preview.id),
        model_version_used: get_active_version(&conn)
            .map_err(ApiError::from)?
            .map(|v| v.id),
    };
    capture_manual_edits(&conn, &ctx, &original, &corrected).map_err(ApiError::from)?;

    update_preview_staged(&conn, &preview).map_err(ApiError::from)?;

    if let Some(needs_clarification) = request.edit.needs_clarification {
        let status = if needs_clarification {
            PreviewStatus::NeedsClarification
        } else {
            PreviewStatus::PendingReview
        };
        update_preview_status(&conn, &id, status).map_err(ApiError::from)?;
        preview.status = status;
    }

    Ok(Json(preview))
}

/// POST /previews/:id/approve, 202-style: validates, records the
/// implicit-positive signal for unmodified approvals, then schedules the
/// transactional commit.
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewActionRequest>,
) -> Result<(StatusCode, Json<ApproveResponse>), ApiError> {
    {
        let conn = state.conn();
        let preview = require_preview(&conn, &id).map_err(ApiError::from)?;
        if preview.status.is_terminal() {
            return Err(ApiError::Conflict(format!(
                "preview is {}",
                preview.status.as_str()
            )));
        }

        if !preview_has_edit_feedback(&conn, &id).map_err(ApiError::from)? {
            let ctx = FeedbackContext {
                user_id: request.user_id,
                document_id: Some(preview.document_id),
                preview_id: Some(preview.id),
                model_version_used: get_active_version(&conn)
                    .map_err(ApiError::from)?
                    .map(|v| v.id),
            };
            capture_approval_without_edits(&conn, &ctx).map_err(ApiError::from)?;
        }
    }

    state.queue.enqueue(Job::ApprovePreview { preview_id: id });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApproveResponse {
            message: "approval scheduled".into(),
            preview_id: id,
        }),
    ))
}

/// POST /previews/:id/reject
pub async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(_request): Json<ReviewActionRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conn = state.conn();
    reject_preview(&conn, &id).map_err(ApiError::from)?;
    Ok(Json(MessageResponse {
        message: "preview rejected".into(),
    }))
}
