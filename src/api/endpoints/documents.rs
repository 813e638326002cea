use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::types::{MessageResponse, UploadRequest, UploadResponse};
use crate::api::{ApiError, AppState};
use crate::db::repository::{insert_document, require_document};
use crate::models::Document;
use crate::pipeline::dispatch::Job;
use crate::pipeline::processor::request_reparse;

/// POST /documents: register an uploaded file and schedule parsing.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if request.file_path.trim().is_empty() {
        return Err(ApiError::BadRequest("file_path is required".into()));
    }

    let document = Document::new(request.owner_id, &request.file_path);
    {
        let conn = state.conn();
        insert_document(&conn, &document).map_err(ApiError::from)?;
    }

    state.queue.enqueue(Job::ParseDocument {
        document_id: document.id,
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            document_id: document.id,
        }),
    ))
}

/// GET /documents/:id
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
    let conn = state.conn();
    let document = require_document(&conn, &id).map_err(ApiError::from)?;
    Ok(Json(document))
}

/// POST /documents/:id/reparse: reset to `uploaded` and re-enter the
/// pipeline. Idempotent under queue redelivery.
pub async fn reparse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    {
        let conn = state.conn();
        request_reparse(&conn, &id).map_err(ApiError::from)?;
    }
    state.queue.enqueue(Job::ParseDocument { document_id: id });

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "re-parse scheduled".into(),
        }),
    ))
}
