use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use crate::api::types::{AutoApproveRequest, BulkRequest, OwnerQuery};
use crate::api::{ApiError, AppState};
use crate::pipeline::batch::{
    auto_approve_safe_batch, batch_summary, bulk_approve as batch_bulk_approve,
    bulk_reject as batch_bulk_reject, detect_patterns, BatchPattern, BatchSummary, BulkOutcome,
};

/// GET /batch/summary?owner_id=...
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<BatchSummary>, ApiError> {
    let conn = state.conn();
    let summary = batch_summary(&conn, &query.owner_id).map_err(ApiError::from)?;
    Ok(Json(summary))
}

/// GET /batch/patterns?owner_id=...
pub async fn patterns(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<BatchPattern>>, ApiError> {
    let conn = state.conn();
    let patterns = detect_patterns(&conn, &query.owner_id).map_err(ApiError::from)?;
    Ok(Json(patterns))
}

/// POST /batch/approve: approve a chosen set, reporting per-preview
/// failures instead of aborting.
pub async fn bulk_approve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    let mut conn = state.conn();
    Ok(Json(batch_bulk_approve(&mut conn, &request.preview_ids)))
}

/// POST /batch/reject
pub async fn bulk_reject(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    let conn = state.conn();
    Ok(Json(batch_bulk_reject(&conn, &request.preview_ids)))
}

/// POST /batch/auto-approve: the gated safe batch.
pub async fn auto_approve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutoApproveRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    let mut conn = state.conn();
    let outcome = auto_approve_safe_batch(
        &mut conn,
        &request.owner_id,
        request.threshold,
        &state.quality,
    )
    .map_err(ApiError::from)?;
    Ok(Json(outcome))
}
