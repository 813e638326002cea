use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::types::{ActivateRequest, RollbackRequest};
use crate::api::{ApiError, AppState};
use crate::db::repository::list_model_versions;
use crate::models::ModelVersion;

/// GET /models
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ModelVersion>>, ApiError> {
    let conn = state.conn();
    let versions = list_model_versions(&conn).map_err(ApiError::from)?;
    Ok(Json(versions))
}

/// POST /models/:id/activate: the better-than-current gate is enforced
/// here on the server side; a worse candidate is rejected explicitly.
pub async fn activate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActivateRequest>,
) -> Result<Json<ModelVersion>, ApiError> {
    let mut conn = state.conn();
    let version = state
        .models
        .activate_model(&mut conn, &id, request.force)
        .map_err(ApiError::from)?;
    Ok(Json(version))
}

/// POST /models/rollback
pub async fn rollback(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RollbackRequest>,
) -> Result<Json<ModelVersion>, ApiError> {
    let mut conn = state.conn();
    let version = state
        .models
        .rollback_to_previous(&mut conn, &request.reason)
        .map_err(ApiError::from)?;
    Ok(Json(version))
}
