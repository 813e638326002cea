use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PreviewEdit;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub owner_id: Uuid,
    /// Reference to the stored source file.
    pub file_path: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApproveResponse {
    pub message: String,
    pub preview_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EditPreviewRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub edit: PreviewEdit,
}

#[derive(Debug, Deserialize)]
pub struct ReviewActionRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub preview_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AutoApproveRequest {
    pub owner_id: Uuid,
    pub threshold: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    pub reason: String,
}
