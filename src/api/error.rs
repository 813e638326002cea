//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::pipeline::approval::ApprovalError;
use crate::pipeline::PipelineError;
use crate::training::TrainingError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail.clone()),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id}"))
            }
            DatabaseError::InvalidTransition { from, to } => {
                ApiError::Conflict(format!("invalid status transition {from} -> {to}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Database(db) => db.into(),
            PipelineError::Validation(violations) => {
                ApiError::BadRequest(format!("extraction invalid: {}", violations.join("; ")))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::NotReviewable { .. } => ApiError::Conflict(err.to_string()),
            ApprovalError::MissingTotal
            | ApprovalError::MissingMatchedCustomer(_)
            | ApprovalError::UnknownDocumentType(_) => ApiError::BadRequest(err.to_string()),
            ApprovalError::Database(db) => db.into(),
        }
    }
}

impl From<TrainingError> for ApiError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::InsufficientFeedback { .. }
            | TrainingError::NotBetterThanActive { .. }
            | TrainingError::NoRollbackTarget
            | TrainingError::NoActiveVersion
            | TrainingError::InvalidState { .. } => ApiError::Conflict(err.to_string()),
            TrainingError::JobFailed(message) => ApiError::BadRequest(message),
            TrainingError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn database_not_found_maps_to_404() {
        let err: ApiError = DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: Uuid::new_v4().to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn validation_failure_maps_to_400() {
        let err: ApiError = PipelineError::Validation(vec!["task list is empty".into()]).into();
        match err {
            ApiError::BadRequest(message) => assert!(message.contains("task list is empty")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn activation_rejection_maps_to_409() {
        let err: ApiError = TrainingError::NotBetterThanActive {
            candidate: 80.0,
            active: 85.0,
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
