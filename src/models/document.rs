use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DocumentStatus, DocumentType, Language};
use crate::pipeline::extraction::types::ExtractedDocument;

/// An uploaded source document moving through the ingestion state machine.
/// Created on upload, mutated only by the ingestion pipeline and the
/// approval orchestrator, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub file_path: String,
    pub status: DocumentStatus,
    pub doc_type: DocumentType,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub processing_duration_seconds: Option<f64>,
}

impl Document {
    pub fn new(owner_id: Uuid, file_path: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            file_path: file_path.to_string(),
            status: DocumentStatus::Uploaded,
            doc_type: DocumentType::Unknown,
            uploaded_at: Utc::now(),
            processed_at: None,
            error_message: None,
            processing_duration_seconds: None,
        }
    }
}

/// The validated output of one extraction run. Exactly one per document;
/// re-parsing replaces the row (upsert keyed by document id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Raw boundary JSON, kept verbatim for audit and training context.
    pub raw_payload: serde_json::Value,
    pub extracted: ExtractedDocument,
    pub confidence: ConfidenceScores,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

/// The five per-section confidence scores reported by the boundary, 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfidenceScores {
    pub overall: i64,
    pub customer: i64,
    pub project: i64,
    pub tasks: i64,
    pub pricing: i64,
}

impl ConfidenceScores {
    pub fn all_in_range(&self) -> bool {
        [self.overall, self.customer, self.project, self.tasks, self.pricing]
            .iter()
            .all(|c| (0..=100).contains(c))
    }
}
