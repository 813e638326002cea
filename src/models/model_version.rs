use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ModelStatus;

/// One version in the extraction-model lifecycle:
/// training → evaluating → ready → active → (archived | reactivated).
///
/// Invariant: at most one version has `is_active = true` at any time.
/// All activation transitions go through the model version manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVersion {
    pub id: Uuid,
    pub version_label: String,
    pub base_model: String,
    pub status: ModelStatus,
    pub training_file_ref: Option<String>,
    pub training_job_ref: Option<String>,
    /// Model id produced by the training job, set once training succeeds.
    pub fine_tuned_model: Option<String>,
    pub accuracy_before: Option<f64>,
    pub accuracy_after: Option<f64>,
    /// Structured evaluation notes (test case count, estimated flag, ...).
    pub improvements: Option<serde_json::Value>,
    pub is_active: bool,
    pub training_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub reactivated_at: Option<DateTime<Utc>>,
    pub rollback_reason: Option<String>,
}

impl ModelVersion {
    pub fn new(version_label: &str, base_model: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            version_label: version_label.to_string(),
            base_model: base_model.to_string(),
            status: ModelStatus::Training,
            training_file_ref: None,
            training_job_ref: None,
            fine_tuned_model: None,
            accuracy_before: None,
            accuracy_after: None,
            improvements: None,
            is_active: false,
            training_error: None,
            created_at: Utc::now(),
            activated_at: None,
            deactivated_at: None,
            reactivated_at: None,
            rollback_reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_version_starts_training_inactive() {
        let version = ModelVersion::new("v3", "extraction-base-2");
        assert_eq!(version.status, ModelStatus::Training);
        assert!(!version.is_active);
        assert!(version.accuracy_after.is_none());
        assert!(version.training_job_ref.is_none());
    }
}
