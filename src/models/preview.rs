use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{MatchAction, PreviewStatus};
use crate::pipeline::extraction::types::{
    ExtractedBilling, ExtractedCustomer, ExtractedProject, ExtractedTask,
};

/// The mutable, human-reviewable staging record between extraction and
/// committed domain entities. Exactly one per document; re-parsing
/// replaces it (upsert keyed by document id).
///
/// The staged blobs start as a copy of the parse result and absorb human
/// edits until the preview reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub id: Uuid,
    pub document_id: Uuid,
    pub parse_result_id: Uuid,
    pub customer_data: ExtractedCustomer,
    pub project_data: Option<ExtractedProject>,
    pub tasks_data: Vec<ExtractedTask>,
    pub billing_data: ExtractedBilling,
    /// Weak reference to an existing customer (lookup only, no ownership).
    pub matched_customer_id: Option<Uuid>,
    pub matched_project_id: Option<Uuid>,
    pub customer_action: MatchAction,
    pub customer_confidence: i64,
    pub project_action: MatchAction,
    pub project_confidence: i64,
    pub conflicts: Vec<String>,
    pub warnings: Vec<String>,
    pub status: PreviewStatus,
    pub auto_approve_eligible: bool,
    pub created_customer_id: Option<Uuid>,
    pub created_project_id: Option<Uuid>,
    pub created_invoice_id: Option<Uuid>,
    pub created_estimate_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Preview {
    /// The staged blobs as one JSON structure, used by the feedback diff
    /// and as the base the training data builder applies corrections to.
    pub fn staged_value(&self) -> serde_json::Value {
        serde_json::json!({
            "customer": self.customer_data,
            "project": self.project_data,
            "tasks": self.tasks_data,
            "invoice_or_estimate": self.billing_data,
        })
    }
}

/// A partial edit submitted by a reviewer. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewEdit {
    pub customer_data: Option<ExtractedCustomer>,
    pub project_data: Option<ExtractedProject>,
    pub tasks_data: Option<Vec<ExtractedTask>>,
    pub billing_data: Option<ExtractedBilling>,
    pub needs_clarification: Option<bool>,
}

impl PreviewEdit {
    pub fn is_empty(&self) -> bool {
        self.customer_data.is_none()
            && self.project_data.is_none()
            && self.tasks_data.is_none()
            && self.billing_data.is_none()
            && self.needs_clarification.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_value_has_all_sections() {
        let preview = Preview {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            parse_result_id: Uuid::new_v4(),
            customer_data: ExtractedCustomer {
                name: Some("Jean Dupont".into()),
                ..Default::default()
            },
            project_data: None,
            tasks_data: vec![],
            billing_data: ExtractedBilling::default(),
            matched_customer_id: None,
            matched_project_id: None,
            customer_action: MatchAction::CreateNew,
            customer_confidence: 0,
            project_action: MatchAction::CreateNew,
            project_confidence: 0,
            conflicts: vec![],
            warnings: vec![],
            status: PreviewStatus::PendingReview,
            auto_approve_eligible: false,
            created_customer_id: None,
            created_project_id: None,
            created_invoice_id: None,
            created_estimate_id: None,
            reviewed_at: None,
        };

        let value = preview.staged_value();
        assert_eq!(value["customer"]["name"], "Jean Dupont");
        assert!(value["project"].is_null());
        assert!(value["tasks"].as_array().unwrap().is_empty());
        assert!(value.get("invoice_or_estimate").is_some());
    }

    #[test]
    fn empty_edit_detected() {
        assert!(PreviewEdit::default().is_empty());

        let edit = PreviewEdit {
            needs_clarification: Some(true),
            ..Default::default()
        };
        assert!(!edit.is_empty());
    }
}
