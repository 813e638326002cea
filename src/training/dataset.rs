//! Training data builder: aggregates unused, rated feedback into a
//! fine-tuning dataset once the minimum volume threshold is met.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::TrainingError;
use crate::config;
use crate::db::repository::{
    count_training_eligible, get_parse_result_by_document, get_preview_by_document,
    get_training_eligible, mark_used_for_training,
};
use crate::feedback::diff::set_value_at_path;

/// System prompt attached to every training example.
const SYSTEM_PROMPT: &str = "You extract structured data from invoices and estimates. \
Return the customer, project, task list, and billing fields exactly as JSON.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    pub document_id: Uuid,
    pub system_prompt: String,
    /// The raw extraction payload serves as the document context.
    pub document_text: String,
    /// The staged structure with every human correction applied.
    pub corrected_json: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub examples: Vec<TrainingExample>,
    /// Feedback records consumed into this dataset.
    pub feedback_count: usize,
    pub built_at: DateTime<Utc>,
}

/// Build a dataset from all eligible feedback (edited, rated, unused).
///
/// Fails fast with current vs. required counts below `min_count`
/// (default 50). On success the consumed records are marked used, so the
/// next build starts from fresh signal.
pub fn prepare_training_data(
    conn: &Connection,
    min_count: Option<i64>,
) -> Result<TrainingDataset, TrainingError> {
    let required_count = min_count.unwrap_or(config::MIN_TRAINING_FEEDBACK);
    let current_count = count_training_eligible(conn)?;

    if current_count < required_count {
        return Err(TrainingError::InsufficientFeedback {
            current_count,
            required_count,
        });
    }

    let records = get_training_eligible(conn)?;
    let mut by_document: BTreeMap<Uuid, Vec<&crate::models::FeedbackRecord>> = BTreeMap::new();
    let mut consumed = Vec::new();

    for record in &records {
        match record.document_id {
            Some(document_id) => {
                by_document.entry(document_id).or_default().push(record);
                consumed.push(record.id);
            }
            None => {
                tracing::debug!(feedback_id = %record.id, "Feedback without document ref skipped");
            }
        }
    }

    let mut examples = Vec::new();
    for (document_id, document_records) in &by_document {
        let base = match base_staged_value(conn, document_id)? {
            Some(base) => base,
            None => {
                tracing::warn!(
                    document_id = %document_id,
                    "No parse result or preview for feedback, skipping document"
                );
                continue;
            }
        };

        let mut corrected = base.0;
        for record in document_records {
            if let (Some(path), Some(new_value)) =
                (record.field_path.as_deref(), record.corrected_data.clone())
            {
                set_value_at_path(&mut corrected, path, new_value);
            }
        }

        examples.push(TrainingExample {
            document_id: *document_id,
            system_prompt: SYSTEM_PROMPT.to_string(),
            document_text: base.1,
            corrected_json: corrected,
        });
    }

    mark_used_for_training(conn, &consumed)?;

    tracing::info!(
        examples = examples.len(),
        feedback = consumed.len(),
        "Training dataset assembled"
    );

    Ok(TrainingDataset {
        examples,
        feedback_count: consumed.len(),
        built_at: Utc::now(),
    })
}

/// The base structure corrections are applied to, plus the document text.
/// Prefers the pristine parse result; falls back to the current preview.
fn base_staged_value(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Option<(Value, String)>, TrainingError> {
    if let Some(parse) = get_parse_result_by_document(conn, document_id)? {
        let base = serde_json::json!({
            "customer": parse.extracted.customer,
            "project": parse.extracted.project,
            "tasks": parse.extracted.tasks,
            "invoice_or_estimate": parse.extracted.invoice_or_estimate,
        });
        let text = serde_json::to_string_pretty(&parse.raw_payload)
            .map_err(crate::db::DatabaseError::from)?;
        return Ok(Some((base, text)));
    }

    if let Some(preview) = get_preview_by_document(conn, document_id)? {
        let base = preview.staged_value();
        let text = serde_json::to_string_pretty(&base).map_err(crate::db::DatabaseError::from)?;
        return Ok(Some((base, text)));
    }

    Ok(None)
}
