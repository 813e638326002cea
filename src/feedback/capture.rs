//! Feedback capture: every human correction becomes a structured record,
//! every clean approval becomes a positive signal.

use rusqlite::Connection;
use serde_json::Value;
use uuid::Uuid;

use super::diff::{diff_values, DiffKind};
use crate::db::repository::insert_feedback;
use crate::db::DatabaseError;
use crate::matching::similarity::ratio;
use crate::models::enums::{EditMagnitude, FeedbackType, UserRating};
use crate::models::FeedbackRecord;

/// Clarity improvement thresholds for task-clarification ratings.
const CLARITY_EXCELLENT: i64 = 30;
const CLARITY_GOOD: i64 = 20;

/// Who edited what; attached to every record produced in one capture.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackContext {
    pub user_id: Uuid,
    pub document_id: Option<Uuid>,
    pub preview_id: Option<Uuid>,
    pub model_version_used: Option<Uuid>,
}

impl FeedbackContext {
    fn apply(&self, record: &mut FeedbackRecord) {
        record.document_id = self.document_id;
        record.preview_id = self.preview_id;
        record.model_version_used = self.model_version_used;
    }
}

/// Diff the original staged data against the reviewer's corrected version
/// and persist one record per changed leaf (manual_edit) or added key
/// (field_correction). Returns everything stored.
pub fn capture_manual_edits(
    conn: &Connection,
    ctx: &FeedbackContext,
    original: &Value,
    corrected: &Value,
) -> Result<Vec<FeedbackRecord>, DatabaseError> {
    let mut records = Vec::new();

    for entry in diff_values(original, corrected) {
        let (feedback_type, magnitude) = match entry.kind {
            DiffKind::Changed => (
                FeedbackType::ManualEdit,
                edit_magnitude(entry.old.as_ref(), entry.new.as_ref()),
            ),
            DiffKind::Added | DiffKind::Removed => {
                (FeedbackType::FieldCorrection, EditMagnitude::Moderate)
            }
        };

        let mut record = FeedbackRecord::new(ctx.user_id, feedback_type);
        ctx.apply(&mut record);
        record.field_path = Some(entry.path);
        record.original_data = entry.old;
        record.corrected_data = entry.new;
        record.edit_magnitude = magnitude;

        insert_feedback(conn, &record)?;
        records.push(record);
    }

    if !records.is_empty() {
        tracing::debug!(
            preview_id = ?ctx.preview_id,
            edits = records.len(),
            "Captured manual edits as feedback"
        );
    }
    Ok(records)
}

/// An unmodified approval is a strong positive signal: one
/// implicit_positive record rated excellent.
pub fn capture_approval_without_edits(
    conn: &Connection,
    ctx: &FeedbackContext,
) -> Result<FeedbackRecord, DatabaseError> {
    let mut record = FeedbackRecord::new(ctx.user_id, FeedbackType::ImplicitPositive);
    ctx.apply(&mut record);
    record.user_rating = Some(UserRating::Excellent);

    insert_feedback(conn, &record)?;
    Ok(record)
}

/// Record a task-clarification exchange and auto-rate it by how much the
/// clarity score improved.
#[allow(clippy::too_many_arguments)]
pub fn capture_task_clarification(
    conn: &Connection,
    ctx: &FeedbackContext,
    field_path: &str,
    original_text: &str,
    clarified_text: &str,
    original_clarity: i64,
    new_clarity: i64,
) -> Result<FeedbackRecord, DatabaseError> {
    let improvement = new_clarity - original_clarity;
    let rating = if improvement >= CLARITY_EXCELLENT {
        UserRating::Excellent
    } else if improvement >= CLARITY_GOOD {
        UserRating::Good
    } else {
        UserRating::NeedsImprovement
    };

    let mut record = FeedbackRecord::new(ctx.user_id, FeedbackType::TaskClarification);
    ctx.apply(&mut record);
    record.field_path = Some(field_path.to_string());
    record.original_data = Some(Value::String(original_text.to_string()));
    record.corrected_data = Some(Value::String(clarified_text.to_string()));
    record.edit_magnitude = edit_magnitude(
        record.original_data.as_ref(),
        record.corrected_data.as_ref(),
    );
    record.user_rating = Some(rating);

    insert_feedback(conn, &record)?;
    Ok(record)
}

/// Magnitude from old/new similarity: identical → none, > 90 → minor,
/// > 60 → moderate, else major. Non-string values compare via their JSON
/// serialization.
fn edit_magnitude(old: Option<&Value>, new: Option<&Value>) -> EditMagnitude {
    let (old, new) = match (old, new) {
        (Some(o), Some(n)) => (o, n),
        _ => return EditMagnitude::Moderate,
    };

    if old == new {
        return EditMagnitude::None;
    }

    let as_text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let similarity = ratio(&as_text(old), &as_text(new));
    if similarity > 90 {
        EditMagnitude::Minor
    } else if similarity > 60 {
        EditMagnitude::Moderate
    } else {
        EditMagnitude::Major
    }
}
