use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{EditMagnitude, FeedbackType, UserRating};

/// A captured human correction, used as future training signal.
/// Append-only except for the rating fields and `was_used_for_training`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Option<Uuid>,
    pub preview_id: Option<Uuid>,
    pub feedback_type: FeedbackType,
    pub original_data: Option<serde_json::Value>,
    pub corrected_data: Option<serde_json::Value>,
    /// Dot/bracket path of the corrected leaf, e.g. `tasks[0].name`.
    pub field_path: Option<String>,
    pub edit_magnitude: EditMagnitude,
    pub user_rating: Option<UserRating>,
    pub was_used_for_training: bool,
    pub model_version_used: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(user_id: Uuid, feedback_type: FeedbackType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            document_id: None,
            preview_id: None,
            feedback_type,
            original_data: None,
            corrected_data: None,
            field_path: None,
            edit_magnitude: EditMagnitude::None,
            user_rating: None,
            was_used_for_training: false,
            model_version_used: None,
            created_at: Utc::now(),
        }
    }

    /// Training-eligible: an actual edit, rated, and not yet consumed.
    pub fn is_training_eligible(&self) -> bool {
        self.feedback_type.is_edit() && self.user_rating.is_some() && !self.was_used_for_training
    }
}
