use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(DocumentStatus {
    Uploaded => "uploaded",
    Processing => "processing",
    Parsed => "parsed",
    Approved => "approved",
    Rejected => "rejected",
    Error => "error",
});

str_enum!(DocumentType {
    Invoice => "invoice",
    Estimate => "estimate",
    Unknown => "unknown",
});

str_enum!(Language {
    En => "en",
    Fr => "fr",
});

str_enum!(PreviewStatus {
    PendingReview => "pending_review",
    NeedsClarification => "needs_clarification",
    Approved => "approved",
    Rejected => "rejected",
});

impl PreviewStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

str_enum!(MatchAction {
    CreateNew => "create_new",
    UseExisting => "use_existing",
    Merge => "merge",
});

str_enum!(ProjectStatus {
    Active => "active",
    OnHold => "on_hold",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl ProjectStatus {
    /// Completed/cancelled projects should not silently receive new work.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

str_enum!(FeedbackType {
    TaskClarification => "task_clarification",
    ManualEdit => "manual_edit",
    FieldCorrection => "field_correction",
    ImplicitPositive => "implicit_positive",
});

impl FeedbackType {
    /// Whether this record represents a human edit (training-eligible).
    pub fn is_edit(&self) -> bool {
        !matches!(self, Self::ImplicitPositive)
    }
}

str_enum!(EditMagnitude {
    None => "none",
    Minor => "minor",
    Moderate => "moderate",
    Major => "major",
});

str_enum!(UserRating {
    Poor => "poor",
    NeedsImprovement => "needs_improvement",
    Good => "good",
    Excellent => "excellent",
});

str_enum!(ModelStatus {
    Training => "training",
    Evaluating => "evaluating",
    Ready => "ready",
    Active => "active",
    Archived => "archived",
    Failed => "failed",
});

/// Pattern priority, declared low-to-high so `Critical` sorts above `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl PatternPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn document_status_round_trip() {
        for (variant, s) in [
            (DocumentStatus::Uploaded, "uploaded"),
            (DocumentStatus::Processing, "processing"),
            (DocumentStatus::Parsed, "parsed"),
            (DocumentStatus::Approved, "approved"),
            (DocumentStatus::Rejected, "rejected"),
            (DocumentStatus::Error, "error"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(DocumentStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn match_action_round_trip() {
        for (variant, s) in [
            (MatchAction::CreateNew, "create_new"),
            (MatchAction::UseExisting, "use_existing"),
            (MatchAction::Merge, "merge"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(MatchAction::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn preview_status_terminality() {
        assert!(!PreviewStatus::PendingReview.is_terminal());
        assert!(!PreviewStatus::NeedsClarification.is_terminal());
        assert!(PreviewStatus::Approved.is_terminal());
        assert!(PreviewStatus::Rejected.is_terminal());
    }

    #[test]
    fn feedback_type_edit_classification() {
        assert!(FeedbackType::ManualEdit.is_edit());
        assert!(FeedbackType::FieldCorrection.is_edit());
        assert!(FeedbackType::TaskClarification.is_edit());
        assert!(!FeedbackType::ImplicitPositive.is_edit());
    }

    #[test]
    fn pattern_priority_ordering() {
        assert!(PatternPriority::Critical > PatternPriority::High);
        assert!(PatternPriority::High > PatternPriority::Medium);
        assert!(PatternPriority::Medium > PatternPriority::Low);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(DocumentStatus::from_str("invalid").is_err());
        assert!(ModelStatus::from_str("unknown").is_err());
        assert!(UserRating::from_str("").is_err());
    }
}
