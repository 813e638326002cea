pub mod dataset;
pub mod model_manager;

pub use dataset::*;
pub use model_manager::*;

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("Insufficient feedback: {current_count} of {required_count} required")]
    InsufficientFeedback {
        current_count: i64,
        required_count: i64,
    },

    #[error("Training job failed: {0}")]
    JobFailed(String),

    #[error("Model version {id} is not {expected} (found {actual})")]
    InvalidState {
        id: Uuid,
        expected: String,
        actual: String,
    },

    #[error("Activation rejected: candidate accuracy {candidate:.1}% does not beat active {active:.1}%")]
    NotBetterThanActive { candidate: f64, active: f64 },

    #[error("No active version to roll back from")]
    NoActiveVersion,

    #[error("No ready version available for rollback")]
    NoRollbackTarget,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
