//! Model version lifecycle: training → evaluating → ready → active →
//! (archived | reactivated). The single-active invariant is enforced
//! under an activation lock plus an immediate transaction, on top of the
//! storage-level partial unique index.

use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TrainingError;
use crate::db::repository::{
    find_rollback_target, get_active_version, get_training_eligible, insert_model_version,
    next_version_label, require_model_version, update_model_version,
};
use crate::db::DatabaseError;
use crate::matching::similarity::ratio;
use crate::models::enums::{ModelStatus, UserRating};
use crate::models::ModelVersion;

/// Below this many held-out cases, evaluation reports an explicitly
/// estimated baseline instead of pretending to measure.
const MIN_EVAL_CASES: usize = 5;

const ESTIMATED_BASELINE_BEFORE: f64 = 70.0;
const ESTIMATED_BASELINE_AFTER: f64 = 75.0;

#[derive(Debug, Clone)]
pub enum JobStatus {
    Running,
    Succeeded { model_id: String },
    Failed { error: String },
}

/// The external fine-tuning service boundary.
pub trait TrainingJobClient {
    fn start_job(&self, training_file_ref: &str, base_model: &str)
        -> Result<String, TrainingError>;
    fn job_status(&self, job_ref: &str) -> Result<JobStatus, TrainingError>;
}

/// Outcome of an evaluation run. `estimated` is set when there were too
/// few held-out cases for a real measurement, never silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub accuracy_before: f64,
    pub accuracy_after: f64,
    pub test_cases: usize,
    pub estimated: bool,
}

#[derive(Default)]
pub struct ModelVersionManager {
    /// Serializes the whole check-and-set of activation and rollback so
    /// two concurrent activations can never both succeed.
    activation_lock: Mutex<()>,
}

impl ModelVersionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new version and submit its training job.
    pub fn start_training(
        &self,
        conn: &Connection,
        client: &dyn TrainingJobClient,
        training_file_ref: &str,
        base_model: &str,
    ) -> Result<ModelVersion, TrainingError> {
        let label = next_version_label(conn)?;
        let job_ref = client.start_job(training_file_ref, base_model)?;

        let mut version = ModelVersion::new(&label, base_model);
        version.training_file_ref = Some(training_file_ref.to_string());
        version.training_job_ref = Some(job_ref);
        insert_model_version(conn, &version)?;

        tracing::info!(version = %label, "Training started");
        Ok(version)
    }

    /// Poll the external job. Idempotent: versions past `training` are
    /// returned unchanged; a failed job moves the version to `failed`
    /// with the error recorded, and is never retried automatically.
    pub fn check_training_status(
        &self,
        conn: &Connection,
        client: &dyn TrainingJobClient,
        version_id: &Uuid,
    ) -> Result<ModelVersion, TrainingError> {
        let mut version = require_model_version(conn, version_id)?;
        if version.status != ModelStatus::Training {
            return Ok(version);
        }

        let job_ref = version
            .training_job_ref
            .clone()
            .ok_or_else(|| TrainingError::InvalidState {
                id: *version_id,
                expected: "training with a job reference".into(),
                actual: "training without a job reference".into(),
            })?;

        match client.job_status(&job_ref)? {
            JobStatus::Running => Ok(version),
            JobStatus::Succeeded { model_id } => {
                version.status = ModelStatus::Evaluating;
                version.fine_tuned_model = Some(model_id);
                update_model_version(conn, &version)?;
                tracing::info!(version = %version.version_label, "Training finished, evaluating");
                Ok(version)
            }
            JobStatus::Failed { error } => {
                version.status = ModelStatus::Failed;
                version.training_error = Some(error.clone());
                update_model_version(conn, &version)?;
                tracing::warn!(version = %version.version_label, error = %error, "Training failed");
                Ok(version)
            }
        }
    }

    /// Evaluate an `evaluating` version against held-out feedback and move
    /// it to `ready`.
    ///
    /// With fewer than five held-out cases the result is an estimated
    /// baseline, flagged as such in both the outcome and the stored
    /// improvements notes.
    pub fn evaluate_model(
        &self,
        conn: &Connection,
        version_id: &Uuid,
    ) -> Result<EvaluationOutcome, TrainingError> {
        let mut version = require_model_version(conn, version_id)?;
        if version.status != ModelStatus::Evaluating {
            return Err(TrainingError::InvalidState {
                id: *version_id,
                expected: ModelStatus::Evaluating.as_str().into(),
                actual: version.status.as_str().into(),
            });
        }

        let held_out = get_training_eligible(conn)?;
        let outcome = if held_out.len() < MIN_EVAL_CASES {
            EvaluationOutcome {
                accuracy_before: ESTIMATED_BASELINE_BEFORE,
                accuracy_after: ESTIMATED_BASELINE_AFTER,
                test_cases: held_out.len(),
                estimated: true,
            }
        } else {
            // Before: how close the shipped extraction was to the human
            // truth. After: quality implied by the reviewers' ratings.
            let mut similarity_sum = 0.0;
            let mut rating_sum = 0.0;
            for record in &held_out {
                let old = record
                    .original_data
                    .as_ref()
                    .map(value_text)
                    .unwrap_or_default();
                let new = record
                    .corrected_data
                    .as_ref()
                    .map(value_text)
                    .unwrap_or_default();
                similarity_sum += f64::from(ratio(&old, &new));
                rating_sum += rating_score(record.user_rating);
            }
            let n = held_out.len() as f64;
            EvaluationOutcome {
                accuracy_before: similarity_sum / n,
                accuracy_after: rating_sum / n,
                test_cases: held_out.len(),
                estimated: false,
            }
        };

        version.accuracy_before = Some(outcome.accuracy_before);
        version.accuracy_after = Some(outcome.accuracy_after);
        version.improvements = Some(serde_json::to_value(&outcome).map_err(DatabaseError::from)?);
        version.status = ModelStatus::Ready;
        update_model_version(conn, &version)?;

        tracing::info!(
            version = %version.version_label,
            accuracy_before = outcome.accuracy_before,
            accuracy_after = outcome.accuracy_after,
            estimated = outcome.estimated,
            "Evaluation complete, version ready"
        );
        Ok(outcome)
    }

    /// Activate a `ready` version.
    ///
    /// When another version is active and `force` is false, the candidate
    /// must strictly beat the active version's accuracy; otherwise the
    /// activation is rejected with no state change. The whole
    /// check-and-set runs under the activation lock and an immediate
    /// transaction.
    pub fn activate_model(
        &self,
        conn: &mut Connection,
        version_id: &Uuid,
        force: bool,
    ) -> Result<ModelVersion, TrainingError> {
        let _guard = self
            .activation_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DatabaseError::from)?;

        let mut candidate = require_model_version(&tx, version_id)?;
        if candidate.status != ModelStatus::Ready {
            return Err(TrainingError::InvalidState {
                id: *version_id,
                expected: ModelStatus::Ready.as_str().into(),
                actual: candidate.status.as_str().into(),
            });
        }

        if let Some(mut active) = get_active_version(&tx)? {
            if !force {
                let candidate_acc = candidate.accuracy_after.unwrap_or(0.0);
                let active_acc = active.accuracy_after.unwrap_or(0.0);
                if candidate_acc <= active_acc {
                    return Err(TrainingError::NotBetterThanActive {
                        candidate: candidate_acc,
                        active: active_acc,
                    });
                }
            }

            active.is_active = false;
            active.status = ModelStatus::Archived;
            active.deactivated_at = Some(Utc::now());
            update_model_version(&tx, &active)?;
        }

        candidate.is_active = true;
        candidate.status = ModelStatus::Active;
        candidate.activated_at = Some(Utc::now());
        update_model_version(&tx, &candidate)?;

        tx.commit().map_err(DatabaseError::from)?;
        tracing::info!(version = %candidate.version_label, force, "Model version activated");
        Ok(candidate)
    }

    /// Archive the active version (recording the reason) and activate the
    /// most recently created `ready` version older than it.
    pub fn rollback_to_previous(
        &self,
        conn: &mut Connection,
        reason: &str,
    ) -> Result<ModelVersion, TrainingError> {
        let _guard = self
            .activation_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DatabaseError::from)?;

        let mut active = get_active_version(&tx)?.ok_or(TrainingError::NoActiveVersion)?;
        let mut target = find_rollback_target(&tx, &active.created_at)?
            .ok_or(TrainingError::NoRollbackTarget)?;

        active.is_active = false;
        active.status = ModelStatus::Archived;
        active.deactivated_at = Some(Utc::now());
        active.rollback_reason = Some(reason.to_string());
        update_model_version(&tx, &active)?;

        target.is_active = true;
        target.status = ModelStatus::Active;
        if target.activated_at.is_none() {
            target.activated_at = Some(Utc::now());
        }
        target.reactivated_at = Some(Utc::now());
        update_model_version(&tx, &target)?;

        tx.commit().map_err(DatabaseError::from)?;
        tracing::warn!(
            from = %active.version_label,
            to = %target.version_label,
            reason,
            "Rolled back to previous model version"
        );
        Ok(target)
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn rating_score(rating: Option<UserRating>) -> f64 {
    match rating {
        Some(UserRating::Excellent) => 95.0,
        Some(UserRating::Good) => 85.0,
        Some(UserRating::NeedsImprovement) => 65.0,
        Some(UserRating::Poor) => 40.0,
        None => 0.0,
    }
}
