//! Task-quality scoring: a deterministic, cost-free heuristic first, with
//! an optional AI advisor consulted only when the heuristic is
//! inconclusive. The two stages are independently testable.

use serde::{Deserialize, Serialize};

use super::extraction::ExtractionError;
use crate::pipeline::extraction::types::ExtractedTask;

/// Heuristic scores inside this band are inconclusive and defer to the
/// advisor when one is configured.
const INCONCLUSIVE_LOW: i64 = 40;
const INCONCLUSIVE_HIGH: i64 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualitySource {
    Heuristic,
    Advisor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityScore {
    pub value: i64,
    pub source: QualitySource,
}

/// External scoring boundary (an AI call in production, mocked in tests).
pub trait QualityAdvisor {
    fn score_tasks(&self, tasks: &[ExtractedTask]) -> Result<i64, ExtractionError>;
}

pub struct TaskQualityScorer {
    advisor: Option<Box<dyn QualityAdvisor + Send + Sync>>,
}

impl TaskQualityScorer {
    pub fn heuristic_only() -> Self {
        Self { advisor: None }
    }

    pub fn with_advisor(advisor: Box<dyn QualityAdvisor + Send + Sync>) -> Self {
        Self {
            advisor: Some(advisor),
        }
    }

    /// Score a staged task list 0–100.
    pub fn score(&self, tasks: &[ExtractedTask]) -> QualityScore {
        let heuristic = heuristic_score(tasks);

        if (INCONCLUSIVE_LOW..=INCONCLUSIVE_HIGH).contains(&heuristic) {
            if let Some(advisor) = &self.advisor {
                match advisor.score_tasks(tasks) {
                    Ok(value) => {
                        return QualityScore {
                            value: value.clamp(0, 100),
                            source: QualitySource::Advisor,
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Quality advisor failed, keeping heuristic score");
                    }
                }
            }
        }

        QualityScore {
            value: heuristic,
            source: QualitySource::Heuristic,
        }
    }
}

/// Deterministic stage: per-task points for a usable name, a time
/// estimate, pricing data, and a substantive description, averaged over
/// the list.
pub fn heuristic_score(tasks: &[ExtractedTask]) -> i64 {
    if tasks.is_empty() {
        return 0;
    }

    let total: i64 = tasks.iter().map(score_task).sum();
    total / tasks.len() as i64
}

fn score_task(task: &ExtractedTask) -> i64 {
    let mut score = 0;

    if task.has_name() {
        score += 40;
    }
    if task.has_time_estimate() {
        score += 25;
    }
    let priced = task.amount.is_some()
        || (task.hourly_rate.is_some() && (task.estimated_hours.is_some() || task.actual_hours.is_some()));
    if priced {
        score += 20;
    }
    if task.description.as_deref().is_some_and(|d| d.trim().len() >= 20) {
        score += 15;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedAdvisor {
        score: Option<i64>,
        calls: Arc<AtomicUsize>,
    }

    impl FixedAdvisor {
        fn new(score: i64) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Self { score: Some(score), calls: calls.clone() }, calls)
        }

        fn failing() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (Self { score: None, calls: calls.clone() }, calls)
        }
    }

    impl QualityAdvisor for FixedAdvisor {
        fn score_tasks(&self, _tasks: &[ExtractedTask]) -> Result<i64, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.score.ok_or(ExtractionError::Service {
                status: 503,
                body: "advisor unavailable".into(),
            })
        }
    }

    fn complete_task() -> ExtractedTask {
        ExtractedTask {
            name: Some("Peinture murale".into()),
            description: Some("Deux couches, finition satinée, murs + plafond".into()),
            estimated_hours: Some(8.0),
            actual_hours: None,
            hourly_rate: Some(45.0),
            amount: Some(360.0),
            category: None,
        }
    }

    fn sparse_task() -> ExtractedTask {
        ExtractedTask {
            name: Some("Divers".into()),
            ..Default::default()
        }
    }

    #[test]
    fn complete_tasks_score_full_marks() {
        assert_eq!(heuristic_score(&[complete_task()]), 100);
    }

    #[test]
    fn empty_list_scores_zero() {
        assert_eq!(heuristic_score(&[]), 0);
    }

    #[test]
    fn name_only_task_is_inconclusive() {
        let score = heuristic_score(&[sparse_task()]);
        assert_eq!(score, 40);
        assert!((INCONCLUSIVE_LOW..=INCONCLUSIVE_HIGH).contains(&score));
    }

    #[test]
    fn conclusive_score_never_consults_advisor() {
        let (advisor, calls) = FixedAdvisor::new(10);
        let scorer = TaskQualityScorer::with_advisor(Box::new(advisor));

        let result = scorer.score(&[complete_task()]);
        assert_eq!(result.value, 100);
        assert_eq!(result.source, QualitySource::Heuristic);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn inconclusive_score_defers_to_advisor() {
        let (advisor, calls) = FixedAdvisor::new(85);
        let scorer = TaskQualityScorer::with_advisor(Box::new(advisor));

        let result = scorer.score(&[sparse_task()]);
        assert_eq!(result.value, 85);
        assert_eq!(result.source, QualitySource::Advisor);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn advisor_failure_falls_back_to_heuristic() {
        let (advisor, _calls) = FixedAdvisor::failing();
        let scorer = TaskQualityScorer::with_advisor(Box::new(advisor));

        let result = scorer.score(&[sparse_task()]);
        assert_eq!(result.value, 40);
        assert_eq!(result.source, QualitySource::Heuristic);
    }

    #[test]
    fn without_advisor_inconclusive_stays_heuristic() {
        let scorer = TaskQualityScorer::heuristic_only();
        let result = scorer.score(&[sparse_task()]);
        assert_eq!(result.source, QualitySource::Heuristic);
        assert_eq!(result.value, 40);
    }
}
