//! Task matching, scoped to a resolved project: merge into an existing
//! task, create a new one, or skip nameless entries.

use uuid::Uuid;

use super::project::name_score;
use crate::models::TaskRecord;
use crate::pipeline::extraction::types::ExtractedTask;

/// >= this: merge into the best-matching existing task.
pub const TASK_MERGE: i64 = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMatchAction {
    Merge { existing_task_id: Uuid },
    CreateNew,
    Skip,
}

#[derive(Debug, Clone)]
pub struct TaskMatch {
    /// Index into the staged task list.
    pub task_index: usize,
    pub action: TaskMatchAction,
    pub confidence: i64,
}

/// Decide merge/create/skip for each staged task against the project's
/// existing tasks. Ties break to the first-seen existing task.
pub fn match_tasks(staged: &[ExtractedTask], existing: &[TaskRecord]) -> Vec<TaskMatch> {
    staged
        .iter()
        .enumerate()
        .map(|(index, task)| match_one(index, task, existing))
        .collect()
}

fn match_one(index: usize, task: &ExtractedTask, existing: &[TaskRecord]) -> TaskMatch {
    let name = match task.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n,
        None => {
            return TaskMatch {
                task_index: index,
                action: TaskMatchAction::Skip,
                confidence: 0,
            }
        }
    };

    let mut best: Option<(&TaskRecord, i64)> = None;
    for candidate in existing {
        let score = name_score(name, &candidate.name);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) if score >= TASK_MERGE => TaskMatch {
            task_index: index,
            action: TaskMatchAction::Merge {
                existing_task_id: candidate.id,
            },
            confidence: score,
        },
        Some((_, score)) => TaskMatch {
            task_index: index,
            action: TaskMatchAction::CreateNew,
            confidence: score,
        },
        None => TaskMatch {
            task_index: index,
            action: TaskMatchAction::CreateNew,
            confidence: 0,
        },
    }
}

/// Merge staged fields into an existing task: hours and amounts are
/// additive, the description is replaced only when the new one is longer.
pub fn apply_merge(existing: &mut TaskRecord, incoming: &ExtractedTask) {
    existing.estimated_hours = add_opt(existing.estimated_hours, incoming.estimated_hours);
    existing.actual_hours = add_opt(existing.actual_hours, incoming.actual_hours);
    existing.amount = add_opt(existing.amount, incoming.amount);

    if existing.hourly_rate.is_none() {
        existing.hourly_rate = incoming.hourly_rate;
    }

    if let Some(incoming_desc) = incoming.description.as_deref() {
        let longer = existing
            .description
            .as_deref()
            .map_or(true, |current| incoming_desc.len() > current.len());
        if longer {
            existing.description = Some(incoming_desc.to_string());
        }
    }
}

fn add_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (x, y) => Some(x.unwrap_or(0.0) + y.unwrap_or(0.0)),
    }
}
