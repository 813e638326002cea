//! Project matching, scoped to the already-matched customer.
//!
//! The score is the best of the three name-similarity strategies; ties go
//! to the first-seen project.

use uuid::Uuid;

use super::similarity::{partial_ratio, ratio, token_sort_ratio};
use crate::models::enums::MatchAction;
use crate::models::Project;

/// >= this: reuse the existing project and merge tasks into it.
pub const PROJECT_USE_EXISTING: i64 = 80;
/// >= this (but below use-existing): create new, with a warning naming the
/// similar project.
pub const PROJECT_WARN_SIMILAR: i64 = 60;

#[derive(Debug, Clone)]
pub struct ProjectMatch {
    pub project_id: Option<Uuid>,
    pub confidence: i64,
    pub action: MatchAction,
    /// Tasks get merged into the matched project rather than duplicated.
    pub should_upsert: bool,
    /// Set when a similar-but-not-reused project was found.
    pub similar_project_name: Option<String>,
}

impl ProjectMatch {
    pub fn create_new() -> Self {
        Self {
            project_id: None,
            confidence: 0,
            action: MatchAction::CreateNew,
            should_upsert: false,
            similar_project_name: None,
        }
    }
}

pub fn name_score(a: &str, b: &str) -> i64 {
    i64::from(
        ratio(a, b)
            .max(token_sort_ratio(a, b))
            .max(partial_ratio(a, b)),
    )
}

/// Match an extracted project name against the customer's projects.
pub fn match_project(extracted_name: Option<&str>, candidates: &[Project]) -> ProjectMatch {
    let name = match extracted_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n,
        None => return ProjectMatch::create_new(),
    };

    let mut best: Option<(&Project, i64)> = None;
    for candidate in candidates {
        let score = name_score(name, &candidate.name);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    let (project, score) = match best {
        Some(hit) => hit,
        None => return ProjectMatch::create_new(),
    };

    if score >= PROJECT_USE_EXISTING {
        ProjectMatch {
            project_id: Some(project.id),
            confidence: score,
            action: MatchAction::UseExisting,
            should_upsert: true,
            similar_project_name: None,
        }
    } else if score >= PROJECT_WARN_SIMILAR {
        ProjectMatch {
            project_id: None,
            confidence: score,
            action: MatchAction::CreateNew,
            should_upsert: false,
            similar_project_name: Some(project.name.clone()),
        }
    } else {
        ProjectMatch::create_new()
    }
}
