//! Conflict and warning derivation for a staged preview.
//!
//! Conflicts are block-worthy findings surfaced to the reviewer but never
//! auto-fixed; warnings are informational.

use super::customer::CustomerMatch;
use super::project::ProjectMatch;
use super::similarity::normalize_phone;
use crate::models::enums::MatchAction;
use crate::models::{Customer, Project};
use crate::pipeline::extraction::types::ExtractedDocument;

/// Fuzzy score above which an unselected candidate is worth a warning.
const NEAR_MISS_WARNING: i64 = 50;

/// Relative budget deviation beyond which a conflict is raised.
const BUDGET_DEVIATION_LIMIT: f64 = 0.20;

/// Overall extraction confidence below which a warning is raised.
const LOW_CONFIDENCE_WARNING: i64 = 70;

#[derive(Debug, Clone, Default)]
pub struct ReviewFindings {
    pub conflicts: Vec<String>,
    pub warnings: Vec<String>,
}

/// Derive all conflicts and warnings for one extraction + match outcome.
pub fn detect(
    extracted: &ExtractedDocument,
    customer_match: &CustomerMatch,
    matched_customer: Option<&Customer>,
    project_match: &ProjectMatch,
    matched_project: Option<&Project>,
) -> ReviewFindings {
    let mut findings = ReviewFindings::default();

    detect_customer_conflicts(extracted, customer_match, matched_customer, &mut findings);
    detect_project_conflicts(extracted, project_match, matched_project, &mut findings);
    detect_warnings(extracted, customer_match, project_match, &mut findings);

    findings
}

fn detect_customer_conflicts(
    extracted: &ExtractedDocument,
    customer_match: &CustomerMatch,
    matched_customer: Option<&Customer>,
    findings: &mut ReviewFindings,
) {
    if customer_match.action != MatchAction::Merge {
        return;
    }
    let existing = match matched_customer {
        Some(c) => c,
        None => return,
    };

    if let (Some(new_email), Some(old_email)) =
        (extracted.customer.email.as_deref(), existing.email.as_deref())
    {
        if !new_email.trim().is_empty()
            && !old_email.trim().is_empty()
            && new_email.trim().to_lowercase() != old_email.trim().to_lowercase()
        {
            findings.conflicts.push(format!(
                "Email mismatch with matched customer '{}': document says '{}', record has '{}'",
                existing.name, new_email, old_email
            ));
        }
    }

    if let (Some(new_phone), Some(old_phone)) =
        (extracted.customer.phone.as_deref(), existing.phone.as_deref())
    {
        let (new_norm, old_norm) = (normalize_phone(new_phone), normalize_phone(old_phone));
        if !new_norm.is_empty() && !old_norm.is_empty() && new_norm != old_norm {
            findings.conflicts.push(format!(
                "Phone mismatch with matched customer '{}': document says '{}', record has '{}'",
                existing.name, new_phone, old_phone
            ));
        }
    }
}

fn detect_project_conflicts(
    extracted: &ExtractedDocument,
    project_match: &ProjectMatch,
    matched_project: Option<&Project>,
    findings: &mut ReviewFindings,
) {
    if project_match.action != MatchAction::UseExisting {
        return;
    }
    let project = match matched_project {
        Some(p) => p,
        None => return,
    };

    if project.status.is_terminal() {
        findings.conflicts.push(format!(
            "Project '{}' is {} and would be reused",
            project.name,
            project.status.as_str()
        ));
    }

    if let (Some(budget), Some(total)) = (project.budget, extracted.invoice_or_estimate.total) {
        if budget > 0.0 {
            let deviation = (total - budget).abs() / budget;
            if deviation > BUDGET_DEVIATION_LIMIT {
                findings.conflicts.push(format!(
                    "Document total {total:.2} deviates {:.0}% from project '{}' budget {budget:.2}",
                    deviation * 100.0,
                    project.name
                ));
            }
        }
    }
}

fn detect_warnings(
    extracted: &ExtractedDocument,
    customer_match: &CustomerMatch,
    project_match: &ProjectMatch,
    findings: &mut ReviewFindings,
) {
    if extracted.confidence_scores.overall < LOW_CONFIDENCE_WARNING {
        findings.warnings.push(format!(
            "Low extraction confidence: {}",
            extracted.confidence_scores.overall
        ));
    }

    let no_email = extracted
        .customer
        .email
        .as_deref()
        .map_or(true, |e| e.trim().is_empty());
    let no_phone = extracted
        .customer
        .phone
        .as_deref()
        .map_or(true, |p| p.trim().is_empty());
    if no_email && no_phone {
        findings
            .warnings
            .push("No contact method (email or phone) for the customer".to_string());
    }

    let without_estimate = extracted
        .tasks
        .iter()
        .filter(|t| t.has_name() && !t.has_time_estimate())
        .count();
    if without_estimate > 0 {
        findings.warnings.push(format!(
            "{without_estimate} task(s) have no time estimate"
        ));
    }

    if customer_match.action == MatchAction::CreateNew {
        if let Some(candidate) = &customer_match.best_fuzzy {
            if candidate.score > NEAR_MISS_WARNING {
                findings.warnings.push(format!(
                    "Creating a new customer although '{}' matched at {}",
                    candidate.name, candidate.score
                ));
            }
        }
    }

    if let Some(similar) = &project_match.similar_project_name {
        findings.warnings.push(format!(
            "A similar project exists: '{similar}' (score {})",
            project_match.confidence
        ));
    }
}
