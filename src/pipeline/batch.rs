//! Cross-preview analytics for one owner's review queue: summary counts,
//! pattern detection, and the safe auto-approve / bulk flows.
//!
//! Pattern detection is pure read-side work with no side effects.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::approval::{approve_preview, reject_preview};
use super::quality::TaskQualityScorer;
use crate::config;
use crate::db::repository::{
    get_parse_result_by_document, get_reviewable_previews, require_document,
};
use crate::db::DatabaseError;
use crate::models::enums::{DocumentType, PatternPriority, PreviewStatus};
use crate::models::Preview;

/// Totals within this relative difference count as duplicate-suspicious.
const DUPLICATE_TOTAL_TOLERANCE: f64 = 0.01;

/// Pending estimates at or above this count form a bulk-estimate pattern.
const BULK_ESTIMATE_MIN: usize = 5;

/// Same project name across at least this many previews.
const RECURRING_PROJECT_MIN: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub pending_review: usize,
    pub needs_clarification: usize,
    pub with_conflicts: usize,
    pub average_confidence: f64,
    pub auto_approve_eligible: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    PotentialDuplicate,
    RecurringProject,
    RepeatedCustomer,
    BulkEstimates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPattern {
    pub pattern_type: PatternType,
    pub priority: PatternPriority,
    pub description: String,
    pub preview_ids: Vec<Uuid>,
}

/// Aggregate view of the owner's reviewable previews.
pub fn batch_summary(conn: &Connection, owner_id: &Uuid) -> Result<BatchSummary, DatabaseError> {
    let previews = get_reviewable_previews(conn, owner_id)?;

    let mut confidence_sum = 0i64;
    let mut confidence_count = 0usize;
    let mut eligible = Vec::new();
    let mut with_conflicts = 0;
    let mut pending = 0;
    let mut clarification = 0;

    for preview in &previews {
        match preview.status {
            PreviewStatus::PendingReview => pending += 1,
            PreviewStatus::NeedsClarification => clarification += 1,
            _ => {}
        }
        if !preview.conflicts.is_empty() {
            with_conflicts += 1;
        }
        if preview.auto_approve_eligible {
            eligible.push(preview.id);
        }
        if let Some(parse) = get_parse_result_by_document(conn, &preview.document_id)? {
            confidence_sum += parse.confidence.overall;
            confidence_count += 1;
        }
    }

    Ok(BatchSummary {
        total: previews.len(),
        pending_review: pending,
        needs_clarification: clarification,
        with_conflicts,
        average_confidence: if confidence_count == 0 {
            0.0
        } else {
            confidence_sum as f64 / confidence_count as f64
        },
        auto_approve_eligible: eligible,
    })
}

/// Detect cross-preview patterns, sorted by priority (critical first).
pub fn detect_patterns(
    conn: &Connection,
    owner_id: &Uuid,
) -> Result<Vec<BatchPattern>, DatabaseError> {
    let previews = get_reviewable_previews(conn, owner_id)?;
    let mut patterns = Vec::new();

    detect_duplicates(&previews, &mut patterns);
    detect_recurring_projects(&previews, &mut patterns);
    detect_repeated_customers(&previews, &mut patterns);
    detect_bulk_estimates(conn, &previews, &mut patterns)?;

    // Stable sort keeps detection order within one priority level.
    patterns.sort_by(|a, b| b.priority.cmp(&a.priority));
    Ok(patterns)
}

fn normalized_name(preview: &Preview) -> String {
    preview
        .customer_data
        .display_name()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn detect_duplicates(previews: &[Preview], patterns: &mut Vec<BatchPattern>) {
    for (i, a) in previews.iter().enumerate() {
        for b in previews.iter().skip(i + 1) {
            let (total_a, total_b) = match (a.billing_data.total, b.billing_data.total) {
                (Some(x), Some(y)) if x > 0.0 && y > 0.0 => (x, y),
                _ => continue,
            };

            let relative = (total_a - total_b).abs() / total_a.max(total_b);
            if relative >= DUPLICATE_TOTAL_TOLERANCE {
                continue;
            }

            let (name_a, name_b) = (normalized_name(a), normalized_name(b));
            if name_a.is_empty() || name_b.is_empty() {
                continue;
            }
            if name_a.contains(&name_b) || name_b.contains(&name_a) {
                patterns.push(BatchPattern {
                    pattern_type: PatternType::PotentialDuplicate,
                    priority: PatternPriority::Critical,
                    description: format!(
                        "Possible duplicate: '{}' ({total_a:.2}) vs '{}' ({total_b:.2})",
                        a.customer_data.display_name(),
                        b.customer_data.display_name()
                    ),
                    preview_ids: vec![a.id, b.id],
                });
            }
        }
    }
}

fn detect_recurring_projects(previews: &[Preview], patterns: &mut Vec<BatchPattern>) {
    let mut by_project: std::collections::BTreeMap<String, Vec<Uuid>> = Default::default();
    for preview in previews {
        let name = preview
            .project_data
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty());
        if let Some(name) = name {
            by_project.entry(name).or_default().push(preview.id);
        }
    }

    for (name, ids) in by_project {
        if ids.len() >= RECURRING_PROJECT_MIN {
            patterns.push(BatchPattern {
                pattern_type: PatternType::RecurringProject,
                priority: PatternPriority::High,
                description: format!("Project '{name}' appears in {} pending documents", ids.len()),
                preview_ids: ids,
            });
        }
    }
}

fn detect_repeated_customers(previews: &[Preview], patterns: &mut Vec<BatchPattern>) {
    let mut by_customer: std::collections::BTreeMap<String, Vec<Uuid>> = Default::default();
    for preview in previews {
        let name = normalized_name(preview);
        if !name.is_empty() && name != "(unnamed)" {
            by_customer.entry(name).or_default().push(preview.id);
        }
    }

    for (name, ids) in by_customer {
        if ids.len() >= 2 {
            patterns.push(BatchPattern {
                pattern_type: PatternType::RepeatedCustomer,
                priority: PatternPriority::Medium,
                description: format!("Customer '{name}' appears in {} pending documents", ids.len()),
                preview_ids: ids,
            });
        }
    }
}

fn detect_bulk_estimates(
    conn: &Connection,
    previews: &[Preview],
    patterns: &mut Vec<BatchPattern>,
) -> Result<(), DatabaseError> {
    let mut estimate_ids = Vec::new();
    for preview in previews {
        let document = require_document(conn, &preview.document_id)?;
        if document.doc_type == DocumentType::Estimate {
            estimate_ids.push(preview.id);
        }
    }

    if estimate_ids.len() >= BULK_ESTIMATE_MIN {
        patterns.push(BatchPattern {
            pattern_type: PatternType::BulkEstimates,
            priority: PatternPriority::Low,
            description: format!("{} estimates awaiting review", estimate_ids.len()),
            preview_ids: estimate_ids,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BulkOutcome {
    pub processed: Vec<Uuid>,
    pub skipped: Vec<(Uuid, String)>,
}

/// Approve every preview that passes all safety gates: the eligibility
/// flag, task-quality >= 80, zero conflicts, and parse confidence at or
/// above `threshold` (default 90). Failures skip the preview, never abort
/// the batch.
pub fn auto_approve_safe_batch(
    conn: &mut Connection,
    owner_id: &Uuid,
    threshold: Option<i64>,
    scorer: &TaskQualityScorer,
) -> Result<BulkOutcome, DatabaseError> {
    let threshold = threshold.unwrap_or(config::DEFAULT_AUTO_APPROVE_CONFIDENCE);
    let previews = get_reviewable_previews(conn, owner_id)?;
    let mut outcome = BulkOutcome::default();

    for preview in previews {
        if !preview.auto_approve_eligible {
            outcome.skipped.push((preview.id, "not flagged eligible".into()));
            continue;
        }
        if !preview.conflicts.is_empty() {
            outcome.skipped.push((preview.id, "has conflicts".into()));
            continue;
        }

        let quality = scorer.score(&preview.tasks_data);
        if quality.value < config::AUTO_APPROVE_QUALITY {
            outcome
                .skipped
                .push((preview.id, format!("task quality {} below 80", quality.value)));
            continue;
        }

        let confidence = get_parse_result_by_document(conn, &preview.document_id)?
            .map(|p| p.confidence.overall)
            .unwrap_or(0);
        if confidence < threshold {
            outcome
                .skipped
                .push((preview.id, format!("confidence {confidence} below {threshold}")));
            continue;
        }

        match approve_preview(conn, &preview.id) {
            Ok(_) => outcome.processed.push(preview.id),
            Err(e) => outcome.skipped.push((preview.id, e.to_string())),
        }
    }

    tracing::info!(
        owner_id = %owner_id,
        approved = outcome.processed.len(),
        skipped = outcome.skipped.len(),
        "Safe auto-approve batch finished"
    );
    Ok(outcome)
}

/// Approve a caller-chosen set of previews; per-preview failures are
/// reported, not fatal.
pub fn bulk_approve(conn: &mut Connection, preview_ids: &[Uuid]) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    for id in preview_ids {
        match approve_preview(conn, id) {
            Ok(_) => outcome.processed.push(*id),
            Err(e) => outcome.skipped.push((*id, e.to_string())),
        }
    }
    outcome
}

pub fn bulk_reject(conn: &Connection, preview_ids: &[Uuid]) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();
    for id in preview_ids {
        match reject_preview(conn, id) {
            Ok(()) => outcome.processed.push(*id),
            Err(e) => outcome.skipped.push((*id, e.to_string())),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_document;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Document;
    use crate::pipeline::extraction::client::MockExtractionClient;
    use crate::pipeline::processor::IngestionPipeline;
    use serde_json::{json, Value};
    use std::io::Write;

    fn payload(doc_type: &str, customer: &str, total: f64, overall: i64) -> Value {
        json!({
            "document_type": doc_type,
            "language": "en",
            "confidence_scores": {"overall": overall, "customer": 90, "project": 70,
                                  "tasks": 85, "pricing": 90},
            "customer": {"name": customer, "email": null, "phone": "+33 1 02 03 04 05",
                         "company": null, "address": null},
            "project": {"name": "Maintenance contract", "description": null,
                        "start_date": null, "end_date": null},
            "tasks": [{"name": "Monthly maintenance", "description": "Preventive maintenance visit, full report",
                       "estimated_hours": 4.0, "actual_hours": null, "hourly_rate": 60.0,
                       "amount": 240.0, "category": null}],
            "invoice_or_estimate": {"number": null, "issue_date": "2026-07-01", "due_date": null,
                "valid_until": null, "subtotal": total, "tax_rate": 0.0, "tax_amount": 0.0,
                "total": total, "currency": "EUR"}
        })
    }

    fn stage(conn: &mut Connection, owner: Uuid, dir: &tempfile::TempDir, body: Value) -> Preview {
        let path = dir.path().join(format!("{}.pdf", Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let doc = Document::new(owner, path.to_str().unwrap());
        insert_document(conn, &doc).unwrap();
        IngestionPipeline::new(Box::new(MockExtractionClient::new(body)))
            .process_document(conn, &doc.id)
            .unwrap()
    }

    #[test]
    fn summary_aggregates_counts_and_confidence() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        stage(&mut conn, owner, &dir, payload("invoice", "Acme Corp", 1000.0, 92));
        stage(&mut conn, owner, &dir, payload("invoice", "Globex", 500.0, 80));

        let summary = batch_summary(&conn, &owner).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.pending_review, 2);
        assert_eq!(summary.needs_clarification, 0);
        assert!((summary.average_confidence - 86.0).abs() < 1e-9);
        assert_eq!(summary.auto_approve_eligible.len(), 1, "only the 92 qualifies");
    }

    #[test]
    fn duplicate_totals_and_overlapping_names_flag_critical() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        stage(&mut conn, owner, &dir, payload("invoice", "Acme Corp", 1000.00, 92));
        stage(&mut conn, owner, &dir, payload("invoice", "ACME Corp.", 1000.05, 92));

        let patterns = detect_patterns(&conn, &owner).unwrap();
        let duplicate = patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::PotentialDuplicate)
            .expect("duplicate pattern expected");
        assert_eq!(duplicate.priority, PatternPriority::Critical);
        assert_eq!(duplicate.preview_ids.len(), 2);
        // Critical patterns sort first.
        assert_eq!(patterns[0].pattern_type, PatternType::PotentialDuplicate);
    }

    #[test]
    fn distinct_totals_do_not_flag_duplicates() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        stage(&mut conn, owner, &dir, payload("invoice", "Acme Corp", 1000.0, 92));
        stage(&mut conn, owner, &dir, payload("invoice", "Acme Corp SA", 1300.0, 92));

        let patterns = detect_patterns(&conn, &owner).unwrap();
        assert!(patterns
            .iter()
            .all(|p| p.pattern_type != PatternType::PotentialDuplicate));
    }

    #[test]
    fn repeated_customer_and_recurring_project_detected() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        for total in [100.0, 700.0, 1500.0] {
            stage(&mut conn, owner, &dir, payload("invoice", "Globex", total, 85));
        }

        let patterns = detect_patterns(&conn, &owner).unwrap();
        assert!(patterns
            .iter()
            .any(|p| p.pattern_type == PatternType::RepeatedCustomer));
        let recurring = patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::RecurringProject)
            .expect("same project in 3 previews");
        assert_eq!(recurring.preview_ids.len(), 3);
        assert_eq!(recurring.priority, PatternPriority::High);
    }

    #[test]
    fn five_pending_estimates_form_bulk_pattern() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        for i in 0..5 {
            stage(
                &mut conn,
                owner,
                &dir,
                payload("estimate", &format!("Client {i}"), 100.0 + 200.0 * i as f64, 85),
            );
        }

        let patterns = detect_patterns(&conn, &owner).unwrap();
        let bulk = patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::BulkEstimates)
            .expect("bulk estimate pattern");
        assert_eq!(bulk.preview_ids.len(), 5);
    }

    #[test]
    fn auto_approve_respects_every_gate() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        let good = stage(&mut conn, owner, &dir, payload("invoice", "Acme Corp", 1000.0, 95));
        let low_confidence = stage(&mut conn, owner, &dir, payload("invoice", "Globex", 500.0, 80));

        let scorer = TaskQualityScorer::heuristic_only();
        let outcome = auto_approve_safe_batch(&mut conn, &owner, None, &scorer).unwrap();

        assert_eq!(outcome.processed, vec![good.id]);
        assert!(outcome.skipped.iter().any(|(id, _)| *id == low_confidence.id));

        let summary = batch_summary(&conn, &owner).unwrap();
        assert_eq!(summary.total, 1, "approved preview left the queue");
    }

    #[test]
    fn custom_threshold_overrides_default() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        stage(&mut conn, owner, &dir, payload("invoice", "Acme Corp", 1000.0, 95));

        let scorer = TaskQualityScorer::heuristic_only();
        let outcome = auto_approve_safe_batch(&mut conn, &owner, Some(96), &scorer).unwrap();
        assert!(outcome.processed.is_empty(), "95 < custom threshold 96");
    }

    #[test]
    fn bulk_reject_reports_already_terminal() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let dir = tempfile::tempdir().unwrap();

        let preview = stage(&mut conn, owner, &dir, payload("invoice", "Acme Corp", 1000.0, 92));
        let outcome = bulk_reject(&conn, &[preview.id]);
        assert_eq!(outcome.processed, vec![preview.id]);

        let again = bulk_reject(&conn, &[preview.id]);
        assert!(again.processed.is_empty());
        assert_eq!(again.skipped.len(), 1);
    }
}
