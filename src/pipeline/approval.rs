//! Approval orchestrator: turns an approved preview into real domain
//! entities exactly once.
//!
//! The five steps (customer, project, tasks, invoice/estimate, status
//! flip) run inside a single immediate transaction. Any failure rolls the
//! whole operation back: no partial customer/project/task/invoice set is
//! ever observable, the preview returns to `pending_review`, the document
//! to `parsed`, and the caller may fix the staged data and retry.

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use uuid::Uuid;

use super::numbering::assign_document_number;
use super::templates::register_task_usage;
use crate::db::repository::{
    get_parse_result_by_document, get_projects_by_customer, get_tasks_by_project, insert_customer,
    insert_estimate, insert_invoice, insert_project, insert_task, require_customer,
    require_document, require_preview, require_project, set_preview_approved,
    set_preview_rejected, update_customer, update_document_status, update_preview_status,
    update_task,
};
use crate::db::DatabaseError;
use crate::matching::task::{apply_merge, match_tasks, TaskMatchAction};
use crate::models::enums::{DocumentStatus, DocumentType, MatchAction, PreviewStatus};
use crate::models::{Customer, Estimate, Invoice, Preview, Project, TaskRecord};

#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("Preview {id} is not reviewable (status {status})")]
    NotReviewable { id: Uuid, status: String },

    #[error("Preview requires a matched customer for action {0}")]
    MissingMatchedCustomer(String),

    #[error("Staged billing data has no numeric total")]
    MissingTotal,

    #[error("Document type must be invoice or estimate, got {0}")]
    UnknownDocumentType(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub preview_id: Uuid,
    pub customer_id: Uuid,
    pub project_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub estimate_id: Option<Uuid>,
    pub document_number: String,
    pub tasks_created: usize,
    pub tasks_merged: usize,
    pub tasks_skipped: usize,
}

/// Approve a staged preview, committing its entities transactionally.
pub fn approve_preview(
    conn: &mut Connection,
    preview_id: &Uuid,
) -> Result<ApprovalOutcome, ApprovalError> {
    let _span = tracing::info_span!("approve_preview", preview_id = %preview_id).entered();

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;

    match run_approval(&tx, preview_id) {
        Ok(outcome) => {
            tx.commit().map_err(DatabaseError::from)?;
            tracing::info!(
                preview_id = %preview_id,
                customer_id = %outcome.customer_id,
                project_id = %outcome.project_id,
                number = %outcome.document_number,
                created = outcome.tasks_created,
                merged = outcome.tasks_merged,
                skipped = outcome.tasks_skipped,
                "Preview approved"
            );
            Ok(outcome)
        }
        Err(e) => {
            drop(tx); // rolls the transaction back
            revert_after_failure(conn, preview_id);
            tracing::warn!(preview_id = %preview_id, error = %e, "Approval failed and was rolled back");
            Err(e)
        }
    }
}

/// Reject a staged preview. Terminal for both preview and document.
pub fn reject_preview(conn: &Connection, preview_id: &Uuid) -> Result<(), ApprovalError> {
    let preview = require_preview(conn, preview_id)?;
    if preview.status.is_terminal() {
        return Err(ApprovalError::NotReviewable {
            id: *preview_id,
            status: preview.status.as_str().into(),
        });
    }

    set_preview_rejected(conn, preview_id, Utc::now())?;
    update_document_status(conn, &preview.document_id, DocumentStatus::Rejected)?;
    tracing::info!(preview_id = %preview_id, "Preview rejected");
    Ok(())
}

fn run_approval(tx: &Connection, preview_id: &Uuid) -> Result<ApprovalOutcome, ApprovalError> {
    let preview = require_preview(tx, preview_id)?;
    if preview.status.is_terminal() {
        return Err(ApprovalError::NotReviewable {
            id: *preview_id,
            status: preview.status.as_str().into(),
        });
    }

    let document = require_document(tx, &preview.document_id)?;
    let owner_id = document.owner_id;

    // Step 1: resolve/create/merge the customer.
    let customer = resolve_customer(tx, &preview, owner_id)?;

    // Step 2: resolve/create the project.
    let project = resolve_project(tx, &preview, &customer)?;

    // Step 3: merge/create/skip each staged task.
    let weight = get_parse_result_by_document(tx, &document.id)?
        .map(|p| p.confidence.tasks as f64 / 100.0)
        .unwrap_or(0.5);
    let (tasks_created, tasks_merged, tasks_skipped) =
        commit_tasks(tx, &preview, &project, weight)?;

    // Step 4: create the invoice or estimate.
    let total = preview.billing_data.total.ok_or(ApprovalError::MissingTotal)?;
    let issue_date = parse_date(preview.billing_data.issue_date.as_deref());
    let number = assign_document_number(
        tx,
        &owner_id,
        document.doc_type,
        preview.billing_data.number.as_deref(),
        issue_date.unwrap_or_else(|| Utc::now().date_naive()),
    )?;

    let (invoice_id, estimate_id) = match document.doc_type {
        DocumentType::Invoice => {
            let invoice = Invoice {
                id: Uuid::new_v4(),
                owner_id,
                customer_id: customer.id,
                project_id: Some(project.id),
                number: number.clone(),
                issue_date,
                due_date: parse_date(preview.billing_data.due_date.as_deref()),
                subtotal: preview.billing_data.subtotal,
                tax_rate: preview.billing_data.tax_rate,
                tax_amount: preview.billing_data.tax_amount,
                total,
                currency: currency_or_default(&preview),
                created_at: Utc::now(),
            };
            insert_invoice(tx, &invoice)?;
            (Some(invoice.id), None)
        }
        DocumentType::Estimate => {
            let estimate = Estimate {
                id: Uuid::new_v4(),
                owner_id,
                customer_id: customer.id,
                project_id: Some(project.id),
                number: number.clone(),
                issue_date,
                valid_until: parse_date(preview.billing_data.valid_until.as_deref()),
                subtotal: preview.billing_data.subtotal,
                tax_rate: preview.billing_data.tax_rate,
                tax_amount: preview.billing_data.tax_amount,
                total,
                currency: currency_or_default(&preview),
                created_at: Utc::now(),
            };
            insert_estimate(tx, &estimate)?;
            (None, Some(estimate.id))
        }
        DocumentType::Unknown => {
            return Err(ApprovalError::UnknownDocumentType(
                document.doc_type.as_str().into(),
            ))
        }
    };

    // Step 5: flip document and preview to their terminal approved states.
    update_document_status(tx, &document.id, DocumentStatus::Approved)?;
    set_preview_approved(
        tx,
        preview_id,
        &customer.id,
        &project.id,
        invoice_id.as_ref(),
        estimate_id.as_ref(),
        Utc::now(),
    )?;

    Ok(ApprovalOutcome {
        preview_id: *preview_id,
        customer_id: customer.id,
        project_id: project.id,
        invoice_id,
        estimate_id,
        document_number: number,
        tasks_created,
        tasks_merged,
        tasks_skipped,
    })
}

fn resolve_customer(
    tx: &Connection,
    preview: &Preview,
    owner_id: Uuid,
) -> Result<Customer, ApprovalError> {
    match preview.customer_action {
        MatchAction::UseExisting => {
            let id = preview.matched_customer_id.ok_or_else(|| {
                ApprovalError::MissingMatchedCustomer("use_existing".into())
            })?;
            Ok(require_customer(tx, &id)?)
        }
        MatchAction::Merge => {
            let id = preview
                .matched_customer_id
                .ok_or_else(|| ApprovalError::MissingMatchedCustomer("merge".into()))?;
            let mut existing = require_customer(tx, &id)?;

            // Staged data fills gaps; existing values win, mismatches were
            // already surfaced as conflicts for the reviewer.
            let staged = &preview.customer_data;
            fill_missing(&mut existing.email, &staged.email);
            fill_missing(&mut existing.phone, &staged.phone);
            fill_missing(&mut existing.company, &staged.company);
            fill_missing(&mut existing.address, &staged.address);
            update_customer(tx, &existing)?;
            Ok(existing)
        }
        MatchAction::CreateNew => {
            let staged = &preview.customer_data;
            let mut customer = Customer::new(owner_id, staged.display_name());
            customer.company = staged.company.clone();
            customer.email = staged.email.clone();
            customer.phone = staged.phone.clone();
            customer.address = staged.address.clone();
            insert_customer(tx, &customer)?;
            Ok(customer)
        }
    }
}

fn resolve_project(
    tx: &Connection,
    preview: &Preview,
    customer: &Customer,
) -> Result<Project, ApprovalError> {
    match preview.project_action {
        MatchAction::UseExisting => {
            let id = preview.matched_project_id.ok_or_else(|| {
                ApprovalError::MissingMatchedCustomer("use_existing project".into())
            })?;
            Ok(require_project(tx, &id)?)
        }
        MatchAction::Merge => {
            // Merging reuses the customer's only project when unambiguous.
            let mut projects = get_projects_by_customer(tx, &customer.id)?;
            if projects.len() == 1 {
                return Ok(projects.remove(0));
            }
            create_project(tx, preview, customer)
        }
        MatchAction::CreateNew => create_project(tx, preview, customer),
    }
}

fn create_project(
    tx: &Connection,
    preview: &Preview,
    customer: &Customer,
) -> Result<Project, ApprovalError> {
    let staged = preview.project_data.as_ref();
    let name = staged
        .and_then(|p| p.name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} project", customer.name));

    let mut project = Project::new(customer.owner_id, customer.id, &name);
    project.description = staged.and_then(|p| p.description.clone());
    project.start_date = parse_date(staged.and_then(|p| p.start_date.as_deref()));
    project.end_date = parse_date(staged.and_then(|p| p.end_date.as_deref()));
    project.budget = preview.billing_data.total;
    insert_project(tx, &project)?;
    Ok(project)
}

fn commit_tasks(
    tx: &Connection,
    preview: &Preview,
    project: &Project,
    weight: f64,
) -> Result<(usize, usize, usize), ApprovalError> {
    let existing = get_tasks_by_project(tx, &project.id)?;
    let matches = match_tasks(&preview.tasks_data, &existing);

    let mut created = 0;
    let mut merged = 0;
    let mut skipped = 0;

    for task_match in &matches {
        let staged = &preview.tasks_data[task_match.task_index];
        match &task_match.action {
            TaskMatchAction::Merge { existing_task_id } => {
                let mut task = existing
                    .iter()
                    .find(|t| t.id == *existing_task_id)
                    .cloned()
                    .ok_or_else(|| DatabaseError::NotFound {
                        entity_type: "Task".into(),
                        id: existing_task_id.to_string(),
                    })?;
                apply_merge(&mut task, staged);
                update_task(tx, &task)?;
                merged += 1;
            }
            TaskMatchAction::CreateNew => {
                let name = staged.name.as_deref().unwrap_or_default().trim().to_string();
                let mut task = TaskRecord::new(project.id, &name);
                task.description = staged.description.clone();
                task.estimated_hours = staged.estimated_hours;
                task.actual_hours = staged.actual_hours;
                task.hourly_rate = staged.hourly_rate;
                task.amount = staged.amount;
                task.category = staged
                    .category
                    .clone()
                    .or_else(|| super::templates::categorize_task(&name, staged.description.as_deref()));
                insert_task(tx, &task)?;
                register_task_usage(tx, &project.owner_id, &task, weight)?;
                created += 1;
            }
            TaskMatchAction::Skip => {
                tracing::debug!(
                    preview_id = %preview.id,
                    index = task_match.task_index,
                    "Skipping nameless staged task"
                );
                skipped += 1;
            }
        }
    }

    Ok((created, merged, skipped))
}

/// Best-effort restore after a rolled-back approval. The transaction
/// rollback already discarded all writes; this pins the reviewable state
/// back explicitly so a retry is always possible.
fn revert_after_failure(conn: &Connection, preview_id: &Uuid) {
    let preview = match require_preview(conn, preview_id) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(preview_id = %preview_id, error = %e, "Cannot load preview for revert");
            return;
        }
    };

    if !preview.status.is_terminal() {
        if let Err(e) = update_preview_status(conn, preview_id, PreviewStatus::PendingReview) {
            tracing::warn!(preview_id = %preview_id, error = %e, "Preview revert failed");
        }
    }
    if let Err(e) = update_document_status(conn, &preview.document_id, DocumentStatus::Parsed) {
        tracing::warn!(preview_id = %preview_id, error = %e, "Document revert failed");
    }
}

fn fill_missing(slot: &mut Option<String>, staged: &Option<String>) {
    let empty = slot.as_deref().map_or(true, |v| v.trim().is_empty());
    if empty {
        if let Some(value) = staged.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            *slot = Some(value.to_string());
        }
    }
}

fn parse_date(s: Option<&str>) -> Option<NaiveDate> {
    s.and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
}

fn currency_or_default(preview: &Preview) -> String {
    preview
        .billing_data
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "EUR".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{
        get_customer, get_document, get_preview, get_tasks_by_project, get_template_by_name,
        insert_customer as repo_insert_customer, insert_document,
    };
    use crate::db::sqlite::open_memory_database;
    use crate::models::Document;
    use crate::pipeline::extraction::client::MockExtractionClient;
    use crate::pipeline::processor::IngestionPipeline;
    use serde_json::{json, Value};
    use std::io::Write;

    fn payload(doc_type: &str) -> Value {
        json!({
            "document_type": doc_type,
            "language": "fr",
            "confidence_scores": {"overall": 92, "customer": 95, "project": 70, "tasks": 85, "pricing": 90},
            "customer": {"name": "Jean Dupont", "email": "jean@example.fr", "phone": "+33 6 12 34 56 78",
                         "company": null, "address": "12 rue des Lilas, Lyon"},
            "project": {"name": "Rénovation cuisine", "description": "Rénovation complète",
                        "start_date": "2026-05-01", "end_date": null},
            "tasks": [
                {"name": "Peinture", "description": "Deux couches", "estimated_hours": 4.0,
                 "actual_hours": null, "hourly_rate": 45.0, "amount": 180.0, "category": null},
                {"name": "", "description": null, "estimated_hours": null,
                 "actual_hours": null, "hourly_rate": null, "amount": null, "category": null}
            ],
            "invoice_or_estimate": {"number": "FAC-2026-042", "issue_date": "2026-06-15",
                "due_date": "2026-07-15", "valid_until": "2026-09-30", "subtotal": 180.0,
                "tax_rate": 20.0, "tax_amount": 36.0, "total": 216.0, "currency": "EUR"}
        })
    }

    /// Upload + parse a document with the given payload, returning the
    /// staged preview ready for approval.
    fn staged(
        conn: &mut Connection,
        owner_id: Uuid,
        payload: Value,
    ) -> (tempfile::TempDir, Document, Preview) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let doc = Document::new(owner_id, path.to_str().unwrap());
        insert_document(conn, &doc).unwrap();

        let pipeline = IngestionPipeline::new(Box::new(MockExtractionClient::new(payload)));
        let preview = pipeline.process_document(conn, &doc.id).unwrap();
        (dir, doc, preview)
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn approval_creates_full_entity_set() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();
        let (_dir, doc, preview) = staged(&mut conn, owner, payload("invoice"));

        let outcome = approve_preview(&mut conn, &preview.id).unwrap();

        assert_eq!(outcome.document_number, "FAC-2026-042");
        assert_eq!(outcome.tasks_created, 1);
        assert_eq!(outcome.tasks_skipped, 1, "nameless task is skipped");
        assert!(outcome.invoice_id.is_some());
        assert!(outcome.estimate_id.is_none());

        assert_eq!(count(&conn, "customers"), 1);
        assert_eq!(count(&conn, "projects"), 1);
        assert_eq!(count(&conn, "tasks"), 1);
        assert_eq!(count(&conn, "invoices"), 1);

        let document = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Approved);

        let approved = get_preview(&conn, &preview.id).unwrap().unwrap();
        assert_eq!(approved.status, PreviewStatus::Approved);
        assert!(approved.reviewed_at.is_some());
        assert_eq!(approved.created_customer_id, Some(outcome.customer_id));
        assert_eq!(approved.created_invoice_id, outcome.invoice_id);

        // The created customer carries the staged contact data.
        let customer = get_customer(&conn, &outcome.customer_id).unwrap().unwrap();
        assert_eq!(customer.name, "Jean Dupont");
        assert_eq!(customer.email.as_deref(), Some("jean@example.fr"));

        // Template library learned the new task.
        let template = get_template_by_name(&conn, &owner, "Peinture").unwrap();
        assert!(template.is_some());
        assert_eq!(template.unwrap().category.as_deref(), Some("painting"));
    }

    #[test]
    fn estimate_document_creates_estimate() {
        let mut conn = open_memory_database().unwrap();
        let (_dir, _doc, preview) = staged(&mut conn, Uuid::new_v4(), payload("estimate"));

        let outcome = approve_preview(&mut conn, &preview.id).unwrap();
        assert!(outcome.invoice_id.is_none());
        assert!(outcome.estimate_id.is_some());
        assert_eq!(count(&conn, "estimates"), 1);
        assert_eq!(count(&conn, "invoices"), 0);
    }

    #[test]
    fn approval_is_atomic_on_late_failure() {
        let mut conn = open_memory_database().unwrap();
        let (_dir, doc, preview) = staged(&mut conn, Uuid::new_v4(), payload("invoice"));

        // Clear the staged total: steps 1-3 will run, step 4 must fail.
        conn.execute(
            "UPDATE previews SET billing_data = json_set(billing_data, '$.total', json('null'))
             WHERE id = ?1",
            rusqlite::params![preview.id.to_string()],
        )
        .unwrap();

        let result = approve_preview(&mut conn, &preview.id);
        assert!(matches!(result, Err(ApprovalError::MissingTotal)));

        // Nothing leaked out of the rolled-back transaction.
        assert_eq!(count(&conn, "customers"), 0);
        assert_eq!(count(&conn, "projects"), 0);
        assert_eq!(count(&conn, "tasks"), 0);
        assert_eq!(count(&conn, "invoices"), 0);
        assert_eq!(count(&conn, "task_templates"), 0);

        let reverted = get_preview(&conn, &preview.id).unwrap().unwrap();
        assert_eq!(reverted.status, PreviewStatus::PendingReview);
        let document = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Parsed);
    }

    #[test]
    fn failed_approval_can_be_retried_after_fixing() {
        let mut conn = open_memory_database().unwrap();
        let (_dir, _doc, preview) = staged(&mut conn, Uuid::new_v4(), payload("invoice"));

        conn.execute(
            "UPDATE previews SET billing_data = json_set(billing_data, '$.total', json('null'))
             WHERE id = ?1",
            rusqlite::params![preview.id.to_string()],
        )
        .unwrap();
        assert!(approve_preview(&mut conn, &preview.id).is_err());

        conn.execute(
            "UPDATE previews SET billing_data = json_set(billing_data, '$.total', 216.0)
             WHERE id = ?1",
            rusqlite::params![preview.id.to_string()],
        )
        .unwrap();

        let outcome = approve_preview(&mut conn, &preview.id).unwrap();
        assert_eq!(count(&conn, "invoices"), 1);
        assert_eq!(outcome.tasks_created, 1);
    }

    #[test]
    fn approved_preview_cannot_be_approved_again() {
        let mut conn = open_memory_database().unwrap();
        let (_dir, _doc, preview) = staged(&mut conn, Uuid::new_v4(), payload("invoice"));

        approve_preview(&mut conn, &preview.id).unwrap();
        let again = approve_preview(&mut conn, &preview.id);
        assert!(matches!(again, Err(ApprovalError::NotReviewable { .. })));
        assert_eq!(count(&conn, "invoices"), 1, "no double-commit");
    }

    #[test]
    fn use_existing_merges_tasks_into_matched_project() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();

        let mut customer = Customer::new(owner, "Jean Dupont");
        customer.email = Some("jean@example.fr".into());
        repo_insert_customer(&conn, &customer).unwrap();

        let project = Project::new(owner, customer.id, "Rénovation cuisine");
        crate::db::repository::insert_project(&conn, &project).unwrap();

        let mut existing_task = TaskRecord::new(project.id, "Peinture");
        existing_task.estimated_hours = Some(8.0);
        existing_task.amount = Some(360.0);
        crate::db::repository::insert_task(&conn, &existing_task).unwrap();

        let (_dir, _doc, preview) = staged(&mut conn, owner, payload("invoice"));
        assert_eq!(preview.customer_action, MatchAction::UseExisting);
        assert_eq!(preview.project_action, MatchAction::UseExisting);

        let outcome = approve_preview(&mut conn, &preview.id).unwrap();
        assert_eq!(outcome.customer_id, customer.id);
        assert_eq!(outcome.project_id, project.id);
        assert_eq!(outcome.tasks_merged, 1);
        assert_eq!(outcome.tasks_created, 0);

        let tasks = get_tasks_by_project(&conn, &project.id).unwrap();
        assert_eq!(tasks.len(), 1, "merged, not duplicated");
        assert_eq!(tasks[0].estimated_hours, Some(12.0), "hours are additive");
        assert_eq!(tasks[0].amount, Some(540.0), "amounts are additive");
    }

    #[test]
    fn merge_customer_fills_missing_fields_only() {
        let mut conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();

        // A fuzzy candidate in the merge band (name similarity 73): staged
        // merge fills the phone but never overwrites the existing email.
        let mut existing = Customer::new(owner, "Jean Dupuis");
        existing.email = Some("contact@dupond.fr".into());
        repo_insert_customer(&conn, &existing).unwrap();

        let mut body = payload("invoice");
        body["customer"]["email"] = json!(null);
        let (_dir, _doc, preview) = staged(&mut conn, owner, body);
        assert_eq!(preview.customer_action, MatchAction::Merge);

        let outcome = approve_preview(&mut conn, &preview.id).unwrap();
        assert_eq!(outcome.customer_id, existing.id);

        let merged = get_customer(&conn, &existing.id).unwrap().unwrap();
        assert_eq!(merged.email.as_deref(), Some("contact@dupond.fr"));
        assert_eq!(merged.phone.as_deref(), Some("+33 6 12 34 56 78"));
        assert_eq!(merged.address.as_deref(), Some("12 rue des Lilas, Lyon"));
        assert_eq!(count(&conn, "customers"), 1, "no new customer on merge");
    }

    #[test]
    fn reject_is_terminal_for_preview_and_document() {
        let mut conn = open_memory_database().unwrap();
        let (_dir, doc, preview) = staged(&mut conn, Uuid::new_v4(), payload("invoice"));

        reject_preview(&conn, &preview.id).unwrap();

        let rejected = get_preview(&conn, &preview.id).unwrap().unwrap();
        assert_eq!(rejected.status, PreviewStatus::Rejected);
        assert!(rejected.reviewed_at.is_some());
        assert_eq!(
            get_document(&conn, &doc.id).unwrap().unwrap().status,
            DocumentStatus::Rejected
        );

        let approve_after = approve_preview(&mut conn, &preview.id);
        assert!(matches!(approve_after, Err(ApprovalError::NotReviewable { .. })));
    }
}
