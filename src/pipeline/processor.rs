//! Ingestion coordinator: owns the document state machine
//! `uploaded → processing → {parsed | error}` and assembles the preview.
//!
//! Every failure between `processing` and `parsed` lands the document in
//! the `error` state with the failure message captured verbatim. Re-parse
//! resets to `uploaded` and re-enters the pipeline; ParseResult and
//! Preview are upserts keyed by document, so redelivered jobs are
//! idempotent.

use std::time::Instant;

use rusqlite::Connection;
use uuid::Uuid;

use super::extraction::types::{ExtractionClient, PageImage};
use super::extraction::validation::validate_extraction;
use super::PipelineError;
use crate::config;
use crate::db::repository::{
    get_customer, get_customers_by_owner, get_parse_result_by_document, get_preview_by_document,
    get_project, get_projects_by_customer, mark_document_parsed, require_document,
    set_document_error, update_document_status, upsert_parse_result, upsert_preview,
};
use crate::matching::conflicts;
use crate::matching::customer::{match_customer, CustomerMatch};
use crate::matching::project::{match_project, ProjectMatch};
use crate::models::enums::{DocumentStatus, DocumentType, MatchAction, PreviewStatus};
use crate::models::{Document, ParseResult, Preview};
use chrono::Utc;

pub struct IngestionPipeline {
    extractor: Box<dyn ExtractionClient + Send + Sync>,
}

impl IngestionPipeline {
    pub fn new(extractor: Box<dyn ExtractionClient + Send + Sync>) -> Self {
        Self { extractor }
    }

    /// Run the full parse pipeline for one document.
    ///
    /// On success the document is `parsed` and the staged preview is
    /// returned; on any failure the document is `error` with the message
    /// recorded, and the error is propagated to the caller.
    pub fn process_document(
        &self,
        conn: &Connection,
        document_id: &Uuid,
    ) -> Result<Preview, PipelineError> {
        let _span =
            tracing::info_span!("process_document", document_id = %document_id).entered();

        let document = require_document(conn, document_id)?;
        update_document_status(conn, document_id, DocumentStatus::Processing)?;
        let started = Instant::now();

        match self.run_pipeline(conn, &document) {
            Ok((preview, doc_type)) => {
                mark_document_parsed(conn, document_id, doc_type, started.elapsed().as_secs_f64())?;
                tracing::info!(
                    document_id = %document_id,
                    preview_id = %preview.id,
                    duration_secs = started.elapsed().as_secs_f64(),
                    "Document parsed"
                );
                Ok(preview)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(document_id = %document_id, error = %message, "Parse failed");
                set_document_error(conn, document_id, &message)?;
                Err(e)
            }
        }
    }

    fn run_pipeline(
        &self,
        conn: &Connection,
        document: &Document,
    ) -> Result<(Preview, DocumentType), PipelineError> {
        let pages = load_pages(document)?;
        let raw = self.extractor.extract(&pages)?;
        let extracted = validate_extraction(&raw).map_err(PipelineError::Validation)?;
        let doc_type = extracted.document_type;

        // Upserts keep the original row ids so reviewer links stay stable.
        let parse_result_id = get_parse_result_by_document(conn, &document.id)?
            .map(|p| p.id)
            .unwrap_or_else(Uuid::new_v4);
        let parse_result = ParseResult {
            id: parse_result_id,
            document_id: document.id,
            raw_payload: raw,
            confidence: extracted.confidence_scores,
            language: extracted.language,
            extracted: extracted.clone(),
            created_at: Utc::now(),
        };
        upsert_parse_result(conn, &parse_result)?;

        let customers = get_customers_by_owner(conn, &document.owner_id)?;
        let customer_match = match_customer(&extracted.customer, &customers);

        let project_match = match customer_match.customer_id {
            Some(customer_id) => {
                let projects = get_projects_by_customer(conn, &customer_id)?;
                match_project(
                    extracted.project.as_ref().and_then(|p| p.name.as_deref()),
                    &projects,
                )
            }
            // No resolved customer means no project scope: default to new.
            None => ProjectMatch::create_new(),
        };

        let matched_customer = match customer_match.customer_id {
            Some(id) => get_customer(conn, &id)?,
            None => None,
        };
        let matched_project = match project_match.project_id {
            Some(id) => get_project(conn, &id)?,
            None => None,
        };

        let findings = conflicts::detect(
            &extracted,
            &customer_match,
            matched_customer.as_ref(),
            &project_match,
            matched_project.as_ref(),
        );

        let preview = build_preview(
            conn,
            document,
            &parse_result,
            &customer_match,
            &project_match,
            findings,
        )?;
        upsert_preview(conn, &preview)?;

        Ok((preview, doc_type))
    }
}

/// Reset a document for re-parsing. The caller re-enqueues the parse job;
/// ParseResult and Preview are replaced by the next run.
pub fn request_reparse(conn: &Connection, document_id: &Uuid) -> Result<(), PipelineError> {
    require_document(conn, document_id)?;
    update_document_status(conn, document_id, DocumentStatus::Uploaded)?;
    tracing::info!(document_id = %document_id, "Document reset for re-parse");
    Ok(())
}

fn load_pages(document: &Document) -> Result<Vec<PageImage>, PipelineError> {
    let data = std::fs::read(&document.file_path).map_err(|e| PipelineError::FileRead {
        path: document.file_path.clone(),
        reason: e.to_string(),
    })?;

    let mime_type = match document
        .file_path
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    };

    Ok(vec![PageImage {
        index: 0,
        mime_type: mime_type.to_string(),
        data,
    }])
}

fn build_preview(
    conn: &Connection,
    document: &Document,
    parse_result: &ParseResult,
    customer_match: &CustomerMatch,
    project_match: &ProjectMatch,
    findings: conflicts::ReviewFindings,
) -> Result<Preview, PipelineError> {
    let extracted = &parse_result.extracted;

    let auto_approve_eligible = findings.conflicts.is_empty()
        && extracted.confidence_scores.overall >= config::DEFAULT_AUTO_APPROVE_CONFIDENCE
        && customer_match.action != MatchAction::Merge;

    let preview_id = get_preview_by_document(conn, &document.id)?
        .map(|p| p.id)
        .unwrap_or_else(Uuid::new_v4);

    Ok(Preview {
        id: preview_id,
        document_id: document.id,
        parse_result_id: parse_result.id,
        customer_data: extracted.customer.clone(),
        project_data: extracted.project.clone(),
        tasks_data: extracted.tasks.clone(),
        billing_data: extracted.invoice_or_estimate.clone(),
        matched_customer_id: customer_match.customer_id,
        matched_project_id: project_match.project_id,
        customer_action: customer_match.action,
        customer_confidence: customer_match.confidence,
        project_action: project_match.action,
        project_confidence: project_match.confidence,
        conflicts: findings.conflicts,
        warnings: findings.warnings,
        status: PreviewStatus::PendingReview,
        auto_approve_eligible,
        created_customer_id: None,
        created_project_id: None,
        created_invoice_id: None,
        created_estimate_id: None,
        reviewed_at: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{get_document, insert_customer, insert_document};
    use crate::db::sqlite::open_memory_database;
    use crate::models::Customer;
    use crate::pipeline::extraction::client::MockExtractionClient;
    use serde_json::json;
    use std::io::Write;

    fn valid_payload() -> serde_json::Value {
        json!({
            "document_type": "invoice",
            "language": "fr",
            "confidence_scores": {"overall": 92, "customer": 95, "project": 70, "tasks": 85, "pricing": 90},
            "customer": {"name": "Jean Dupont", "email": "jean@example.fr", "phone": null,
                         "company": null, "address": null},
            "project": {"name": "Rénovation cuisine", "description": null,
                        "start_date": null, "end_date": null},
            "tasks": [{"name": "Peinture", "description": null, "estimated_hours": 8.0,
                       "actual_hours": null, "hourly_rate": 45.0, "amount": 360.0, "category": null}],
            "invoice_or_estimate": {"number": "FAC-2026-042", "issue_date": "2026-06-15",
                "due_date": null, "valid_until": null, "subtotal": 360.0, "tax_rate": 20.0,
                "tax_amount": 72.0, "total": 432.0, "currency": "EUR"}
        })
    }

    fn setup_document(conn: &Connection) -> (tempfile::TempDir, Document) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facture.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4 test bytes").unwrap();

        let doc = Document::new(Uuid::new_v4(), path.to_str().unwrap());
        insert_document(conn, &doc).unwrap();
        (dir, doc)
    }

    #[test]
    fn successful_parse_creates_one_result_and_one_preview() {
        let conn = open_memory_database().unwrap();
        let (_dir, doc) = setup_document(&conn);
        let pipeline = IngestionPipeline::new(Box::new(MockExtractionClient::new(valid_payload())));

        let preview = pipeline.process_document(&conn, &doc.id).unwrap();
        assert_eq!(preview.status, PreviewStatus::PendingReview);
        assert_eq!(preview.customer_data.name.as_deref(), Some("Jean Dupont"));

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Parsed);
        assert_eq!(loaded.doc_type, crate::models::enums::DocumentType::Invoice);
        assert!(loaded.processed_at.is_some());
        assert!(loaded.processing_duration_seconds.is_some());

        let results: i64 = conn
            .query_row("SELECT COUNT(*) FROM parse_results", [], |r| r.get(0))
            .unwrap();
        let previews: i64 = conn
            .query_row("SELECT COUNT(*) FROM previews", [], |r| r.get(0))
            .unwrap();
        assert_eq!((results, previews), (1, 1));
    }

    #[test]
    fn reparse_replaces_rather_than_duplicates() {
        let conn = open_memory_database().unwrap();
        let (_dir, doc) = setup_document(&conn);
        let pipeline = IngestionPipeline::new(Box::new(MockExtractionClient::new(valid_payload())));

        let first = pipeline.process_document(&conn, &doc.id).unwrap();
        request_reparse(&conn, &doc.id).unwrap();
        assert_eq!(
            get_document(&conn, &doc.id).unwrap().unwrap().status,
            DocumentStatus::Uploaded
        );

        let second = pipeline.process_document(&conn, &doc.id).unwrap();
        assert_eq!(first.id, second.id, "preview id is stable across re-parse");

        let results: i64 = conn
            .query_row("SELECT COUNT(*) FROM parse_results", [], |r| r.get(0))
            .unwrap();
        let previews: i64 = conn
            .query_row("SELECT COUNT(*) FROM previews", [], |r| r.get(0))
            .unwrap();
        assert_eq!((results, previews), (1, 1));
    }

    #[test]
    fn extraction_failure_sets_error_state_with_message() {
        let conn = open_memory_database().unwrap();
        let (_dir, doc) = setup_document(&conn);
        let pipeline =
            IngestionPipeline::new(Box::new(MockExtractionClient::failing("vision backend down")));

        let result = pipeline.process_document(&conn, &doc.id);
        assert!(result.is_err());

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Error);
        assert!(
            loaded.error_message.unwrap().contains("vision backend down"),
            "boundary message must be captured verbatim"
        );

        let previews: i64 = conn
            .query_row("SELECT COUNT(*) FROM previews", [], |r| r.get(0))
            .unwrap();
        assert_eq!(previews, 0, "no preview on extraction failure");
    }

    #[test]
    fn validation_failure_lists_violations() {
        let conn = open_memory_database().unwrap();
        let (_dir, doc) = setup_document(&conn);

        let mut payload = valid_payload();
        payload["tasks"] = json!([]);
        payload["language"] = json!("de");
        let pipeline = IngestionPipeline::new(Box::new(MockExtractionClient::new(payload)));

        let result = pipeline.process_document(&conn, &doc.id);
        assert!(matches!(result, Err(PipelineError::Validation(_))));

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Error);
        let message = loaded.error_message.unwrap();
        assert!(message.contains("task list is empty"));
        assert!(message.contains("invalid language"));
    }

    #[test]
    fn missing_file_sets_error_state() {
        let conn = open_memory_database().unwrap();
        let doc = Document::new(Uuid::new_v4(), "/nonexistent/path.pdf");
        insert_document(&conn, &doc).unwrap();

        let pipeline = IngestionPipeline::new(Box::new(MockExtractionClient::new(valid_payload())));
        let result = pipeline.process_document(&conn, &doc.id);
        assert!(matches!(result, Err(PipelineError::FileRead { .. })));

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Error);
    }

    #[test]
    fn matched_customer_scopes_project_match() {
        let conn = open_memory_database().unwrap();
        let (_dir, doc) = setup_document(&conn);

        let mut customer = Customer::new(doc.owner_id, "Jean Dupont");
        customer.email = Some("jean@example.fr".into());
        insert_customer(&conn, &customer).unwrap();

        let project = crate::models::Project::new(doc.owner_id, customer.id, "Rénovation cuisine");
        crate::db::repository::insert_project(&conn, &project).unwrap();

        let pipeline = IngestionPipeline::new(Box::new(MockExtractionClient::new(valid_payload())));
        let preview = pipeline.process_document(&conn, &doc.id).unwrap();

        assert_eq!(preview.customer_action, MatchAction::UseExisting);
        assert_eq!(preview.customer_confidence, 100, "email match");
        assert_eq!(preview.matched_customer_id, Some(customer.id));
        assert_eq!(preview.project_action, MatchAction::UseExisting);
        assert_eq!(preview.matched_project_id, Some(project.id));
    }

    #[test]
    fn high_confidence_clean_preview_is_auto_approve_eligible() {
        let conn = open_memory_database().unwrap();
        let (_dir, doc) = setup_document(&conn);
        let pipeline = IngestionPipeline::new(Box::new(MockExtractionClient::new(valid_payload())));

        let preview = pipeline.process_document(&conn, &doc.id).unwrap();
        assert!(preview.conflicts.is_empty());
        assert!(preview.auto_approve_eligible);
    }
}
