//! Document numbering: prefer the number printed on the document, fall
//! back to a readable generated one, and de-duplicate with a suffix.

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    count_estimates_for_month, count_invoices_for_month, estimate_number_exists,
    invoice_number_exists,
};
use crate::db::DatabaseError;
use crate::models::enums::DocumentType;

/// Resolve the final number for a new invoice/estimate.
///
/// Uses the staged number when present, otherwise a generated
/// `INV-2026-06-003` style fallback, then appends `-2`, `-3`, ... until no
/// collision remains within the owner's documents.
pub fn assign_document_number(
    conn: &Connection,
    owner_id: &Uuid,
    doc_type: DocumentType,
    staged_number: Option<&str>,
    issue_date: NaiveDate,
) -> Result<String, DatabaseError> {
    let base = match staged_number.map(str::trim).filter(|n| !n.is_empty()) {
        Some(number) => number.to_string(),
        None => fallback_number(conn, owner_id, doc_type, issue_date)?,
    };

    let exists = |number: &str| -> Result<bool, DatabaseError> {
        match doc_type {
            DocumentType::Estimate => estimate_number_exists(conn, owner_id, number),
            _ => invoice_number_exists(conn, owner_id, number),
        }
    };

    if !exists(&base)? {
        return Ok(base);
    }

    let mut suffix = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !exists(&candidate)? {
            tracing::debug!(number = %candidate, "Document number collision resolved with suffix");
            return Ok(candidate);
        }
        suffix += 1;
    }
}

fn fallback_number(
    conn: &Connection,
    owner_id: &Uuid,
    doc_type: DocumentType,
    issue_date: NaiveDate,
) -> Result<String, DatabaseError> {
    let (prefix, sequence) = match doc_type {
        DocumentType::Estimate => (
            "EST",
            count_estimates_for_month(conn, owner_id, issue_date.year(), issue_date.month())?,
        ),
        _ => (
            "INV",
            count_invoices_for_month(conn, owner_id, issue_date.year(), issue_date.month())?,
        ),
    };

    Ok(format!(
        "{prefix}-{:04}-{:02}-{:03}",
        issue_date.year(),
        issue_date.month(),
        sequence + 1
    ))
}
