use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_opt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::enums::{DocumentStatus, DocumentType};
use crate::models::Document;

const DOCUMENT_COLUMNS: &str = "id, owner_id, file_path, status, doc_type, uploaded_at,
     processed_at, error_message, processing_duration_seconds";

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, owner_id, file_path, status, doc_type, uploaded_at,
         processed_at, error_message, processing_duration_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            doc.id.to_string(),
            doc.owner_id.to_string(),
            doc.file_path,
            doc.status.as_str(),
            doc.doc_type.as_str(),
            doc.uploaded_at.to_rfc3339(),
            doc.processed_at.map(|t| t.to_rfc3339()),
            doc.error_message,
            doc.processing_duration_seconds,
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], map_document_row);

    match result {
        Ok(doc) => Ok(Some(doc?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load a document or fail with NotFound.
pub fn require_document(conn: &Connection, id: &Uuid) -> Result<Document, DatabaseError> {
    get_document(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Document".into(),
        id: id.to_string(),
    })
}

pub fn get_documents_by_status(
    conn: &Connection,
    owner_id: &Uuid,
    status: DocumentStatus,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents
         WHERE owner_id = ?1 AND status = ?2 ORDER BY uploaded_at DESC"
    ))?;

    let rows = stmt.query_map(params![owner_id.to_string(), status.as_str()], map_document_row)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(row??);
    }
    Ok(docs)
}

pub fn update_document_status(
    conn: &Connection,
    id: &Uuid,
    status: DocumentStatus,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE documents SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Record a pipeline failure: status goes to `error` with the message
/// captured verbatim.
pub fn set_document_error(
    conn: &Connection,
    id: &Uuid,
    message: &str,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE documents SET status = 'error', error_message = ?2, processed_at = ?3 WHERE id = ?1",
        params![id.to_string(), message, Utc::now().to_rfc3339()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Record a successful parse: status, detected type, timing; clears any
/// error from a previous attempt.
pub fn mark_document_parsed(
    conn: &Connection,
    id: &Uuid,
    doc_type: DocumentType,
    duration_seconds: f64,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE documents SET status = 'parsed', doc_type = ?2, processed_at = ?3,
         processing_duration_seconds = ?4, error_message = NULL
         WHERE id = ?1",
        params![
            id.to_string(),
            doc_type.as_str(),
            Utc::now().to_rfc3339(),
            duration_seconds,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn map_document_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Document, DatabaseError>> {
    let id: String = row.get(0)?;
    let owner_id: String = row.get(1)?;
    let file_path: String = row.get(2)?;
    let status: String = row.get(3)?;
    let doc_type: String = row.get(4)?;
    let uploaded_at: String = row.get(5)?;
    let processed_at: Option<String> = row.get(6)?;
    let error_message: Option<String> = row.get(7)?;
    let processing_duration_seconds: Option<f64> = row.get(8)?;

    Ok((|| {
        Ok(Document {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            owner_id: Uuid::parse_str(&owner_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            file_path,
            status: DocumentStatus::from_str(&status)?,
            doc_type: DocumentType::from_str(&doc_type)?,
            uploaded_at: parse_ts(&uploaded_at),
            processed_at: parse_opt_ts(processed_at),
            error_message,
            processing_duration_seconds,
        })
    })())
}
