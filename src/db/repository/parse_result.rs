use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_ts;
use crate::db::DatabaseError;
use crate::models::enums::Language;
use crate::models::{ConfidenceScores, ParseResult};

/// Insert or replace the parse result for a document. Exactly one row per
/// document; re-parsing replaces the previous extraction.
pub fn upsert_parse_result(conn: &Connection, result: &ParseResult) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO parse_results (id, document_id, raw_payload, extracted,
         confidence_overall, confidence_customer, confidence_project, confidence_tasks,
         confidence_pricing, language, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(document_id) DO UPDATE SET
            raw_payload = excluded.raw_payload,
            extracted = excluded.extracted,
            confidence_overall = excluded.confidence_overall,
            confidence_customer = excluded.confidence_customer,
            confidence_project = excluded.confidence_project,
            confidence_tasks = excluded.confidence_tasks,
            confidence_pricing = excluded.confidence_pricing,
            language = excluded.language,
            created_at = excluded.created_at",
        params![
            result.id.to_string(),
            result.document_id.to_string(),
            serde_json::to_string(&result.raw_payload)?,
            serde_json::to_string(&result.extracted)?,
            result.confidence.overall,
            result.confidence.customer,
            result.confidence.project,
            result.confidence.tasks,
            result.confidence.pricing,
            result.language.as_str(),
            result.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_parse_result_by_document(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Option<ParseResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, raw_payload, extracted,
         confidence_overall, confidence_customer, confidence_project, confidence_tasks,
         confidence_pricing, language, created_at
         FROM parse_results WHERE document_id = ?1",
    )?;

    let result = stmt.query_row(params![document_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, i64>(6)?,
            row.get::<_, i64>(7)?,
            row.get::<_, i64>(8)?,
            row.get::<_, String>(9)?,
            row.get::<_, String>(10)?,
        ))
    });

    let row = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(ParseResult {
        id: Uuid::parse_str(&row.0).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        document_id: Uuid::parse_str(&row.1)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        raw_payload: serde_json::from_str(&row.2)?,
        extracted: serde_json::from_str(&row.3)?,
        confidence: ConfidenceScores {
            overall: row.4,
            customer: row.5,
            project: row.6,
            tasks: row.7,
            pricing: row.8,
        },
        language: Language::from_str(&row.9)?,
        created_at: parse_ts(&row.10),
    }))
}
