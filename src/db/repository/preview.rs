use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_opt_ts;
use crate::db::DatabaseError;
use crate::models::enums::{MatchAction, PreviewStatus};
use crate::models::Preview;

const PREVIEW_COLUMNS: &str = "id, document_id, parse_result_id, customer_data, project_data,
     tasks_data, billing_data, matched_customer_id, matched_project_id,
     customer_action, customer_confidence, project_action, project_confidence,
     conflicts, warnings, status, auto_approve_eligible,
     created_customer_id, created_project_id, created_invoice_id, created_estimate_id,
     reviewed_at";

/// Insert or replace the preview for a document. Exactly one row per
/// document; re-parsing rebuilds the staging record in place (the row id
/// survives so links held by reviewers stay valid).
pub fn upsert_preview(conn: &Connection, preview: &Preview) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO previews (id, document_id, parse_result_id, customer_data, project_data,
         tasks_data, billing_data, matched_customer_id, matched_project_id,
         customer_action, customer_confidence, project_action, project_confidence,
         conflicts, warnings, status, auto_approve_eligible,
         created_customer_id, created_project_id, created_invoice_id, created_estimate_id,
         reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20, ?21, ?22)
         ON CONFLICT(document_id) DO UPDATE SET
            parse_result_id = excluded.parse_result_id,
            customer_data = excluded.customer_data,
            project_data = excluded.project_data,
            tasks_data = excluded.tasks_data,
            billing_data = excluded.billing_data,
            matched_customer_id = excluded.matched_customer_id,
            matched_project_id = excluded.matched_project_id,
            customer_action = excluded.customer_action,
            customer_confidence = excluded.customer_confidence,
            project_action = excluded.project_action,
            project_confidence = excluded.project_confidence,
            conflicts = excluded.conflicts,
            warnings = excluded.warnings,
            status = excluded.status,
            auto_approve_eligible = excluded.auto_approve_eligible,
            created_customer_id = excluded.created_customer_id,
            created_project_id = excluded.created_project_id,
            created_invoice_id = excluded.created_invoice_id,
            created_estimate_id = excluded.created_estimate_id,
            reviewed_at = excluded.reviewed_at",
        params![
            preview.id.to_string(),
            preview.document_id.to_string(),
            preview.parse_result_id.to_string(),
            serde_json::to_string(&preview.customer_data)?,
            serde_json::to_string(&preview.project_data)?,
            serde_json::to_string(&preview.tasks_data)?,
            serde_json::to_string(&preview.billing_data)?,
            preview.matched_customer_id.map(|id| id.to_string()),
            preview.matched_project_id.map(|id| id.to_string()),
            preview.customer_action.as_str(),
            preview.customer_confidence,
            preview.project_action.as_str(),
            preview.project_confidence,
            serde_json::to_string(&preview.conflicts)?,
            serde_json::to_string(&preview.warnings)?,
            preview.status.as_str(),
            preview.auto_approve_eligible as i32,
            preview.created_customer_id.map(|id| id.to_string()),
            preview.created_project_id.map(|id| id.to_string()),
            preview.created_invoice_id.map(|id| id.to_string()),
            preview.created_estimate_id.map(|id| id.to_string()),
            preview.reviewed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn get_preview(conn: &Connection, id: &Uuid) -> Result<Option<Preview>, DatabaseError> {
    query_one(
        conn,
        &format!("SELECT {PREVIEW_COLUMNS} FROM previews WHERE id = ?1"),
        params![id.to_string()],
    )
}

pub fn get_preview_by_document(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Option<Preview>, DatabaseError> {
    query_one(
        conn,
        &format!("SELECT {PREVIEW_COLUMNS} FROM previews WHERE document_id = ?1"),
        params![document_id.to_string()],
    )
}

pub fn require_preview(conn: &Connection, id: &Uuid) -> Result<Preview, DatabaseError> {
    get_preview(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Preview".into(),
        id: id.to_string(),
    })
}

/// All reviewable previews for one owner (pending_review or
/// needs_clarification), oldest first for stable batch iteration order.
pub fn get_reviewable_previews(
    conn: &Connection,
    owner_id: &Uuid,
) -> Result<Vec<Preview>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PREVIEW_COLUMNS} FROM previews p
         JOIN documents d ON d.id = p.document_id
         WHERE d.owner_id = ?1 AND p.status IN ('pending_review', 'needs_clarification')
         ORDER BY d.uploaded_at ASC"
    ))?;

    let rows = stmt.query_map(params![owner_id.to_string()], map_preview_row)?;
    let mut previews = Vec::new();
    for row in rows {
        previews.push(row??);
    }
    Ok(previews)
}

/// Change a preview's status, enforcing monotonicity: terminal states
/// (approved/rejected) never transition again.
pub fn update_preview_status(
    conn: &Connection,
    id: &Uuid,
    status: PreviewStatus,
) -> Result<(), DatabaseError> {
    let current = require_preview(conn, id)?;
    if current.status.is_terminal() && current.status != status {
        return Err(DatabaseError::InvalidTransition {
            from: current.status.as_str().into(),
            to: status.as_str().into(),
        });
    }

    conn.execute(
        "UPDATE previews SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    Ok(())
}

/// Persist reviewer edits to the staged blobs (and recomputed warnings).
pub fn update_preview_staged(conn: &Connection, preview: &Preview) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE previews SET customer_data = ?2, project_data = ?3, tasks_data = ?4,
         billing_data = ?5, conflicts = ?6, warnings = ?7 WHERE id = ?1",
        params![
            preview.id.to_string(),
            serde_json::to_string(&preview.customer_data)?,
            serde_json::to_string(&preview.project_data)?,
            serde_json::to_string(&preview.tasks_data)?,
            serde_json::to_string(&preview.billing_data)?,
            serde_json::to_string(&preview.conflicts)?,
            serde_json::to_string(&preview.warnings)?,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Preview".into(),
            id: preview.id.to_string(),
        });
    }
    Ok(())
}

/// Record the outcome of a successful approval.
#[allow(clippy::too_many_arguments)]
pub fn set_preview_approved(
    conn: &Connection,
    id: &Uuid,
    created_customer_id: &Uuid,
    created_project_id: &Uuid,
    created_invoice_id: Option<&Uuid>,
    created_estimate_id: Option<&Uuid>,
    reviewed_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    update_preview_status(conn, id, PreviewStatus::Approved)?;
    conn.execute(
        "UPDATE previews SET created_customer_id = ?2, created_project_id = ?3,
         created_invoice_id = ?4, created_estimate_id = ?5, reviewed_at = ?6
         WHERE id = ?1",
        params![
            id.to_string(),
            created_customer_id.to_string(),
            created_project_id.to_string(),
            created_invoice_id.map(|i| i.to_string()),
            created_estimate_id.map(|i| i.to_string()),
            reviewed_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn set_preview_rejected(
    conn: &Connection,
    id: &Uuid,
    reviewed_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    update_preview_status(conn, id, PreviewStatus::Rejected)?;
    conn.execute(
        "UPDATE previews SET reviewed_at = ?2 WHERE id = ?1",
        params![id.to_string(), reviewed_at.to_rfc3339()],
    )?;
    Ok(())
}

fn query_one(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<Preview>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let result = stmt.query_row(params, map_preview_row);
    match result {
        Ok(preview) => Ok(Some(preview?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn map_preview_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Preview, DatabaseError>> {
    let id: String = row.get(0)?;
    let document_id: String = row.get(1)?;
    let parse_result_id: String = row.get(2)?;
    let customer_data: String = row.get(3)?;
    let project_data: String = row.get(4)?;
    let tasks_data: String = row.get(5)?;
    let billing_data: String = row.get(6)?;
    let matched_customer_id: Option<String> = row.get(7)?;
    let matched_project_id: Option<String> = row.get(8)?;
    let customer_action: String = row.get(9)?;
    let customer_confidence: i64 = row.get(10)?;
    let project_action: String = row.get(11)?;
    let project_confidence: i64 = row.get(12)?;
    let conflicts: String = row.get(13)?;
    let warnings: String = row.get(14)?;
    let status: String = row.get(15)?;
    let auto_approve_eligible: i32 = row.get(16)?;
    let created_customer_id: Option<String> = row.get(17)?;
    let created_project_id: Option<String> = row.get(18)?;
    let created_invoice_id: Option<String> = row.get(19)?;
    let created_estimate_id: Option<String> = row.get(20)?;
    let reviewed_at: Option<String> = row.get(21)?;

    Ok((|| {
        let parse_uuid = |s: &str| {
            Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
        };
        let parse_opt_uuid = |s: Option<String>| -> Result<Option<Uuid>, DatabaseError> {
            s.as_deref().map(parse_uuid).transpose()
        };

        Ok(Preview {
            id: parse_uuid(&id)?,
            document_id: parse_uuid(&document_id)?,
            parse_result_id: parse_uuid(&parse_result_id)?,
            customer_data: serde_json::from_str(&customer_data)?,
            project_data: serde_json::from_str(&project_data)?,
            tasks_data: serde_json::from_str(&tasks_data)?,
            billing_data: serde_json::from_str(&billing_data)?,
            matched_customer_id: parse_opt_uuid(matched_customer_id)?,
            matched_project_id: parse_opt_uuid(matched_project_id)?,
            customer_action: MatchAction::from_str(&customer_action)?,
            customer_confidence,
            project_action: MatchAction::from_str(&project_action)?,
            project_confidence,
            conflicts: serde_json::from_str(&conflicts)?,
            warnings: serde_json::from_str(&warnings)?,
            status: PreviewStatus::from_str(&status)?,
            auto_approve_eligible: auto_approve_eligible != 0,
            created_customer_id: parse_opt_uuid(created_customer_id)?,
            created_project_id: parse_opt_uuid(created_project_id)?,
            created_invoice_id: parse_opt_uuid(created_invoice_id)?,
            created_estimate_id: parse_opt_uuid(created_estimate_id)?,
            reviewed_at: parse_opt_ts(reviewed_at),
        })
    })())
}
