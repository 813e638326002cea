use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_opt_ts, parse_ts};
use crate::db::DatabaseError;
use crate::models::enums::ModelStatus;
use crate::models::ModelVersion;

const MODEL_COLUMNS: &str = "id, version_label, base_model, status, training_file_ref,
     training_job_ref, fine_tuned_model, accuracy_before, accuracy_after, improvements,
     is_active, training_error, created_at, activated_at, deactivated_at, reactivated_at,
     rollback_reason";

pub fn insert_model_version(conn: &Connection, version: &ModelVersion) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO model_versions (id, version_label, base_model, status, training_file_ref,
         training_job_ref, fine_tuned_model, accuracy_before, accuracy_after, improvements,
         is_active, training_error, created_at, activated_at, deactivated_at, reactivated_at,
         rollback_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            version.id.to_string(),
            version.version_label,
            version.base_model,
            version.status.as_str(),
            version.training_file_ref,
            version.training_job_ref,
            version.fine_tuned_model,
            version.accuracy_before,
            version.accuracy_after,
            version
                .improvements
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            version.is_active as i32,
            version.training_error,
            version.created_at.to_rfc3339(),
            version.activated_at.map(|t| t.to_rfc3339()),
            version.deactivated_at.map(|t| t.to_rfc3339()),
            version.reactivated_at.map(|t| t.to_rfc3339()),
            version.rollback_reason,
        ],
    )?;
    Ok(())
}

pub fn update_model_version(conn: &Connection, version: &ModelVersion) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE model_versions SET status = ?2, training_file_ref = ?3, training_job_ref = ?4,
         fine_tuned_model = ?5, accuracy_before = ?6, accuracy_after = ?7, improvements = ?8,
         is_active = ?9, training_error = ?10, activated_at = ?11, deactivated_at = ?12,
         reactivated_at = ?13, rollback_reason = ?14
         WHERE id = ?1",
        params![
            version.id.to_string(),
            version.status.as_str(),
            version.training_file_ref,
            version.training_job_ref,
            version.fine_tuned_model,
            version.accuracy_before,
            version.accuracy_after,
            version
                .improvements
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            version.is_active as i32,
            version.training_error,
            version.activated_at.map(|t| t.to_rfc3339()),
            version.deactivated_at.map(|t| t.to_rfc3339()),
            version.reactivated_at.map(|t| t.to_rfc3339()),
            version.rollback_reason,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "ModelVersion".into(),
            id: version.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_model_version(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ModelVersion>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MODEL_COLUMNS} FROM model_versions WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id.to_string()], map_model_row);
    match result {
        Ok(version) => Ok(Some(version?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn require_model_version(conn: &Connection, id: &Uuid) -> Result<ModelVersion, DatabaseError> {
    get_model_version(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "ModelVersion".into(),
        id: id.to_string(),
    })
}

pub fn get_active_version(conn: &Connection) -> Result<Option<ModelVersion>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MODEL_COLUMNS} FROM model_versions WHERE is_active = 1"
    ))?;
    let result = stmt.query_row([], map_model_row);
    match result {
        Ok(version) => Ok(Some(version?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_model_versions(conn: &Connection) -> Result<Vec<ModelVersion>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MODEL_COLUMNS} FROM model_versions ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map([], map_model_row)?;
    let mut versions = Vec::new();
    for row in rows {
        versions.push(row??);
    }
    Ok(versions)
}

/// The most recently created `ready` version strictly older than the given
/// timestamp, i.e. the rollback target.
pub fn find_rollback_target(
    conn: &Connection,
    before: &chrono::DateTime<chrono::Utc>,
) -> Result<Option<ModelVersion>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MODEL_COLUMNS} FROM model_versions
         WHERE status = 'ready' AND created_at < ?1
         ORDER BY created_at DESC LIMIT 1"
    ))?;
    let result = stmt.query_row(params![before.to_rfc3339()], map_model_row);
    match result {
        Ok(version) => Ok(Some(version?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Sequential version labels: v1, v2, ...
pub fn next_version_label(conn: &Connection) -> Result<String, DatabaseError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM model_versions", [], |row| row.get(0))?;
    Ok(format!("v{}", count + 1))
}

fn map_model_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<Result<ModelVersion, DatabaseError>> {
    let id: String = row.get(0)?;
    let version_label: String = row.get(1)?;
    let base_model: String = row.get(2)?;
    let status: String = row.get(3)?;
    let training_file_ref: Option<String> = row.get(4)?;
    let training_job_ref: Option<String> = row.get(5)?;
    let fine_tuned_model: Option<String> = row.get(6)?;
    let accuracy_before: Option<f64> = row.get(7)?;
    let accuracy_after: Option<f64> = row.get(8)?;
    let improvements: Option<String> = row.get(9)?;
    let is_active: i32 = row.get(10)?;
    let training_error: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let activated_at: Option<String> = row.get(13)?;
    let deactivated_at: Option<String> = row.get(14)?;
    let reactivated_at: Option<String> = row.get(15)?;
    let rollback_reason: Option<String> = row.get(16)?;

    Ok((|| {
        Ok(ModelVersion {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            version_label,
            base_model,
            status: ModelStatus::from_str(&status)?,
            training_file_ref,
            training_job_ref,
            fine_tuned_model,
            accuracy_before,
            accuracy_after,
            improvements: improvements
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            is_active: is_active != 0,
            training_error,
            created_at: parse_ts(&created_at),
            activated_at: parse_opt_ts(activated_at),
            deactivated_at: parse_opt_ts(deactivated_at),
            reactivated_at: parse_opt_ts(reactivated_at),
            rollback_reason,
        })
    })())
}
