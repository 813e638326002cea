use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_ts;
use crate::db::DatabaseError;
use crate::models::TaskTemplate;

const TEMPLATE_COLUMNS: &str =
    "id, owner_id, name, category, tags, usage_count, avg_hours, avg_rate, confidence, created_at, updated_at";

pub fn insert_template(conn: &Connection, template: &TaskTemplate) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO task_templates (id, owner_id, name, category, tags, usage_count,
         avg_hours, avg_rate, confidence, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            template.id.to_string(),
            template.owner_id.to_string(),
            template.name,
            template.category,
            serde_json::to_string(&template.tags)?,
            template.usage_count,
            template.avg_hours,
            template.avg_rate,
            template.confidence,
            template.created_at.to_rfc3339(),
            template.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update_template(conn: &Connection, template: &TaskTemplate) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE task_templates SET category = ?2, tags = ?3, usage_count = ?4,
         avg_hours = ?5, avg_rate = ?6, confidence = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            template.id.to_string(),
            template.category,
            serde_json::to_string(&template.tags)?,
            template.usage_count,
            template.avg_hours,
            template.avg_rate,
            template.confidence,
            template.updated_at.to_rfc3339(),
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "TaskTemplate".into(),
            id: template.id.to_string(),
        });
    }
    Ok(())
}

/// Case-insensitive lookup by name within one owner's templates.
pub fn get_template_by_name(
    conn: &Connection,
    owner_id: &Uuid,
    name: &str,
) -> Result<Option<TaskTemplate>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TEMPLATE_COLUMNS} FROM task_templates
         WHERE owner_id = ?1 AND name = ?2 COLLATE NOCASE"
    ))?;
    let result = stmt.query_row(params![owner_id.to_string(), name], map_template_row);
    match result {
        Ok(template) => Ok(Some(template?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn map_template_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<Result<TaskTemplate, DatabaseError>> {
    let id: String = row.get(0)?;
    let owner_id: String = row.get(1)?;
    let name: String = row.get(2)?;
    let category: Option<String> = row.get(3)?;
    let tags: String = row.get(4)?;
    let usage_count: i64 = row.get(5)?;
    let avg_hours: Option<f64> = row.get(6)?;
    let avg_rate: Option<f64> = row.get(7)?;
    let confidence: f64 = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok((|| {
        Ok(TaskTemplate {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            owner_id: Uuid::parse_str(&owner_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            name,
            category,
            tags: serde_json::from_str(&tags)?,
            usage_count,
            avg_hours,
            avg_rate,
            confidence,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    })())
}
