use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_ts;
use crate::db::DatabaseError;
use crate::models::enums::{EditMagnitude, FeedbackType, UserRating};
use crate::models::FeedbackRecord;

const FEEDBACK_COLUMNS: &str = "id, user_id, document_id, preview_id, feedback_type,
     original_data, corrected_data, field_path, edit_magnitude, user_rating,
     was_used_for_training, model_version_used, created_at";

pub fn insert_feedback(conn: &Connection, record: &FeedbackRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO feedback_records (id, user_id, document_id, preview_id, feedback_type,
         original_data, corrected_data, field_path, edit_magnitude, user_rating,
         was_used_for_training, model_version_used, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.id.to_string(),
            record.user_id.to_string(),
            record.document_id.map(|id| id.to_string()),
            record.preview_id.map(|id| id.to_string()),
            record.feedback_type.as_str(),
            record
                .original_data
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            record
                .corrected_data
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            record.field_path,
            record.edit_magnitude.as_str(),
            record.user_rating.map(|r| r.as_str()),
            record.was_used_for_training as i32,
            record.model_version_used.map(|id| id.to_string()),
            record.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Rating and `was_used_for_training` are the only mutable fields.
pub fn set_feedback_rating(
    conn: &Connection,
    id: &Uuid,
    rating: UserRating,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE feedback_records SET user_rating = ?2 WHERE id = ?1",
        params![id.to_string(), rating.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "FeedbackRecord".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Count records eligible for training: edited, rated, not yet consumed.
pub fn count_training_eligible(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM feedback_records
         WHERE feedback_type != 'implicit_positive'
           AND user_rating IS NOT NULL
           AND was_used_for_training = 0",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_training_eligible(conn: &Connection) -> Result<Vec<FeedbackRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback_records
         WHERE feedback_type != 'implicit_positive'
           AND user_rating IS NOT NULL
           AND was_used_for_training = 0
         ORDER BY created_at ASC"
    ))?;

    let rows = stmt.query_map([], map_feedback_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

pub fn mark_used_for_training(conn: &Connection, ids: &[Uuid]) -> Result<(), DatabaseError> {
    let mut stmt =
        conn.prepare("UPDATE feedback_records SET was_used_for_training = 1 WHERE id = ?1")?;
    for id in ids {
        stmt.execute(params![id.to_string()])?;
    }
    Ok(())
}

/// Whether a preview has any edit-type feedback recorded against it.
/// Used to decide if an approval counts as "approved unmodified".
pub fn preview_has_edit_feedback(
    conn: &Connection,
    preview_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM feedback_records
         WHERE preview_id = ?1 AND feedback_type != 'implicit_positive'",
        params![preview_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_feedback_by_document(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Vec<FeedbackRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FEEDBACK_COLUMNS} FROM feedback_records
         WHERE document_id = ?1 ORDER BY created_at ASC"
    ))?;

    let rows = stmt.query_map(params![document_id.to_string()], map_feedback_row)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row??);
    }
    Ok(records)
}

fn map_feedback_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<Result<FeedbackRecord, DatabaseError>> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let document_id: Option<String> = row.get(2)?;
    let preview_id: Option<String> = row.get(3)?;
    let feedback_type: String = row.get(4)?;
    let original_data: Option<String> = row.get(5)?;
    let corrected_data: Option<String> = row.get(6)?;
    let field_path: Option<String> = row.get(7)?;
    let edit_magnitude: String = row.get(8)?;
    let user_rating: Option<String> = row.get(9)?;
    let was_used_for_training: i32 = row.get(10)?;
    let model_version_used: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;

    Ok((|| {
        let parse_uuid = |s: &str| {
            Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
        };

        Ok(FeedbackRecord {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            document_id: document_id.as_deref().map(parse_uuid).transpose()?,
            preview_id: preview_id.as_deref().map(parse_uuid).transpose()?,
            feedback_type: FeedbackType::from_str(&feedback_type)?,
            original_data: original_data
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            corrected_data: corrected_data
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            field_path,
            edit_magnitude: EditMagnitude::from_str(&edit_magnitude)?,
            user_rating: user_rating
                .as_deref()
                .map(UserRating::from_str)
                .transpose()?,
            was_used_for_training: was_used_for_training != 0,
            model_version_used: model_version_used.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_ts(&created_at),
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn edited_record(rated: bool) -> FeedbackRecord {
        let mut record = FeedbackRecord::new(Uuid::new_v4(), FeedbackType::ManualEdit);
        record.field_path = Some("customer.name".into());
        record.original_data = Some(serde_json::json!("Jean Dupond"));
        record.corrected_data = Some(serde_json::json!("Jean Dupont"));
        record.edit_magnitude = EditMagnitude::Minor;
        if rated {
            record.user_rating = Some(UserRating::Good);
        }
        record
    }

    #[test]
    fn insert_and_load_round_trip() {
        let conn = open_memory_database().unwrap();
        let mut record = edited_record(true);
        let doc_id = Uuid::new_v4();
        record.document_id = Some(doc_id);
        insert_feedback(&conn, &record).unwrap();

        let loaded = get_feedback_by_document(&conn, &doc_id).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].field_path.as_deref(), Some("customer.name"));
        assert_eq!(loaded[0].edit_magnitude, EditMagnitude::Minor);
        assert_eq!(loaded[0].user_rating, Some(UserRating::Good));
    }

    #[test]
    fn eligible_count_excludes_unrated_and_positive() {
        let conn = open_memory_database().unwrap();

        insert_feedback(&conn, &edited_record(true)).unwrap();
        insert_feedback(&conn, &edited_record(false)).unwrap();

        let mut positive = FeedbackRecord::new(Uuid::new_v4(), FeedbackType::ImplicitPositive);
        positive.user_rating = Some(UserRating::Excellent);
        insert_feedback(&conn, &positive).unwrap();

        assert_eq!(count_training_eligible(&conn).unwrap(), 1);
    }

    #[test]
    fn marking_used_removes_from_eligible_set() {
        let conn = open_memory_database().unwrap();
        let record = edited_record(true);
        insert_feedback(&conn, &record).unwrap();
        assert_eq!(count_training_eligible(&conn).unwrap(), 1);

        mark_used_for_training(&conn, &[record.id]).unwrap();
        assert_eq!(count_training_eligible(&conn).unwrap(), 0);
    }

    #[test]
    fn rating_updates_in_place() {
        let conn = open_memory_database().unwrap();
        let record = edited_record(false);
        let doc_id = Uuid::new_v4();
        let mut record = record;
        record.document_id = Some(doc_id);
        insert_feedback(&conn, &record).unwrap();

        set_feedback_rating(&conn, &record.id, UserRating::Excellent).unwrap();
        let loaded = get_feedback_by_document(&conn, &doc_id).unwrap();
        assert_eq!(loaded[0].user_rating, Some(UserRating::Excellent));
    }
}
