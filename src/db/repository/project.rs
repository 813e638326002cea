use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_opt_date, parse_ts};
use crate::db::DatabaseError;
use crate::models::enums::ProjectStatus;
use crate::models::{Project, TaskRecord};

const PROJECT_COLUMNS: &str =
    "id, owner_id, customer_id, name, description, status, budget, start_date, end_date, created_at";

pub fn insert_project(conn: &Connection, project: &Project) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO projects (id, owner_id, customer_id, name, description, status, budget,
         start_date, end_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            project.id.to_string(),
            project.owner_id.to_string(),
            project.customer_id.to_string(),
            project.name,
            project.description,
            project.status.as_str(),
            project.budget,
            project.start_date.map(|d| d.to_string()),
            project.end_date.map(|d| d.to_string()),
            project.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_project(conn: &Connection, id: &Uuid) -> Result<Option<Project>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id.to_string()], map_project_row);
    match result {
        Ok(project) => Ok(Some(project?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn require_project(conn: &Connection, id: &Uuid) -> Result<Project, DatabaseError> {
    get_project(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Project".into(),
        id: id.to_string(),
    })
}

/// Projects in insertion order; stable iteration for deterministic matches.
pub fn get_projects_by_customer(
    conn: &Connection,
    customer_id: &Uuid,
) -> Result<Vec<Project>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE customer_id = ?1 ORDER BY created_at ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![customer_id.to_string()], map_project_row)?;
    let mut projects = Vec::new();
    for row in rows {
        projects.push(row??);
    }
    Ok(projects)
}

// ── Tasks ───────────────────────────────────────────────────────────────────

pub fn insert_task(conn: &Connection, task: &TaskRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO tasks (id, project_id, name, description, estimated_hours, actual_hours,
         hourly_rate, amount, category, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            task.id.to_string(),
            task.project_id.to_string(),
            task.name,
            task.description,
            task.estimated_hours,
            task.actual_hours,
            task.hourly_rate,
            task.amount,
            task.category,
            task.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update_task(conn: &Connection, task: &TaskRecord) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE tasks SET name = ?2, description = ?3, estimated_hours = ?4, actual_hours = ?5,
         hourly_rate = ?6, amount = ?7, category = ?8
         WHERE id = ?1",
        params![
            task.id.to_string(),
            task.name,
            task.description,
            task.estimated_hours,
            task.actual_hours,
            task.hourly_rate,
            task.amount,
            task.category,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Task".into(),
            id: task.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_tasks_by_project(
    conn: &Connection,
    project_id: &Uuid,
) -> Result<Vec<TaskRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, name, description, estimated_hours, actual_hours, hourly_rate,
         amount, category, created_at
         FROM tasks WHERE project_id = ?1 ORDER BY created_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![project_id.to_string()], map_task_row)?;
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row??);
    }
    Ok(tasks)
}

fn map_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Project, DatabaseError>> {
    let id: String = row.get(0)?;
    let owner_id: String = row.get(1)?;
    let customer_id: String = row.get(2)?;
    let name: String = row.get(3)?;
    let description: Option<String> = row.get(4)?;
    let status: String = row.get(5)?;
    let budget: Option<f64> = row.get(6)?;
    let start_date: Option<String> = row.get(7)?;
    let end_date: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;

    Ok((|| {
        let parse_uuid = |s: &str| {
            Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
        };
        Ok(Project {
            id: parse_uuid(&id)?,
            owner_id: parse_uuid(&owner_id)?,
            customer_id: parse_uuid(&customer_id)?,
            name,
            description,
            status: ProjectStatus::from_str(&status)?,
            budget,
            start_date: parse_opt_date(start_date),
            end_date: parse_opt_date(end_date),
            created_at: parse_ts(&created_at),
        })
    })())
}

fn map_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<TaskRecord, DatabaseError>> {
    let id: String = row.get(0)?;
    let project_id: String = row.get(1)?;
    let name: String = row.get(2)?;
    let description: Option<String> = row.get(3)?;
    let estimated_hours: Option<f64> = row.get(4)?;
    let actual_hours: Option<f64> = row.get(5)?;
    let hourly_rate: Option<f64> = row.get(6)?;
    let amount: Option<f64> = row.get(7)?;
    let category: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;

    Ok((|| {
        let parse_uuid = |s: &str| {
            Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
        };
        Ok(TaskRecord {
            id: parse_uuid(&id)?,
            project_id: parse_uuid(&project_id)?,
            name,
            description,
            estimated_hours,
            actual_hours,
            hourly_rate,
            amount,
            category,
            created_at: parse_ts(&created_at),
        })
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::customer::insert_customer;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Customer;

    fn setup_customer(conn: &Connection) -> Customer {
        let customer = Customer::new(Uuid::new_v4(), "Jean Dupont");
        insert_customer(conn, &customer).unwrap();
        customer
    }

    #[test]
    fn project_round_trip() {
        let conn = open_memory_database().unwrap();
        let customer = setup_customer(&conn);

        let mut project = Project::new(customer.owner_id, customer.id, "Rénovation cuisine");
        project.budget = Some(12_000.0);
        insert_project(&conn, &project).unwrap();

        let loaded = get_project(&conn, &project.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Rénovation cuisine");
        assert_eq!(loaded.budget, Some(12_000.0));
        assert_eq!(loaded.status, ProjectStatus::Active);
    }

    #[test]
    fn task_merge_updates_persist() {
        let conn = open_memory_database().unwrap();
        let customer = setup_customer(&conn);
        let project = Project::new(customer.owner_id, customer.id, "Chantier");
        insert_project(&conn, &project).unwrap();

        let mut task = TaskRecord::new(project.id, "Peinture");
        task.estimated_hours = Some(8.0);
        task.amount = Some(360.0);
        insert_task(&conn, &task).unwrap();

        task.estimated_hours = Some(12.0);
        task.amount = Some(540.0);
        update_task(&conn, &task).unwrap();

        let tasks = get_tasks_by_project(&conn, &project.id).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].estimated_hours, Some(12.0));
        assert_eq!(tasks[0].amount, Some(540.0));
    }
}
