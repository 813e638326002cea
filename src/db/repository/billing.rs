use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Estimate, Invoice};

pub fn insert_invoice(conn: &Connection, invoice: &Invoice) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO invoices (id, owner_id, customer_id, project_id, number, issue_date,
         due_date, subtotal, tax_rate, tax_amount, total, currency, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            invoice.id.to_string(),
            invoice.owner_id.to_string(),
            invoice.customer_id.to_string(),
            invoice.project_id.map(|id| id.to_string()),
            invoice.number,
            invoice.issue_date.map(|d| d.to_string()),
            invoice.due_date.map(|d| d.to_string()),
            invoice.subtotal,
            invoice.tax_rate,
            invoice.tax_amount,
            invoice.total,
            invoice.currency,
            invoice.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn insert_estimate(conn: &Connection, estimate: &Estimate) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO estimates (id, owner_id, customer_id, project_id, number, issue_date,
         valid_until, subtotal, tax_rate, tax_amount, total, currency, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            estimate.id.to_string(),
            estimate.owner_id.to_string(),
            estimate.customer_id.to_string(),
            estimate.project_id.map(|id| id.to_string()),
            estimate.number,
            estimate.issue_date.map(|d| d.to_string()),
            estimate.valid_until.map(|d| d.to_string()),
            estimate.subtotal,
            estimate.tax_rate,
            estimate.tax_amount,
            estimate.total,
            estimate.currency,
            estimate.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn invoice_number_exists(
    conn: &Connection,
    owner_id: &Uuid,
    number: &str,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM invoices WHERE owner_id = ?1 AND number = ?2",
        params![owner_id.to_string(), number],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn estimate_number_exists(
    conn: &Connection,
    owner_id: &Uuid,
    number: &str,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM estimates WHERE owner_id = ?1 AND number = ?2",
        params![owner_id.to_string(), number],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Invoices issued by an owner in a given year+month, for sequence numbering.
pub fn count_invoices_for_month(
    conn: &Connection,
    owner_id: &Uuid,
    year: i32,
    month: u32,
) -> Result<i64, DatabaseError> {
    let prefix = format!("{year:04}-{month:02}%");
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM invoices WHERE owner_id = ?1 AND created_at LIKE ?2",
        params![owner_id.to_string(), prefix],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_estimates_for_month(
    conn: &Connection,
    owner_id: &Uuid,
    year: i32,
    month: u32,
) -> Result<i64, DatabaseError> {
    let prefix = format!("{year:04}-{month:02}%");
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM estimates WHERE owner_id = ?1 AND created_at LIKE ?2",
        params![owner_id.to_string(), prefix],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::customer::insert_customer;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Customer;
    use chrono::Utc;

    fn sample_invoice(owner_id: Uuid, customer_id: Uuid, number: &str) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            owner_id,
            customer_id,
            project_id: None,
            number: number.to_string(),
            issue_date: None,
            due_date: None,
            subtotal: Some(720.0),
            tax_rate: Some(20.0),
            tax_amount: Some(144.0),
            total: 864.0,
            currency: "EUR".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn number_uniqueness_scoped_to_owner() {
        let conn = open_memory_database().unwrap();
        let customer = Customer::new(Uuid::new_v4(), "Jean Dupont");
        insert_customer(&conn, &customer).unwrap();

        let invoice = sample_invoice(customer.owner_id, customer.id, "FAC-2026-042");
        insert_invoice(&conn, &invoice).unwrap();

        assert!(invoice_number_exists(&conn, &customer.owner_id, "FAC-2026-042").unwrap());
        assert!(!invoice_number_exists(&conn, &customer.owner_id, "FAC-2026-043").unwrap());
        assert!(!invoice_number_exists(&conn, &Uuid::new_v4(), "FAC-2026-042").unwrap());

        let duplicate = sample_invoice(customer.owner_id, customer.id, "FAC-2026-042");
        assert!(insert_invoice(&conn, &duplicate).is_err(), "duplicate number must violate unique");
    }
}
