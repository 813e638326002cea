use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_ts;
use crate::db::DatabaseError;
use crate::models::Customer;

const CUSTOMER_COLUMNS: &str = "id, owner_id, name, company, email, phone, address, created_at";

pub fn insert_customer(conn: &Connection, customer: &Customer) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO customers (id, owner_id, name, company, email, phone, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            customer.id.to_string(),
            customer.owner_id.to_string(),
            customer.name,
            customer.company,
            customer.email,
            customer.phone,
            customer.address,
            customer.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update_customer(conn: &Connection, customer: &Customer) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE customers SET name = ?2, company = ?3, email = ?4, phone = ?5, address = ?6
         WHERE id = ?1",
        params![
            customer.id.to_string(),
            customer.name,
            customer.company,
            customer.email,
            customer.phone,
            customer.address,
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Customer".into(),
            id: customer.id.to_string(),
        });
    }
    Ok(())
}

pub fn get_customer(conn: &Connection, id: &Uuid) -> Result<Option<Customer>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
    ))?;
    let result = stmt.query_row(params![id.to_string()], map_customer_row);
    match result {
        Ok(customer) => Ok(Some(customer?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn require_customer(conn: &Connection, id: &Uuid) -> Result<Customer, DatabaseError> {
    get_customer(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Customer".into(),
        id: id.to_string(),
    })
}

/// All customers for one owner in insertion order; the matcher relies on
/// this stable iteration order for deterministic tie-breaks.
pub fn get_customers_by_owner(
    conn: &Connection,
    owner_id: &Uuid,
) -> Result<Vec<Customer>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE owner_id = ?1 ORDER BY created_at ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![owner_id.to_string()], map_customer_row)?;
    let mut customers = Vec::new();
    for row in rows {
        customers.push(row??);
    }
    Ok(customers)
}

fn map_customer_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<Customer, DatabaseError>> {
    let id: String = row.get(0)?;
    let owner_id: String = row.get(1)?;
    let name: String = row.get(2)?;
    let company: Option<String> = row.get(3)?;
    let email: Option<String> = row.get(4)?;
    let phone: Option<String> = row.get(5)?;
    let address: Option<String> = row.get(6)?;
    let created_at: String = row.get(7)?;

    Ok((|| {
        Ok(Customer {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            owner_id: Uuid::parse_str(&owner_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            name,
            company,
            email,
            phone,
            address,
            created_at: parse_ts(&created_at),
        })
    })())
}
