//! Domain store entities the approval orchestrator commits into.
//!
//! Their own validation/CRUD rules live outside this subsystem; here they
//! are plain records the matcher reads and the orchestrator writes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ProjectStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(owner_id: Uuid, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            company: None,
            email: None,
            phone: None,
            address: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub customer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(owner_id: Uuid, customer_id: Uuid, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            customer_id,
            name: name.to_string(),
            description: None,
            status: ProjectStatus::Active,
            budget: None,
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(project_id: Uuid, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
            description: None,
            estimated_hours: None,
            actual_hours: None,
            hourly_rate: None,
            amount: None,
            category: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub customer_id: Uuid,
    pub project_id: Option<Uuid>,
    pub number: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Option<f64>,
    pub tax_rate: Option<f64>,
    pub tax_amount: Option<f64>,
    pub total: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub customer_id: Uuid,
    pub project_id: Option<Uuid>,
    pub number: String,
    pub issue_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub subtotal: Option<f64>,
    pub tax_rate: Option<f64>,
    pub tax_amount: Option<f64>,
    pub total: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// A reusable task template, updated every time an approved task is created.
/// Statistics are confidence-weighted running averages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub usage_count: i64,
    pub avg_hours: Option<f64>,
    pub avg_rate: Option<f64>,
    /// Running average of observation confidence, 0.0–1.0.
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskTemplate {
    pub fn new(owner_id: Uuid, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            category: None,
            tags: Vec::new(),
            usage_count: 0,
            avg_hours: None,
            avg_rate: None,
            confidence: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}
