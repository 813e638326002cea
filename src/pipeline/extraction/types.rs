use serde::{Deserialize, Serialize};

use super::ExtractionError;
use crate::models::document::ConfidenceScores;
use crate::models::enums::{DocumentType, Language};

/// Complete, validated result of one extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub document_type: DocumentType,
    pub language: Language,
    pub confidence_scores: ConfidenceScores,
    pub customer: ExtractedCustomer,
    pub project: Option<ExtractedProject>,
    pub tasks: Vec<ExtractedTask>,
    pub invoice_or_estimate: ExtractedBilling,
}

/// Customer fields as extracted from the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

impl ExtractedCustomer {
    /// A customer is identifiable when it carries a name or a company.
    pub fn has_identity(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
            || self.company.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.company.as_deref())
            .unwrap_or("(unnamed)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub amount: Option<f64>,
    pub category: Option<String>,
}

impl ExtractedTask {
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    pub fn has_time_estimate(&self) -> bool {
        self.estimated_hours.is_some() || self.actual_hours.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBilling {
    pub number: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub valid_until: Option<String>,
    pub subtotal: Option<f64>,
    pub tax_rate: Option<f64>,
    pub tax_amount: Option<f64>,
    pub total: Option<f64>,
    pub currency: Option<String>,
}

/// One rendered page handed to the extraction boundary.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub index: u32,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// The external extraction service: page images in, raw JSON out.
/// The call is a black box here; schema validation happens on our side.
pub trait ExtractionClient {
    fn extract(&self, pages: &[PageImage]) -> Result<serde_json::Value, ExtractionError>;
}
