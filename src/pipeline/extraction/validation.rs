//! Schema validation for the extraction boundary payload.
//!
//! Applied between the raw boundary call and ParseResult construction.
//! All violations are collected and reported together so a reviewer sees
//! the full list, not just the first failure.

use serde_json::Value;
use std::str::FromStr;

use super::types::ExtractedDocument;
use crate::models::document::ConfidenceScores;
use crate::models::enums::{DocumentType, Language};

const REQUIRED_KEYS: &[&str] = &[
    "document_type",
    "language",
    "confidence_scores",
    "customer",
    "tasks",
    "invoice_or_estimate",
];

const CONFIDENCE_SECTIONS: &[&str] = &["overall", "customer", "project", "tasks", "pricing"];

/// Validate a raw extraction payload and normalize it into an
/// `ExtractedDocument`. Returns every violated check on failure.
pub fn validate_extraction(raw: &Value) -> Result<ExtractedDocument, Vec<String>> {
    let mut violations = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => return Err(vec!["payload is not a JSON object".to_string()]),
    };

    for key in REQUIRED_KEYS {
        if !obj.contains_key(*key) {
            violations.push(format!("missing required field: {key}"));
        }
    }

    let document_type = obj
        .get("document_type")
        .and_then(Value::as_str)
        .and_then(|s| DocumentType::from_str(s).ok())
        .filter(|t| !matches!(t, DocumentType::Unknown));
    if obj.contains_key("document_type") && document_type.is_none() {
        violations.push(format!(
            "invalid document_type: {} (expected invoice or estimate)",
            obj.get("document_type").cloned().unwrap_or(Value::Null)
        ));
    }

    let language = obj
        .get("language")
        .and_then(Value::as_str)
        .and_then(|s| Language::from_str(s).ok());
    if obj.contains_key("language") && language.is_none() {
        violations.push(format!(
            "invalid language: {} (expected en or fr)",
            obj.get("language").cloned().unwrap_or(Value::Null)
        ));
    }

    let confidence = parse_confidence_scores(obj.get("confidence_scores"), &mut violations);

    if let Some(tasks) = obj.get("tasks") {
        match tasks.as_array() {
            Some(list) if list.is_empty() => violations.push("task list is empty".to_string()),
            Some(_) => {}
            None => violations.push("tasks is not an array".to_string()),
        }
    }

    if let Some(billing) = obj.get("invoice_or_estimate") {
        let total = billing.get("total");
        if !total.is_some_and(Value::is_number) {
            violations.push(format!(
                "invoice_or_estimate.total is not numeric: {}",
                total.cloned().unwrap_or(Value::Null)
            ));
        }
    }

    // Deserialize the sections; serde failures become violations too.
    let customer = obj
        .get("customer")
        .cloned()
        .map(serde_json::from_value::<super::types::ExtractedCustomer>);
    let customer = match customer {
        Some(Ok(c)) => Some(c),
        Some(Err(e)) => {
            violations.push(format!("malformed customer section: {e}"));
            None
        }
        None => None,
    };

    if let Some(ref c) = customer {
        if !c.has_identity() {
            violations.push("customer has neither name nor company".to_string());
        }
    }

    let project = match obj.get("project") {
        Some(Value::Null) | None => None,
        Some(v) => match serde_json::from_value::<super::types::ExtractedProject>(v.clone()) {
            Ok(p) => Some(p),
            Err(e) => {
                violations.push(format!("malformed project section: {e}"));
                None
            }
        },
    };

    let tasks = obj
        .get("tasks")
        .cloned()
        .map(serde_json::from_value::<Vec<super::types::ExtractedTask>>);
    let tasks = match tasks {
        Some(Ok(t)) => t,
        Some(Err(e)) => {
            violations.push(format!("malformed tasks section: {e}"));
            Vec::new()
        }
        None => Vec::new(),
    };

    let billing = obj
        .get("invoice_or_estimate")
        .cloned()
        .map(serde_json::from_value::<super::types::ExtractedBilling>);
    let billing = match billing {
        Some(Ok(b)) => Some(b),
        Some(Err(e)) => {
            violations.push(format!("malformed invoice_or_estimate section: {e}"));
            None
        }
        None => None,
    };

    if !violations.is_empty() {
        return Err(violations);
    }

    // No violations at this point, so the fallbacks are unreachable.
    Ok(ExtractedDocument {
        document_type: document_type.unwrap_or(DocumentType::Unknown),
        language: language.unwrap_or(Language::En),
        confidence_scores: confidence,
        customer: customer.unwrap_or_default(),
        project,
        tasks,
        invoice_or_estimate: billing.unwrap_or_default(),
    })
}

fn parse_confidence_scores(value: Option<&Value>, violations: &mut Vec<String>) -> ConfidenceScores {
    let mut scores = ConfidenceScores::default();
    let obj = match value.and_then(Value::as_object) {
        Some(o) => o,
        None => {
            if value.is_some() {
                violations.push("confidence_scores is not an object".to_string());
            }
            return scores;
        }
    };

    for section in CONFIDENCE_SECTIONS {
        match obj.get(*section).and_then(Value::as_i64) {
            Some(v) if (0..=100).contains(&v) => {
                let slot = match *section {
                    "overall" => &mut scores.overall,
                    "customer" => &mut scores.customer,
                    "project" => &mut scores.project,
                    "tasks" => &mut scores.tasks,
                    _ => &mut scores.pricing,
                };
                *slot = v;
            }
            Some(v) => violations.push(format!(
                "confidence_scores.{section} out of range: {v} (expected 0-100)"
            )),
            None => violations.push(format!(
                "confidence_scores.{section} missing or not an integer"
            )),
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "document_type": "invoice",
            "language": "fr",
            "confidence_scores": {
                "overall": 88, "customer": 92, "project": 75, "tasks": 80, "pricing": 95
            },
            "customer": {
                "name": "Jean Dupont",
                "email": "jean.dupont@example.fr",
                "phone": "+33 6 12 34 56 78",
                "company": "Dupont Rénovation",
                "address": "12 rue des Lilas, 69003 Lyon"
            },
            "project": {
                "name": "Rénovation cuisine",
                "description": "Rénovation complète de la cuisine",
                "start_date": "2026-05-01",
                "end_date": null
            },
            "tasks": [
                {
                    "name": "Démolition",
                    "description": "Dépose de l'ancienne cuisine",
                    "estimated_hours": 16.0,
                    "actual_hours": null,
                    "hourly_rate": 45.0,
                    "amount": 720.0,
                    "category": "demolition"
                }
            ],
            "invoice_or_estimate": {
                "number": "FAC-2026-042",
                "issue_date": "2026-06-15",
                "due_date": "2026-07-15",
                "valid_until": null,
                "subtotal": 720.0,
                "tax_rate": 20.0,
                "tax_amount": 144.0,
                "total": 864.0,
                "currency": "EUR"
            }
        })
    }

    #[test]
    fn valid_payload_normalizes() {
        let doc = validate_extraction(&valid_payload()).unwrap();
        assert_eq!(doc.document_type, DocumentType::Invoice);
        assert_eq!(doc.language, Language::Fr);
        assert_eq!(doc.confidence_scores.overall, 88);
        assert_eq!(doc.customer.name.as_deref(), Some("Jean Dupont"));
        assert_eq!(doc.tasks.len(), 1);
        assert_eq!(doc.invoice_or_estimate.total, Some(864.0));
    }

    #[test]
    fn missing_top_level_keys_all_reported() {
        let errors = validate_extraction(&json!({})).unwrap_err();
        for key in REQUIRED_KEYS {
            assert!(
                errors.iter().any(|e| e.contains(key)),
                "expected violation for {key}, got {errors:?}"
            );
        }
    }

    #[test]
    fn invalid_document_type_rejected() {
        let mut payload = valid_payload();
        payload["document_type"] = json!("receipt");
        let errors = validate_extraction(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("invalid document_type")));
    }

    #[test]
    fn invalid_language_rejected() {
        let mut payload = valid_payload();
        payload["language"] = json!("de");
        let errors = validate_extraction(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("invalid language")));
    }

    #[test]
    fn empty_task_list_rejected() {
        let mut payload = valid_payload();
        payload["tasks"] = json!([]);
        let errors = validate_extraction(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("task list is empty")));
    }

    #[test]
    fn out_of_range_confidence_rejected() {
        let mut payload = valid_payload();
        payload["confidence_scores"]["overall"] = json!(140);
        let errors = validate_extraction(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("overall out of range")));
    }

    #[test]
    fn non_numeric_total_rejected() {
        let mut payload = valid_payload();
        payload["invoice_or_estimate"]["total"] = json!("eight hundred");
        let errors = validate_extraction(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("total is not numeric")));
    }

    #[test]
    fn customer_without_identity_rejected() {
        let mut payload = valid_payload();
        payload["customer"] = json!({"name": "", "company": null});
        let errors = validate_extraction(&payload).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("neither name nor company")));
    }

    #[test]
    fn company_only_customer_accepted() {
        let mut payload = valid_payload();
        payload["customer"] = json!({"name": null, "company": "Acme Corp"});
        let doc = validate_extraction(&payload).unwrap();
        assert_eq!(doc.customer.display_name(), "Acme Corp");
    }

    #[test]
    fn multiple_violations_collected() {
        let mut payload = valid_payload();
        payload["document_type"] = json!("memo");
        payload["tasks"] = json!([]);
        payload["confidence_scores"]["pricing"] = json!(-3);
        let errors = validate_extraction(&payload).unwrap_err();
        assert!(errors.len() >= 3, "expected at least 3 violations, got {errors:?}");
    }
}
