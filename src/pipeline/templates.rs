//! Reusable task templates: keyword auto-categorization, keyword tagging,
//! and confidence-weighted running-average statistics, updated every time
//! an approved task is created.

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_template_by_name, insert_template, update_template};
use crate::db::DatabaseError;
use crate::models::{TaskRecord, TaskTemplate};

/// Category keyword table, first match wins. Keywords are matched
/// case-folded against the task name and description.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("demolition", &["démolition", "demolition", "dépose", "depose"]),
    ("plumbing", &["plomberie", "plumbing", "sanitaire"]),
    ("electrical", &["électri", "electri", "câblage", "cablage"]),
    ("painting", &["peinture", "paint"]),
    ("carpentry", &["menuiserie", "carpentry", "charpente"]),
    ("tiling", &["carrelage", "faïence", "faience", "tiling"]),
    ("masonry", &["maçonnerie", "maconnerie", "masonry", "cloison"]),
    ("design", &["design", "conception", "maquette"]),
    ("development", &["développement", "development", "site web", "logiciel", "application"]),
    ("consulting", &["conseil", "consulting", "audit", "étude", "etude"]),
    ("maintenance", &["maintenance", "entretien", "dépannage", "depannage"]),
    ("cleaning", &["nettoyage", "cleaning"]),
];

/// Auto-categorize a task by keyword; None when nothing matches.
pub fn categorize_task(name: &str, description: Option<&str>) -> Option<String> {
    let haystack = fold(name, description);
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(category, _)| category.to_string())
}

/// All matching category keywords become tags.
pub fn extract_tags(name: &str, description: Option<&str>) -> Vec<String> {
    let haystack = fold(name, description);
    CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(category, _)| category.to_string())
        .collect()
}

fn fold(name: &str, description: Option<&str>) -> String {
    let mut haystack = name.to_lowercase();
    if let Some(desc) = description {
        haystack.push(' ');
        haystack.push_str(&desc.to_lowercase());
    }
    haystack
}

/// Register one approved task against the owner's template library.
///
/// `weight` is the observation confidence in 0.0–1.0; statistics are
/// running averages weighted by it, so low-confidence extractions nudge
/// the averages less than reviewed high-confidence ones.
pub fn register_task_usage(
    conn: &Connection,
    owner_id: &Uuid,
    task: &TaskRecord,
    weight: f64,
) -> Result<TaskTemplate, DatabaseError> {
    let weight = weight.clamp(0.0, 1.0);

    match get_template_by_name(conn, owner_id, &task.name)? {
        Some(mut template) => {
            let prior_weight = template.confidence * template.usage_count as f64;
            let new_weight = prior_weight + weight;

            template.avg_hours = weighted_average(
                template.avg_hours,
                prior_weight,
                task.estimated_hours,
                weight,
            );
            template.avg_rate =
                weighted_average(template.avg_rate, prior_weight, task.hourly_rate, weight);

            template.usage_count += 1;
            template.confidence = if template.usage_count > 0 {
                new_weight / template.usage_count as f64
            } else {
                weight
            };

            for tag in extract_tags(&task.name, task.description.as_deref()) {
                if !template.tags.contains(&tag) {
                    template.tags.push(tag);
                }
            }
            if template.category.is_none() {
                template.category = categorize_task(&task.name, task.description.as_deref());
            }
            template.updated_at = Utc::now();

            update_template(conn, &template)?;
            Ok(template)
        }
        None => {
            let mut template = TaskTemplate::new(*owner_id, &task.name);
            template.category = categorize_task(&task.name, task.description.as_deref());
            template.tags = extract_tags(&task.name, task.description.as_deref());
            template.usage_count = 1;
            template.avg_hours = task.estimated_hours;
            template.avg_rate = task.hourly_rate;
            template.confidence = weight;

            insert_template(conn, &template)?;
            Ok(template)
        }
    }
}

fn weighted_average(
    current: Option<f64>,
    current_weight: f64,
    incoming: Option<f64>,
    incoming_weight: f64,
) -> Option<f64> {
    match (current, incoming) {
        (None, None) => None,
        (Some(v), None) => Some(v),
        (None, Some(v)) => Some(v),
        (Some(a), Some(b)) => {
            let total = current_weight + incoming_weight;
            if total <= 0.0 {
                Some((a + b) / 2.0)
            } else {
                Some((a * current_weight + b * incoming_weight) / total)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn task(name: &str, hours: Option<f64>, rate: Option<f64>) -> TaskRecord {
        let mut task = TaskRecord::new(Uuid::new_v4(), name);
        task.estimated_hours = hours;
        task.hourly_rate = rate;
        task
    }

    #[test]
    fn categorization_by_keyword() {
        assert_eq!(categorize_task("Peinture murale", None).as_deref(), Some("painting"));
        assert_eq!(
            categorize_task("Dépose ancienne cuisine", None).as_deref(),
            Some("demolition")
        );
        assert_eq!(
            categorize_task("Installation", Some("câblage complet du tableau")).as_deref(),
            Some("electrical")
        );
        assert_eq!(categorize_task("Réunion de suivi", None), None);
    }

    #[test]
    fn tags_collect_all_matches() {
        let tags = extract_tags("Peinture et nettoyage de fin de chantier", None);
        assert!(tags.contains(&"painting".to_string()));
        assert!(tags.contains(&"cleaning".to_string()));
    }

    #[test]
    fn first_usage_creates_template() {
        let conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();

        let template =
            register_task_usage(&conn, &owner, &task("Peinture", Some(8.0), Some(45.0)), 0.9)
                .unwrap();

        assert_eq!(template.usage_count, 1);
        assert_eq!(template.avg_hours, Some(8.0));
        assert_eq!(template.avg_rate, Some(45.0));
        assert_eq!(template.category.as_deref(), Some("painting"));
        assert!((template.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn repeated_usage_updates_weighted_averages() {
        let conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();

        register_task_usage(&conn, &owner, &task("Peinture", Some(8.0), None), 1.0).unwrap();
        let template =
            register_task_usage(&conn, &owner, &task("peinture", Some(12.0), None), 1.0).unwrap();

        assert_eq!(template.usage_count, 2, "name lookup is case-insensitive");
        assert_eq!(template.avg_hours, Some(10.0));
        assert!((template.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn low_confidence_observation_moves_average_less() {
        let conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();

        register_task_usage(&conn, &owner, &task("Câblage", Some(10.0), None), 1.0).unwrap();
        let template =
            register_task_usage(&conn, &owner, &task("Câblage", Some(20.0), None), 0.25).unwrap();

        // Weighted mean (10·1.0 + 20·0.25) / 1.25 = 12, not the plain mean 15.
        let avg = template.avg_hours.unwrap();
        assert!((avg - 12.0).abs() < 1e-9, "got {avg}");
        assert!((template.confidence - 0.625).abs() < 1e-9);
    }

    #[test]
    fn missing_statistics_fill_in_without_dilution() {
        let conn = open_memory_database().unwrap();
        let owner = Uuid::new_v4();

        register_task_usage(&conn, &owner, &task("Audit", None, None), 0.8).unwrap();
        let template =
            register_task_usage(&conn, &owner, &task("Audit", Some(6.0), Some(90.0)), 0.8)
                .unwrap();

        assert_eq!(template.avg_hours, Some(6.0));
        assert_eq!(template.avg_rate, Some(90.0));
        assert_eq!(template.category.as_deref(), Some("consulting"));
    }
}
