use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Facturo";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse confidence threshold for safe auto-approval.
pub const DEFAULT_AUTO_APPROVE_CONFIDENCE: i64 = 90;

/// Task-quality score required for safe auto-approval.
pub const AUTO_APPROVE_QUALITY: i64 = 80;

/// Minimum eligible feedback records before a training dataset is built.
pub const MIN_TRAINING_FEEDBACK: i64 = 50;

/// Extraction boundary timeout. The boundary owns the actual limit; this
/// caps our side so a stall surfaces as an error document, never an
/// indefinite `processing` state.
pub const EXTRACTION_TIMEOUT_SECS: u64 = 180;

/// Get the application data directory (~/Facturo)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Facturo")
}

/// Default database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("facturo.db")
}

/// Directory for assembled fine-tuning datasets
pub fn datasets_dir() -> PathBuf {
    app_data_dir().join("datasets")
}

pub fn default_log_filter() -> &'static str {
    "facturo=info"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Facturo"));
    }

    #[test]
    fn database_under_app_data() {
        assert!(database_path().starts_with(app_data_dir()));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
