pub mod billing;
pub mod customer;
pub mod document;
pub mod feedback;
pub mod model_version;
pub mod parse_result;
pub mod preview;
pub mod project;
pub mod template;

pub use billing::*;
pub use customer::*;
pub use document::*;
pub use feedback::*;
pub use model_version::*;
pub use parse_result::*;
pub use preview::*;
pub use project::*;
pub use template::*;

use chrono::{DateTime, NaiveDate, Utc};

/// Parse an RFC 3339 timestamp column, tolerating legacy rows.
pub(crate) fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

pub(crate) fn parse_opt_ts(s: Option<String>) -> Option<DateTime<Utc>> {
    s.as_deref().map(parse_ts)
}

pub(crate) fn parse_opt_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
}
