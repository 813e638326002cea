pub mod client;
pub mod types;
pub mod validation;

pub use client::*;
pub use types::*;
pub use validation::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extraction service unreachable at {0}")]
    Connection(String),

    #[error("Extraction service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Extraction returned non-JSON payload: {0}")]
    NonJson(String),
}
