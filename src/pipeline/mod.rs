pub mod approval;
pub mod batch;
pub mod dispatch;
pub mod extraction;
pub mod numbering;
pub mod processor;
pub mod quality;
pub mod templates;

pub use approval::*;
pub use batch::*;
pub use dispatch::*;
pub use numbering::*;
pub use processor::*;
pub use quality::*;
pub use templates::*;

use thiserror::Error;

use crate::db::DatabaseError;
use extraction::ExtractionError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Extraction validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Cannot read source file {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
