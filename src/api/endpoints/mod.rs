pub mod batch;
pub mod documents;
pub mod models;
pub mod previews;
