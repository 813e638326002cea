pub mod endpoints;
pub mod error;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::{build_router, serve};

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::pipeline::dispatch::JobQueue;
use crate::pipeline::quality::TaskQualityScorer;
use crate::training::ModelVersionManager;

/// Shared state behind every endpoint: the SQLite connection, the job
/// queue for async units of work, and the model lifecycle manager.
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub queue: Arc<dyn JobQueue>,
    pub models: Arc<ModelVersionManager>,
    pub quality: Arc<TaskQualityScorer>,
}

impl AppState {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        queue: Arc<dyn JobQueue>,
        models: Arc<ModelVersionManager>,
        quality: Arc<TaskQualityScorer>,
    ) -> Self {
        Self {
            db,
            queue,
            models,
            quality,
        }
    }

    /// Lock the shared connection; a poisoned lock is recovered rather
    /// than propagated, the data itself is guarded by SQLite.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
