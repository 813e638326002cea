//! In-process job dispatch: independent, asynchronously scheduled parse
//! and approval units with no ordering guarantee between documents.
//!
//! Stands in for the external at-least-once task queue; duplicate
//! delivery is harmless because parsing and approval are idempotent
//! (upsert-on-id, terminal-status checks).

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use rusqlite::Connection;
use uuid::Uuid;

use super::approval::approve_preview;
use super::processor::IngestionPipeline;

#[derive(Debug, Clone)]
pub enum Job {
    ParseDocument { document_id: Uuid },
    ApprovePreview { preview_id: Uuid },
}

/// The queue boundary the API layer talks to.
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: Job);
}

/// Single worker thread draining a channel of jobs against the shared
/// connection. Job failures are logged and recorded on the affected
/// document/preview by the pipeline itself, never propagated as panics.
pub struct WorkerQueue {
    sender: mpsc::Sender<Job>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerQueue {
    pub fn start(db: Arc<Mutex<Connection>>, pipeline: Arc<IngestionPipeline>) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();

        let handle = std::thread::spawn(move || {
            for job in receiver {
                run_job(&db, &pipeline, job);
            }
            tracing::debug!("Job queue drained, worker exiting");
        });

        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Close the queue and wait for already-enqueued work to finish.
    pub fn shutdown(mut self) {
        // Replacing the sender drops the original one, closing the
        // channel; the worker drains what was enqueued and exits.
        let (closed, _) = mpsc::channel();
        self.sender = closed;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Job worker panicked");
            }
        }
    }
}

impl JobQueue for WorkerQueue {
    fn enqueue(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::error!("Job queue is closed, job dropped");
        }
    }
}

fn run_job(db: &Arc<Mutex<Connection>>, pipeline: &Arc<IngestionPipeline>, job: Job) {
    let mut conn = match db.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    match job {
        Job::ParseDocument { document_id } => {
            // Errors are already recorded on the document state machine.
            if let Err(e) = pipeline.process_document(&conn, &document_id) {
                tracing::warn!(document_id = %document_id, error = %e, "Parse job failed");
            }
        }
        Job::ApprovePreview { preview_id } => {
            if let Err(e) = approve_preview(&mut conn, &preview_id) {
                tracing::warn!(preview_id = %preview_id, error = %e, "Approval job failed");
            }
        }
    }
}
