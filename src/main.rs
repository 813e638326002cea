use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use facturo::api::{self, AppState};
use facturo::config;
use facturo::db::sqlite::open_database;
use facturo::pipeline::dispatch::WorkerQueue;
use facturo::pipeline::extraction::client::HttpExtractionClient;
use facturo::pipeline::processor::IngestionPipeline;
use facturo::pipeline::quality::TaskQualityScorer;
use facturo::training::ModelVersionManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    facturo::init_tracing();

    std::fs::create_dir_all(config::app_data_dir())?;
    let conn = open_database(&config::database_path())?;
    let db = Arc::new(Mutex::new(conn));

    let extraction_url =
        std::env::var("EXTRACTION_URL").unwrap_or_else(|_| "http://localhost:8600".to_string());
    let extractor = HttpExtractionClient::new(&extraction_url, config::EXTRACTION_TIMEOUT_SECS);
    let pipeline = Arc::new(IngestionPipeline::new(Box::new(extractor)));

    let queue = Arc::new(WorkerQueue::start(db.clone(), pipeline));
    let state = Arc::new(AppState::new(
        db,
        queue,
        Arc::new(ModelVersionManager::new()),
        Arc::new(TaskQualityScorer::heuristic_only()),
    ));

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8700".to_string())
        .parse()?;
    api::serve(state, addr).await?;
    Ok(())
}
