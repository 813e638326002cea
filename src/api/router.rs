use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::endpoints;
use super::AppState;

/// Assemble the API router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/documents", post(endpoints::documents::upload))
        .route("/documents/:id", get(endpoints::documents::get_document))
        .route("/documents/:id/reparse", post(endpoints::documents::reparse))
        .route("/previews/:id", get(endpoints::previews::get_preview))
        .route("/previews/:id", patch(endpoints::previews::edit_preview))
        .route("/previews/:id/approve", post(endpoints::previews::approve))
        .route("/previews/:id/reject", post(endpoints::previews::reject))
        .route("/batch/summary", get(endpoints::batch::summary))
        .route("/batch/patterns", get(endpoints::batch::patterns))
        .route("/batch/approve", post(endpoints::batch::bulk_approve))
        .route("/batch/reject", post(endpoints::batch::bulk_reject))
        .route("/batch/auto-approve", post(endpoints::batch::auto_approve))
        .route("/models", get(endpoints::models::list))
        .route("/models/:id/activate", post(endpoints::models::activate))
        .route("/models/rollback", post(endpoints::models::rollback))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<AppState>, addr: std::net::SocketAddr) -> std::io::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API listening");
    axum::serve(listener, router).await
}
