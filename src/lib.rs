pub mod api;
pub mod config;
pub mod db;
pub mod feedback;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod training;

use tracing_subscriber::EnvFilter;

/// Initialize structured logging. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
