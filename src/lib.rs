pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod navigation;
pub mod services;
pub mod view_state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::{CoreError, CoreState};

/// Process entry point: read configuration, open the store, serve the API
/// until ctrl-c.
pub fn run() -> Result<(), CoreError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CoreError::Io(e.to_string()))?;

    runtime.block_on(serve(config))
}

async fn serve(config: AppConfig) -> Result<(), CoreError> {
    let bind = config.bind;
    // Opening SQLite runs migrations; keep it off the async workers.
    let core = tokio::task::spawn_blocking(move || CoreState::from_config(&config))
        .await
        .map_err(|e| CoreError::Server(e.to_string()))??;
    let core = Arc::new(core);

    let server = api::start_server(core.clone(), bind)
        .await
        .map_err(CoreError::Server)?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {e}");
    }

    core.shutdown();
    server.stop().await;
    Ok(())
}
