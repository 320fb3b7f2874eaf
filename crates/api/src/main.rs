//! Water-Quality Classification Service - Main Entry Point

use anyhow::Result;
use api::config::AppConfig;
use api::{init_logging, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    init_logging(&config.log_level);

    info!(
        "=== Water Quality Service v{} ===",
        env!("CARGO_PKG_VERSION")
    );
    info!("Backend: {}", config.model_backend);

    run_server(config).await
}
