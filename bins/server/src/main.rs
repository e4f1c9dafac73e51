//! Unidata API Server
//!
//! Main entry point for the attachment storage service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use unidata_api::{AppState, create_router};
use unidata_core::storage::{AttachmentStorageConfig, AttachmentStorageService};
use unidata_shared::{AppConfig, LoggingConfig};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration (also reads .env)
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    // Storage backend is chosen once here
    let storage_config =
        AttachmentStorageConfig::load().context("failed to load storage configuration")?;
    let storage = AttachmentStorageService::from_config(&storage_config)
        .context("failed to initialize attachment storage")?;
    info!(
        provider = %storage.provider(),
        max_file_size = storage.limits().max_file_size,
        "Attachment storage configured"
    );

    let app = create_router(AppState::new(storage), config.server.body_limit_bytes);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
