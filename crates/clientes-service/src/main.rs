//! Clientes Service - HTTP API for customer accounts and their ledger
//!
//! This is the main entry point for the clientes service.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clientes_service::{create_router, AppState, ServiceConfig};
use clientes_store::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,clientes=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Clientes Service");

    // Load configuration from .env and the environment
    let config = ServiceConfig::load();

    tracing::info!(
        listen_addr = %config.listen_addr(),
        db_path = %config.db_path,
        rate_limit_max = config.rate_limit_max,
        "Service configuration loaded"
    );

    let store = open_store(&config).await?;

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr(), "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(not(feature = "rocksdb-backend"))]
async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.db_path, "Opening SQLite store");
    let store =
        clientes_store::SqliteStore::open(&config.db_path, config.db_max_connections).await?;
    Ok(Arc::new(store))
}

#[cfg(feature = "rocksdb-backend")]
#[allow(clippy::unused_async)]
async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.db_path, "Opening RocksDB store");
    let store = clientes_store::RocksStore::open(&config.db_path)?;
    Ok(Arc::new(store))
}
