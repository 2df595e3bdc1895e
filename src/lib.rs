pub mod api;
pub mod client;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export client types
pub use client::{ApiClient, ClientError, EntityPanel};

// Export logic types
pub use logic::{
    export_csv, parse_rows, resolve_label, run_import, ImportBatch, ImportReport, LabelIndex,
    RowOutcome, RowStatus,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{EntityStore, MemoryStore, PostgresStore, Store};

use axum::serve;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppConfig, StoreBackend};

/// Open the configured store, seed it when `LOAD_SEED_DATA=true`, and serve
/// the API until the listener fails.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.database.backend {
        StoreBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let store =
                PostgresStore::new(&database_url, config.database.max_connections).await?;

            log::info!("Running database migrations...");
            store.migrate().await?;
            serve_store(store, &config).await
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on shutdown");
            serve_store(MemoryStore::new(), &config).await
        }
    }
}

async fn serve_store<S: Store + 'static>(store: S, config: &AppConfig) -> anyhow::Result<()> {
    // Load seed data for demonstration (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        log::info!("Loading seed data...");
        seed::load_seed_data(&store).await?;
    }

    let app = routes::create_router::<S>().with_state(Arc::new(store));

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Ecommerce admin API running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
