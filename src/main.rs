use std::sync::Arc;

use anyhow::Result;
use unimarket_orderservice::{
    app_state::AppState,
    bootstrap, config,
    config::StoreBackend,
    db, gateway,
    routes::{self, health::SERVICE_NAME},
    store::{CommerceStore, MemoryStore, PgStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;

    let store: Arc<dyn CommerceStore> = match config.store {
        StoreBackend::Postgres => {
            let url = config.database.url()?;

            tracing::info!("Running migrations...");
            let migrations_count = db::run_migrations(url).await?;
            tracing::info!("Run {} new migrations successfully", migrations_count);

            let pool = db::create_pool(url, config.database.max_connections).await?;
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let gateway = gateway::from_config(&config.gateway, reqwest::Client::new())?;
    let state = AppState::new(store, gateway, &config.orders);

    tracing::info!("Bootstrapping...");
    bootstrap::serve(SERVICE_NAME, routes::app(state), &config.server).await?;
    Ok(())
}
