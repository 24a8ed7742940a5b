use std::{error::Error, sync::Arc};

use dotenvy::dotenv;

use slotwise::{
    config::{AppConfig, StorageBackend},
    create_router,
    database::{create_database_pool, run_migrations},
    store::{InventoryStore, MemoryStore, PgStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn InventoryStore> = match config.backend {
        StorageBackend::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let pool = create_database_pool(database_url, config.max_connections).await?;
            run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory storage; slot assignments are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let app = create_router(AppState::new(store));

    let addr = config.bind_address();
    log::info!("slotwise server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
