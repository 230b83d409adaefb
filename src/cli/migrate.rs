use anyhow::Result;
use royella_store::SqliteStore;

use royella::Config;

/// Create the database if needed and apply pending migrations
#[tracing::instrument(skip(config))]
pub async fn migrate(config: Config) -> Result<()> {
    tracing::info!("Running database migrations...");

    let store = SqliteStore::connect(&config.database.url, 1).await?;
    store.migrate().await?;
    store.pool().close().await;

    tracing::info!("Migrations completed successfully");

    Ok(())
}
