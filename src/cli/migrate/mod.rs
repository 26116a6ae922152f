//! Migrate command - prepares the PostgreSQL customer table

use anyhow::bail;
use tracing::info;

use crate::config::StorageBackend;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{run_storage_migrations, PostgresMigrator, StorageConfig};

pub async fn run() -> anyhow::Result<()> {
    let config = super::load_config()?;
    logging::init_logging(&super::logging_config(&config.logging));

    if config.storage.backend != StorageBackend::Postgres {
        bail!("Migrations require storage.backend = \"postgres\"");
    }

    let pg_config = match config.storage.to_storage_config() {
        StorageConfig::Postgres(pg_config) => pg_config,
        StorageConfig::InMemory => bail!("PostgreSQL storage is not configured"),
    };

    let pool = pg_config.connect().await?;
    run_storage_migrations(&pool, &config.storage.table).await?;

    let version = PostgresMigrator::new(pool)
        .current_version(&config.storage.table)
        .await?;
    info!(
        table = %config.storage.table,
        version = ?version,
        "Migrations complete"
    );

    Ok(())
}
