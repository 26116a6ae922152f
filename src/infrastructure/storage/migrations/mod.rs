//! Database migrations infrastructure

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

const CREATE_BOOKKEEPING_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        target TEXT NOT NULL,
        version BIGINT NOT NULL,
        description TEXT NOT NULL,
        installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        success BOOLEAN NOT NULL DEFAULT TRUE,
        PRIMARY KEY (target, version)
    )
"#;

const IS_APPLIED_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM _migrations WHERE target = $1 AND version = $2)";

const RECORD_SQL: &str =
    "INSERT INTO _migrations (target, version, description) VALUES ($1, $2, $3)";

const CURRENT_VERSION_SQL: &str =
    "SELECT MAX(version) FROM _migrations WHERE target = $1 AND success = TRUE";

/// PostgreSQL migrator that records applied migrations in `_migrations`,
/// keyed by target table and version
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(CREATE_BOOKKEEPING_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to create migrations table: {}", e))
            })?;

        Ok(())
    }

    async fn is_applied(&self, migration: &Migration) -> Result<bool, DomainError> {
        sqlx::query_scalar(IS_APPLIED_SQL)
            .bind(&migration.target)
            .bind(migration.version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Applies a single migration inside a transaction. Returns false when it
    /// was already applied.
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open transaction: {}", e)))?;

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {} for {}: {}",
                    migration.version, migration.target, e
                ))
            })?;

        sqlx::query(RECORD_SQL)
            .bind(&migration.target)
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {} for {}: {}",
                    migration.version, migration.target, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }

    /// Returns the latest migration version applied to `target`
    pub async fn current_version(&self, target: &str) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar(CURRENT_VERSION_SQL)
            .bind(target)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// A schema change for one table. Applied at most once per `(target, version)`.
#[derive(Debug, Clone)]
pub struct Migration {
    pub target: String,
    pub version: i64,
    pub description: String,
    pub up: String,
}

impl Migration {
    pub fn new(
        target: impl Into<String>,
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            version,
            description: description.into(),
            up: up.into(),
        }
    }

    pub fn key(&self) -> (&str, i64) {
        (self.target.as_str(), self.version)
    }
}

/// Migrations for the storage layer, in ascending version order
pub fn storage_migrations(table_name: &str) -> Vec<Migration> {
    vec![Migration::new(
        table_name,
        1,
        format!("Create {} table", table_name),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                key VARCHAR(5) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_country ON {table} ((data->>'country'));
            "#,
            table = table_name
        ),
    )]
}

/// Runs all pending storage migrations
pub async fn run_storage_migrations(pool: &PgPool, table_name: &str) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in storage_migrations(table_name) {
        if migrator.run_migration(&migration).await? {
            info!(
                version = migration.version,
                description = %migration.description,
                "Applied migration"
            );
        }
    }

    Ok(())
}
