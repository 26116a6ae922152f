//! PostgreSQL storage implementation with connection pooling

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/northwind".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Opens a connection pool with these settings
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

/// PostgreSQL storage implementation
///
/// Rows are kept as JSONB snapshots in a `(key, data, created_at, updated_at)`
/// table, one table per entity type.
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table_name: String,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new PostgreSQL storage with the given pool and table name
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    /// Creates a new PostgreSQL storage with its own connection pool
    pub async fn connect(
        config: &PostgresConfig,
        table_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let pool = config.connect().await?;
        Ok(Self::new(pool, table_name))
    }

    fn sql(&self, template: &str) -> String {
        template.replace("{table}", &self.table_name)
    }

    fn decode(row: &PgRow) -> Result<E, DomainError> {
        let data: serde_json::Value = row
            .try_get("data")
            .map_err(|e| DomainError::storage(format!("Failed to read row data: {}", e)))?;

        serde_json::from_value(data)
            .map_err(|e| DomainError::storage(format!("Failed to deserialize row: {}", e)))
    }

    fn encode(entity: &E) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize row: {}", e)))
    }
}

fn query_failed(action: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| DomainError::storage(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let rows = sqlx::query(&self.sql("SELECT data FROM {table} ORDER BY key"))
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("list rows"))?;

        rows.iter().map(Self::decode).collect()
    }

    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let row = sqlx::query(&self.sql("SELECT data FROM {table} WHERE key = $1"))
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("fetch row"))?;

        row.as_ref().map(Self::decode).transpose()
    }

    /// An existing key is left untouched and reported as 0 rows
    async fn insert(&self, entity: &E) -> Result<u64, DomainError> {
        let sql = self.sql(
            "INSERT INTO {table} (key, data) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
        );

        let done = sqlx::query(&sql)
            .bind(entity.key().as_str())
            .bind(Self::encode(entity)?)
            .execute(&self.pool)
            .await
            .map_err(query_failed("insert row"))?;

        Ok(done.rows_affected())
    }

    async fn update(&self, entity: &E) -> Result<u64, DomainError> {
        let sql = self.sql("UPDATE {table} SET data = $2, updated_at = NOW() WHERE key = $1");

        let done = sqlx::query(&sql)
            .bind(entity.key().as_str())
            .bind(Self::encode(entity)?)
            .execute(&self.pool)
            .await
            .map_err(query_failed("update row"))?;

        Ok(done.rows_affected())
    }

    async fn delete(&self, key: &E::Key) -> Result<u64, DomainError> {
        let done = sqlx::query(&self.sql("DELETE FROM {table} WHERE key = $1"))
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(query_failed("delete row"))?;

        Ok(done.rows_affected())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar(&self.sql("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed("count rows"))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }
}
