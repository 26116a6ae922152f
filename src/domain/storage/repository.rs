//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Key-based CRUD primitives over the durable store.
///
/// Mutations report the number of rows they affected instead of failing on
/// a missing or duplicate key; callers decide what a count other than one
/// means. `Err` is reserved for failures of the store itself.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Fetches every row
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Fetches a single row by key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Inserts a new row. A row that already exists is left alone and
    /// reported as zero affected rows.
    async fn insert(&self, entity: &E) -> Result<u64, DomainError>;

    /// Replaces the row stored under the entity's key
    async fn update(&self, entity: &E) -> Result<u64, DomainError>;

    /// Deletes the row stored under `key`
    async fn delete(&self, key: &E::Key) -> Result<u64, DomainError>;

    /// Number of stored rows
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}
