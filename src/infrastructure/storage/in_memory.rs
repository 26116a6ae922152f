//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

/// Thread-safe in-memory storage implementation
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    rows: RwLock<HashMap<String, E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Creates storage pre-populated with rows
    pub fn with_entities(entities: Vec<E>) -> Self {
        let rows = entities
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect();

        Self {
            rows: RwLock::new(rows),
        }
    }

    fn read_lock_error<T>(e: T) -> DomainError
    where
        T: std::fmt::Display,
    {
        DomainError::storage(format!("Failed to acquire read lock: {}", e))
    }

    fn write_lock_error<T>(e: T) -> DomainError
    where
        T: std::fmt::Display,
    {
        DomainError::storage(format!("Failed to acquire write lock: {}", e))
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let rows = self.rows.read().map_err(Self::read_lock_error)?;
        Ok(rows.values().cloned().collect())
    }

    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let rows = self.rows.read().map_err(Self::read_lock_error)?;
        Ok(rows.get(key.as_str()).cloned())
    }

    async fn insert(&self, entity: &E) -> Result<u64, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut rows = self.rows.write().map_err(Self::write_lock_error)?;

        if rows.contains_key(&key) {
            return Ok(0);
        }

        rows.insert(key, entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &E) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().map_err(Self::write_lock_error)?;

        match rows.get_mut(entity.key().as_str()) {
            Some(row) => {
                *row = entity.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, key: &E::Key) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().map_err(Self::write_lock_error)?;
        Ok(u64::from(rows.remove(key.as_str()).is_some()))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let rows = self.rows.read().map_err(Self::read_lock_error)?;
        Ok(rows.len())
    }
}
