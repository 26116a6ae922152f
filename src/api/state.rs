//! Application state shared by the HTTP handlers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Customer, CustomerRepository, DomainError, Storage};
use crate::infrastructure::customer::{CachedCustomerRepository, CustomerCache};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<dyn CustomerRepositoryProvider>,
    pub cache: Arc<CustomerCache>,
}

impl AppState {
    /// State whose handlers open cache-backed repositories over `store`
    pub fn new(
        cache: Arc<CustomerCache>,
        store: Arc<dyn Storage<Customer>>,
        store_timeout: Duration,
    ) -> Self {
        let provider = CachedRepositoryProvider {
            cache: Arc::clone(&cache),
            store,
            store_timeout,
        };

        Self {
            customers: Arc::new(provider),
            cache,
        }
    }

    pub fn with_provider(
        cache: Arc<CustomerCache>,
        customers: Arc<dyn CustomerRepositoryProvider>,
    ) -> Self {
        Self { customers, cache }
    }
}

/// Opens the repository a single request works against
#[async_trait]
pub trait CustomerRepositoryProvider: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn CustomerRepository>, DomainError>;
}

struct CachedRepositoryProvider {
    cache: Arc<CustomerCache>,
    store: Arc<dyn Storage<Customer>>,
    store_timeout: Duration,
}

#[async_trait]
impl CustomerRepositoryProvider for CachedRepositoryProvider {
    async fn open(&self) -> Result<Arc<dyn CustomerRepository>, DomainError> {
        let repository =
            CachedCustomerRepository::open(Arc::clone(&self.cache), Arc::clone(&self.store))
                .await?
                .with_store_timeout(self.store_timeout);

        Ok(Arc::new(repository))
    }
}
