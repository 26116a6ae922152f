//! Process-wide customer cache

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::info;

use crate::domain::{Customer, CustomerId, DomainError, Storage};
use crate::infrastructure::observability::set_customer_cache_size;

/// Shared owner of the cached customer map.
///
/// Created once per process and handed to every repository instance. The
/// map is filled by a single bulk load from the store the first time a
/// repository is opened over it; concurrent first openings wait on that one
/// load instead of issuing their own.
#[derive(Debug, Default)]
pub struct CustomerCache {
    map: OnceCell<CustomerMap>,
}

impl CustomerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the map from `store` unless a previous load already succeeded.
    ///
    /// A failed load leaves the cache empty, so a later call may try again.
    pub async fn load(&self, store: &dyn Storage<Customer>) -> Result<&CustomerMap, DomainError> {
        self.map
            .get_or_try_init(|| async move {
                let start = Instant::now();
                let customers = store.list().await?;
                let map = CustomerMap::from_customers(customers);

                info!(
                    count = map.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Customer cache loaded"
                );
                set_customer_cache_size(map.len());

                Ok(map)
            })
            .await
    }

    /// The loaded map, or `None` before the first successful load
    pub fn get(&self) -> Option<&CustomerMap> {
        self.map.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.map.initialized()
    }
}

/// Normalized customer ID to the most recently committed snapshot.
///
/// Every operation locks only the shard holding its key. Values are
/// immutable `Arc` snapshots, so a reader can never observe a record that is
/// being replaced.
#[derive(Debug, Default)]
pub struct CustomerMap {
    entries: DashMap<CustomerId, Arc<Customer>>,
}

impl CustomerMap {
    pub fn from_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let entries = customers
            .into_iter()
            .map(|customer| (customer.customer_id.clone(), Arc::new(customer)))
            .collect();

        Self { entries }
    }

    pub fn get(&self, id: &CustomerId) -> Option<Arc<Customer>> {
        self.entries.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &CustomerId) -> bool {
        self.entries.contains_key(id)
    }

    /// Copy of every cached customer, ordered by ID
    pub fn snapshot(&self) -> Vec<Customer> {
        let mut customers: Vec<Customer> = self
            .entries
            .iter()
            .map(|entry| entry.value().as_ref().clone())
            .collect();

        customers.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        customers
    }

    /// Inserts or replaces the entry for the customer's ID
    pub fn upsert(&self, customer: Customer) -> Arc<Customer> {
        let snapshot = Arc::new(customer);
        self.entries
            .insert(snapshot.customer_id.clone(), Arc::clone(&snapshot));
        set_customer_cache_size(self.entries.len());
        snapshot
    }

    /// Replaces the entry for `id` only if it still holds `expected`.
    ///
    /// `expected` must be a snapshot previously returned by [`get`](Self::get);
    /// any write to the key since then, including a removal, makes the swap
    /// fail and leaves the map untouched.
    pub fn compare_and_swap(
        &self,
        id: &CustomerId,
        expected: &Arc<Customer>,
        replacement: Customer,
    ) -> bool {
        match self.entries.get_mut(id) {
            Some(mut current) if Arc::ptr_eq(current.value(), expected) => {
                *current.value_mut() = Arc::new(replacement);
                true
            }
            _ => false,
        }
    }

    /// Removes the entry for `id` only if it still holds `expected`.
    ///
    /// A key that was rewritten or already removed since `expected` was read
    /// is left alone.
    pub fn remove_if_current(&self, id: &CustomerId, expected: &Arc<Customer>) -> bool {
        let removed = self
            .entries
            .remove_if(id, |_, current| Arc::ptr_eq(current, expected))
            .is_some();
        set_customer_cache_size(self.entries.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
