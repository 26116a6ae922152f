//! Cache-aside customer repository

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::cache::{CustomerCache, CustomerMap};
use crate::domain::{
    Customer, CustomerId, CustomerRepository, CustomerValidationError, DomainError, Storage,
};
use crate::infrastructure::observability::record_cache_operation;

/// Default upper bound for a single store call made by a mutation
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Customer repository that serves reads from the shared [`CustomerCache`]
/// and sends every write to the store before touching the cache.
///
/// Instances are cheap and meant to be opened per request; all of them
/// share the same cache.
#[derive(Debug, Clone)]
pub struct CachedCustomerRepository {
    cache: Arc<CustomerCache>,
    store: Arc<dyn Storage<Customer>>,
    store_timeout: Duration,
}

impl CachedCustomerRepository {
    /// Opens a repository, loading the shared cache from `store` if this is
    /// the first repository opened over it.
    pub async fn open(
        cache: Arc<CustomerCache>,
        store: Arc<dyn Storage<Customer>>,
    ) -> Result<Self, DomainError> {
        cache.load(store.as_ref()).await?;

        Ok(Self {
            cache,
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        })
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    fn map(&self) -> Result<&CustomerMap, DomainError> {
        self.cache
            .get()
            .ok_or_else(|| DomainError::internal("Customer cache is not loaded"))
    }

    /// Awaits a store call, giving up after the configured timeout. A timed
    /// out call is reported as a storage failure.
    async fn call_store<T, F>(&self, operation: &'static str, call: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Store call timed out"
                );
                Err(DomainError::storage(format!(
                    "Store {} timed out after {}ms",
                    operation,
                    self.store_timeout.as_millis()
                )))
            }
        }
    }

    /// Re-reads the store row for `id` after a delete lost its cache race and
    /// drops the cached entry if the row is gone. Returns whether the customer
    /// still exists.
    ///
    /// An entry rewritten while the row is being read is left alone.
    async fn reconcile(&self, map: &CustomerMap, id: &CustomerId) -> Result<bool, DomainError> {
        let current = map.get(id);
        let row = self.call_store("get", self.store.get(id)).await?;

        match (row, current) {
            (None, Some(current)) => {
                map.remove_if_current(id, &current);
                Ok(false)
            }
            (row, _) => Ok(row.is_some()),
        }
    }
}

#[async_trait]
impl CustomerRepository for CachedCustomerRepository {
    async fn retrieve_all(&self) -> Result<Vec<Customer>, DomainError> {
        let customers = self.map()?.snapshot();
        record_cache_operation("retrieve_all", "hit");
        Ok(customers)
    }

    async fn retrieve(&self, id: &str) -> Result<Option<Customer>, DomainError> {
        let id = CustomerId::new(id)?;

        match self.map()?.get(&id) {
            Some(customer) => {
                debug!(customer_id = %id, "Customer cache hit");
                record_cache_operation("retrieve", "hit");
                Ok(Some(customer.as_ref().clone()))
            }
            None => {
                debug!(customer_id = %id, "Customer cache miss");
                record_cache_operation("retrieve", "miss");
                Ok(None)
            }
        }
    }

    async fn create(&self, customer: Customer) -> Result<Customer, DomainError> {
        customer.check()?;
        let map = self.map()?;
        let id = customer.customer_id.clone();

        let affected = self.call_store("insert", self.store.insert(&customer)).await?;

        if affected != 1 {
            warn!(customer_id = %id, affected, "Store did not insert customer");
            record_cache_operation("create", "store_rejected");
            return Err(DomainError::creation_failed(format!(
                "Customer '{}' could not be created",
                id
            )));
        }

        map.upsert(customer.clone());
        info!(customer_id = %id, "Customer created");
        record_cache_operation("create", "applied");

        Ok(customer)
    }

    async fn update(&self, id: &str, customer: Customer) -> Result<Customer, DomainError> {
        let id = CustomerId::new(id)?;

        if id != customer.customer_id {
            return Err(CustomerValidationError::IdMismatch {
                route: id.to_string(),
                payload: customer.customer_id.to_string(),
            }
            .into());
        }

        customer.check()?;
        let map = self.map()?;

        let existing = map
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("Customer '{}' not found", id)))?;

        let affected = self.call_store("update", self.store.update(&customer)).await?;

        if affected != 1 {
            warn!(customer_id = %id, affected, "Store did not update customer");
            record_cache_operation("update", "store_rejected");
            return Err(DomainError::update_failed(format!(
                "Customer '{}' could not be updated",
                id
            )));
        }

        if !map.compare_and_swap(&id, &existing, customer.clone()) {
            warn!(
                customer_id = %id,
                "Customer changed concurrently, cached value left to the other writer"
            );
            record_cache_operation("update", "race_lost");
            return Err(DomainError::cache_race_loss(format!(
                "Customer '{}' was modified concurrently",
                id
            )));
        }

        info!(customer_id = %id, "Customer updated");
        record_cache_operation("update", "applied");

        Ok(customer)
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let id = CustomerId::new(id)?;
        let map = self.map()?;

        let existing = map
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("Customer '{}' not found", id)))?;

        let affected = self.call_store("delete", self.store.delete(&id)).await?;

        if affected != 1 {
            warn!(customer_id = %id, affected, "Store did not delete customer");
            record_cache_operation("delete", "store_rejected");
            return Err(DomainError::delete_failed(format!(
                "Customer '{}' was found but failed to delete",
                id
            )));
        }

        if !map.remove_if_current(&id, &existing) {
            warn!(
                customer_id = %id,
                "Customer changed concurrently, reconciling cached value with the store"
            );
            record_cache_operation("delete", "race_lost");

            if self.reconcile(map, &id).await? {
                return Err(DomainError::cache_race_loss(format!(
                    "Customer '{}' was written concurrently and still exists",
                    id
                )));
            }
        }

        info!(customer_id = %id, "Customer deleted");
        record_cache_operation("delete", "applied");

        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.map()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::sync::Barrier;

    use crate::infrastructure::storage::InMemoryStorage;

    /// Store wrapper that counts calls and can be told to misbehave
    #[derive(Debug, Default)]
    struct CountingStorage {
        inner: InMemoryStorage<Customer>,
        lists: AtomicUsize,
        inserts: AtomicUsize,
        updates: AtomicUsize,
        deletes: AtomicUsize,
        fail: AtomicBool,
        update_barrier: Option<Arc<Barrier>>,
        delay: Option<Duration>,
        delete_pause: Mutex<Option<DeletePause>>,
    }

    /// One-shot pause inside the next store delete. The delete waits on
    /// `reached`, then on `resume`, so a test can run other calls in between.
    #[derive(Debug)]
    struct DeletePause {
        before_row_removed: bool,
        reached: Arc<Barrier>,
        resume: Arc<Barrier>,
    }

    impl DeletePause {
        async fn hold(&self) {
            self.reached.wait().await;
            self.resume.wait().await;
        }
    }

    impl CountingStorage {
        fn with(customers: Vec<Customer>) -> Self {
            Self {
                inner: InMemoryStorage::with_entities(customers),
                ..Default::default()
            }
        }

        fn pause_next_delete(&self, before_row_removed: bool) -> (Arc<Barrier>, Arc<Barrier>) {
            let reached = Arc::new(Barrier::new(2));
            let resume = Arc::new(Barrier::new(2));

            *self.delete_pause.lock().unwrap() = Some(DeletePause {
                before_row_removed,
                reached: reached.clone(),
                resume: resume.clone(),
            });

            (reached, resume)
        }

        fn mutations(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
                + self.updates.load(Ordering::SeqCst)
                + self.deletes.load(Ordering::SeqCst)
        }

        async fn before_call(&self) -> Result<(), DomainError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::storage("connection reset"));
            }

            Ok(())
        }
    }

    #[async_trait]
    impl Storage<Customer> for CountingStorage {
        async fn list(&self) -> Result<Vec<Customer>, DomainError> {
            self.lists.fetch_add(1, Ordering::SeqCst);

            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::storage("connection refused"));
            }

            self.inner.list().await
        }

        async fn get(&self, key: &CustomerId) -> Result<Option<Customer>, DomainError> {
            self.inner.get(key).await
        }

        async fn insert(&self, entity: &Customer) -> Result<u64, DomainError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.before_call().await?;
            self.inner.insert(entity).await
        }

        async fn update(&self, entity: &Customer) -> Result<u64, DomainError> {
            self.updates.fetch_add(1, Ordering::SeqCst);

            if let Some(barrier) = &self.update_barrier {
                barrier.wait().await;
            }

            self.before_call().await?;
            self.inner.update(entity).await
        }

        async fn delete(&self, key: &CustomerId) -> Result<u64, DomainError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            let pause = self.delete_pause.lock().unwrap().take();

            if let Some(pause) = pause.as_ref().filter(|p| p.before_row_removed) {
                pause.hold().await;
            }

            self.before_call().await?;
            let affected = self.inner.delete(key).await?;

            if let Some(pause) = pause.as_ref().filter(|p| !p.before_row_removed) {
                pause.hold().await;
            }

            Ok(affected)
        }
    }

    fn id(value: &str) -> CustomerId {
        CustomerId::new(value).unwrap()
    }

    fn customer(value: &str, company: &str) -> Customer {
        Customer::new(id(value), company)
    }

    fn alfki() -> Customer {
        customer("ALFKI", "Alfreds Futterkiste")
            .with_contact("Maria Anders", "Sales Representative")
            .with_address("Obere Str. 57", "Berlin", "12209", "Germany")
    }

    async fn open(store: Arc<CountingStorage>) -> CachedCustomerRepository {
        CachedCustomerRepository::open(Arc::new(CustomerCache::new()), store)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_concurrent_opens_load_store_once() {
        let cache = Arc::new(CustomerCache::new());
        let store = Arc::new(CountingStorage::with(vec![alfki(), customer("ANATR", "Ana Trujillo")]));

        let opens = (0..8).map(|_| CachedCustomerRepository::open(cache.clone(), store.clone()));
        let repositories = futures::future::join_all(opens).await;

        assert!(repositories.iter().all(|r| r.is_ok()));
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_reported_and_can_be_retried() {
        let cache = Arc::new(CustomerCache::new());
        let broken = Arc::new(CountingStorage::with(vec![alfki()]));
        broken.fail.store(true, Ordering::SeqCst);

        let result = CachedCustomerRepository::open(cache.clone(), broken).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert!(!cache.is_loaded());

        let healthy = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = CachedCustomerRepository::open(cache.clone(), healthy)
            .await
            .unwrap();

        assert_eq!(repository.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retrieve_is_case_insensitive_and_never_hits_store() {
        let store = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = open(store.clone()).await;

        let lower = repository.retrieve("alfki").await.unwrap();
        let upper = repository.retrieve("ALFKI").await.unwrap();

        assert_eq!(lower, Some(alfki()));
        assert_eq!(lower, upper);
        assert_eq!(repository.retrieve("bonap").await.unwrap(), None);
        assert_eq!(store.lists.load(Ordering::SeqCst), 1);
        assert_eq!(store.mutations(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_rejects_invalid_id() {
        let repository = open(Arc::new(CountingStorage::default())).await;

        let result = repository.retrieve("").await;
        assert!(matches!(result, Err(DomainError::InvalidId { .. })));

        let result = repository.retrieve("NOT-AN-ID").await;
        assert!(matches!(result, Err(DomainError::InvalidId { .. })));
    }

    #[tokio::test]
    async fn test_retrieve_all_returns_snapshot() {
        let store = Arc::new(CountingStorage::with(vec![customer("BONAP", "Bon app'"), alfki()]));
        let repository = open(store).await;

        let customers = repository.retrieve_all().await.unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].customer_id.as_str(), "ALFKI");

        repository.create(customer("ANTON", "Antonio Moreno")).await.unwrap();

        assert_eq!(customers.len(), 2);
        assert_eq!(repository.retrieve_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_commits_to_store_then_cache() {
        let store = Arc::new(CountingStorage::default());
        let repository = open(store.clone()).await;

        let created = repository.create(alfki()).await.unwrap();

        assert_eq!(created, alfki());
        assert_eq!(store.inner.get(&id("ALFKI")).await.unwrap(), Some(alfki()));
        assert_eq!(repository.retrieve("alfki").await.unwrap(), Some(alfki()));
    }

    #[tokio::test]
    async fn test_create_existing_key_keeps_store_row() {
        let store = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = open(store.clone()).await;

        let result = repository.create(customer("alfki", "Impostor")).await;

        assert!(matches!(result, Err(DomainError::CreationFailed { .. })));
        assert_eq!(repository.count().await.unwrap(), 1);
        assert_eq!(
            repository.retrieve("ALFKI").await.unwrap(),
            store.inner.get(&id("ALFKI")).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields_before_store() {
        let store = Arc::new(CountingStorage::default());
        let repository = open(store.clone()).await;

        let result = repository.create(customer("ALFKI", "")).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(store.mutations(), 0);
    }

    #[tokio::test]
    async fn test_create_store_error_leaves_cache_untouched() {
        let store = Arc::new(CountingStorage::default());
        let repository = open(store.clone()).await;
        store.fail.store(true, Ordering::SeqCst);

        let result = repository.create(alfki()).await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_timed_out_store_call_leaves_cache_untouched() {
        let store = Arc::new(CountingStorage {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let repository = open(store.clone())
            .await
            .with_store_timeout(Duration::from_millis(10));

        let result = repository.create(alfki()).await;

        assert!(matches!(result, Err(DomainError::Storage { .. })));
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);
        assert_eq!(repository.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_cached_record() {
        let store = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = open(store.clone()).await;

        let mut changed = alfki();
        changed.city = Some("Hamburg".to_string());

        let updated = repository.update("alfki", changed.clone()).await.unwrap();

        assert_eq!(updated, changed);
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), Some(changed.clone()));
        assert_eq!(store.inner.get(&id("ALFKI")).await.unwrap(), Some(changed));
    }

    #[tokio::test]
    async fn test_update_rejects_mismatched_ids_before_store() {
        let store = Arc::new(CountingStorage::with(vec![alfki(), customer("ANATR", "Ana")]));
        let repository = open(store.clone()).await;

        let result = repository.update("ANATR", alfki()).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(store.mutations(), 0);
    }

    #[tokio::test]
    async fn test_update_unknown_customer_never_calls_store() {
        let store = Arc::new(CountingStorage::default());
        let repository = open(store.clone()).await;

        let result = repository.update("ALFKI", alfki()).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_rejected_by_store_keeps_cached_record() {
        let store = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = open(store.clone()).await;
        store.inner.delete(&id("ALFKI")).await.unwrap();

        let result = repository.update("ALFKI", customer("ALFKI", "Gone")).await;

        assert!(matches!(result, Err(DomainError::UpdateFailed { .. })));
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), Some(alfki()));
    }

    #[tokio::test]
    async fn test_concurrent_updates_exactly_one_wins_cache() {
        let store = Arc::new(CountingStorage {
            inner: InMemoryStorage::with_entities(vec![alfki()]),
            update_barrier: Some(Arc::new(Barrier::new(2))),
            ..Default::default()
        });
        let repository = open(store.clone()).await;

        let first = customer("ALFKI", "First Writer");
        let second = customer("ALFKI", "Second Writer");

        let (a, b) = tokio::join!(
            repository.update("ALFKI", first.clone()),
            repository.update("alfki", second.clone())
        );

        let (winner, loser) = match (a, b) {
            (Ok(winner), Err(loser)) | (Err(loser), Ok(winner)) => (winner, loser),
            (a, b) => panic!("expected exactly one winner, got {:?} and {:?}", a, b),
        };

        assert!(matches!(loser, DomainError::CacheRaceLoss { .. }));
        assert!(winner == first || winner == second);
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), Some(winner));
        assert_eq!(store.updates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_delete_then_retrieve_is_absent() {
        let store = Arc::new(CountingStorage::with(vec![alfki(), customer("ANATR", "Ana")]));
        let repository = open(store.clone()).await;

        repository.delete("alfki").await.unwrap();

        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);
        assert_eq!(store.inner.get(&id("ALFKI")).await.unwrap(), None);
        assert!(repository.retrieve("ANATR").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_is_absent_while_other_keys_change() {
        let store = Arc::new(CountingStorage::with(vec![
            alfki(),
            customer("ANATR", "Ana Trujillo"),
            customer("ANTON", "Antonio Moreno"),
        ]));
        let repository = open(store.clone()).await;
        let start = Arc::new(Barrier::new(4));

        let tasks = vec![
            ("delete", "ALFKI", "Deleted"),
            ("create", "BONAP", "Bon app'"),
            ("update", "ANATR", "Ana Trujillo Updated"),
            ("update", "ANTON", "Antonio Moreno Updated"),
        ]
        .into_iter()
        .map(|(operation, key, company)| {
            let repository = repository.clone();
            let start = start.clone();

            tokio::spawn(async move {
                start.wait().await;
                match operation {
                    "delete" => repository.delete(key).await,
                    "create" => repository.create(customer(key, company)).await.map(|_| ()),
                    _ => repository.update(key, customer(key, company)).await.map(|_| ()),
                }
            })
        });

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);
        assert_eq!(store.inner.get(&id("ALFKI")).await.unwrap(), None);

        let companies: Vec<(String, String)> = repository
            .retrieve_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.customer_id.to_string(), c.company_name))
            .collect();

        assert_eq!(
            companies,
            vec![
                ("ANATR".to_string(), "Ana Trujillo Updated".to_string()),
                ("ANTON".to_string(), "Antonio Moreno Updated".to_string()),
                ("BONAP".to_string(), "Bon app'".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_update_racing_delete_never_revives_customer() {
        let store = Arc::new(CountingStorage {
            inner: InMemoryStorage::with_entities(vec![alfki()]),
            update_barrier: Some(Arc::new(Barrier::new(2))),
            ..Default::default()
        });
        let repository = open(store.clone()).await;
        let barrier = store.update_barrier.clone().unwrap();

        let (updated, deleted) = tokio::join!(
            repository.update("ALFKI", customer("ALFKI", "Revived")),
            async {
                barrier.wait().await;
                repository.delete("ALFKI").await
            }
        );

        assert!(matches!(
            updated,
            Err(DomainError::UpdateFailed { .. }) | Err(DomainError::CacheRaceLoss { .. })
        ));
        assert!(deleted.is_ok());
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);
        assert_eq!(store.inner.get(&id("ALFKI")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_landing_during_delete_is_dropped_from_cache() {
        let store = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = open(store.clone()).await;
        let (reached, resume) = store.pause_next_delete(true);

        let (deleted, updated) = tokio::join!(repository.delete("ALFKI"), async {
            reached.wait().await;
            let updated = repository.update("ALFKI", customer("ALFKI", "Changed")).await;
            resume.wait().await;
            updated
        });

        assert!(updated.is_ok());
        assert!(deleted.is_ok());
        assert_eq!(store.inner.get(&id("ALFKI")).await.unwrap(), None);
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_landing_during_delete_stays_cached() {
        let store = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = open(store.clone()).await;
        let (reached, resume) = store.pause_next_delete(false);

        let (deleted, created) = tokio::join!(repository.delete("ALFKI"), async {
            reached.wait().await;
            let created = repository.create(customer("ALFKI", "New")).await;
            resume.wait().await;
            created
        });

        assert!(created.is_ok());
        assert!(matches!(deleted, Err(DomainError::CacheRaceLoss { .. })));

        let company = |c: Option<Customer>| c.map(|c| c.company_name);
        let stored = company(store.inner.get(&id("ALFKI")).await.unwrap());
        let cached = company(repository.retrieve("ALFKI").await.unwrap());
        assert_eq!(stored.as_deref(), Some("New"));
        assert_eq!(cached.as_deref(), Some("New"));

        repository
            .update("ALFKI", customer("ALFKI", "Newer"))
            .await
            .unwrap();
        repository.delete("ALFKI").await.unwrap();

        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);
        assert_eq!(store.inner.get(&id("ALFKI")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_unknown_customer_never_calls_store() {
        let store = Arc::new(CountingStorage::default());
        let repository = open(store.clone()).await;

        let result = repository.delete("ALFKI").await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_rejected_by_store_keeps_cached_record() {
        let store = Arc::new(CountingStorage::with(vec![alfki()]));
        let repository = open(store.clone()).await;
        store.inner.delete(&id("ALFKI")).await.unwrap();

        let result = repository.delete("ALFKI").await;

        assert!(matches!(result, Err(DomainError::DeleteFailed { .. })));
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), Some(alfki()));
    }

    #[tokio::test]
    async fn test_alfki_lifecycle() {
        let store = Arc::new(CountingStorage::default());
        let repository = open(store.clone()).await;

        repository.create(alfki()).await.unwrap();
        assert_eq!(repository.retrieve("alfki").await.unwrap(), Some(alfki()));

        repository.delete("ALFKI").await.unwrap();
        assert_eq!(repository.retrieve("ALFKI").await.unwrap(), None);

        let updates_before = store.updates.load(Ordering::SeqCst);
        let result = repository.update("ALFKI", alfki()).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
        assert_eq!(store.updates.load(Ordering::SeqCst), updates_before);
    }

    #[tokio::test]
    async fn test_repositories_share_one_cache() {
        let cache = Arc::new(CustomerCache::new());
        let store: Arc<dyn Storage<Customer>> = Arc::new(CountingStorage::default());

        let writer = CachedCustomerRepository::open(cache.clone(), store.clone())
            .await
            .unwrap();
        let reader = CachedCustomerRepository::open(cache, store).await.unwrap();

        writer.create(alfki()).await.unwrap();

        assert_eq!(reader.retrieve("alfki").await.unwrap(), Some(alfki()));
    }
}
