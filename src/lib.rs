//! Northwind customers API
//!
//! Customer records served from a process-wide cache that is loaded once
//! from a durable store and kept in step with it:
//! - reads never touch the store
//! - writes commit to the store first, then update the cache
//! - concurrent updates to one customer are reconciled by compare-and-swap

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{Customer, CustomerId, DomainError};
use infrastructure::customer::CustomerCache;
use infrastructure::storage::StorageFactory;
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration.
///
/// The customer cache is loaded before this returns; a failed load is fatal.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage.to_storage_config();
    info!(
        backend = ?storage_config.storage_type(),
        table = %config.storage.table,
        "Opening customer store"
    );

    let seed = if config.storage.seed_sample_data {
        default_customers()?
    } else {
        Vec::new()
    };

    let store =
        StorageFactory::create::<Customer>(&storage_config, &config.storage.table, seed).await?;

    let cache = Arc::new(CustomerCache::new());
    let loaded = cache.load(store.as_ref()).await?.len();
    info!(customers = loaded, "Customer cache warmed up");

    Ok(AppState::new(cache, store, config.storage.store_timeout()))
}

/// Sample Northwind customers for the in-memory backend
fn default_customers() -> Result<Vec<Customer>, DomainError> {
    let customers = vec![
        Customer::new(CustomerId::new("ALFKI")?, "Alfreds Futterkiste")
            .with_contact("Maria Anders", "Sales Representative")
            .with_address("Obere Str. 57", "Berlin", "12209", "Germany")
            .with_phone("030-0074321"),
        Customer::new(
            CustomerId::new("ANATR")?,
            "Ana Trujillo Emparedados y helados",
        )
        .with_contact("Ana Trujillo", "Owner")
        .with_address("Avda. de la Constitución 2222", "México D.F.", "05021", "Mexico")
        .with_phone("(5) 555-4729"),
        Customer::new(CustomerId::new("ANTON")?, "Antonio Moreno Taquería")
            .with_contact("Antonio Moreno", "Owner")
            .with_address("Mataderos  2312", "México D.F.", "05023", "Mexico")
            .with_phone("(5) 555-3932"),
        Customer::new(CustomerId::new("AROUT")?, "Around the Horn")
            .with_contact("Thomas Hardy", "Sales Representative")
            .with_address("120 Hanover Sq.", "London", "WA1 1DP", "UK")
            .with_phone("(171) 555-7788"),
        Customer::new(CustomerId::new("BERGS")?, "Berglunds snabbköp")
            .with_contact("Christina Berglund", "Order Administrator")
            .with_address("Berguvsvägen  8", "Luleå", "S-958 22", "Sweden")
            .with_phone("0921-12 34 65"),
    ];

    for customer in &customers {
        customer.check()?;
    }

    Ok(customers)
}
