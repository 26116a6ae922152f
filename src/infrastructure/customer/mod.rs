//! Customer infrastructure - the shared cache and the cache-aside repository

mod cache;
mod repository;

pub use cache::{CustomerCache, CustomerMap};
pub use repository::{CachedCustomerRepository, DEFAULT_STORE_TIMEOUT};
