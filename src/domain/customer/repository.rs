//! Customer repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::Customer;
use crate::domain::DomainError;

/// Repository through which request handlers read and mutate customers.
///
/// Identifiers are accepted in any letter case and normalized before use.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Snapshot of every known customer
    async fn retrieve_all(&self) -> Result<Vec<Customer>, DomainError>;

    /// Customer by ID, `None` when unknown
    async fn retrieve(&self, id: &str) -> Result<Option<Customer>, DomainError>;

    /// Persist a new customer and return the committed record
    async fn create(&self, customer: Customer) -> Result<Customer, DomainError>;

    /// Replace the customer stored under `id` and return the committed record
    async fn update(&self, id: &str, customer: Customer) -> Result<Customer, DomainError>;

    /// Remove the customer stored under `id`
    async fn delete(&self, id: &str) -> Result<(), DomainError>;

    /// Number of known customers
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.retrieve_all().await?.len())
    }
}
