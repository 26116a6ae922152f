//! Customer domain module
//!
//! Customers are keyed by a short case-insensitive identifier. All reads
//! are served from an in-process cache that fronts the durable store.

mod entity;
mod repository;
mod validation;

pub use entity::{Customer, CustomerId};
pub use repository::CustomerRepository;
#[cfg(test)]
pub use repository::MockCustomerRepository;
pub use validation::{validate_customer_id, CustomerValidationError};
