//! Domain layer - Core business logic and entities

pub mod customer;
pub mod error;
pub mod storage;

pub use customer::{Customer, CustomerId, CustomerRepository, CustomerValidationError};
pub use error::DomainError;
pub use storage::{Storage, StorageEntity, StorageKey};

impl From<CustomerValidationError> for DomainError {
    fn from(err: CustomerValidationError) -> Self {
        match err {
            CustomerValidationError::EmptyId
            | CustomerValidationError::IdTooLong(_)
            | CustomerValidationError::InvalidIdCharacters => DomainError::invalid_id(err.to_string()),
            CustomerValidationError::IdMismatch { .. }
            | CustomerValidationError::InvalidFields(_) => DomainError::validation(err.to_string()),
        }
    }
}
