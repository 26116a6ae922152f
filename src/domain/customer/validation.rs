//! Customer validation

use thiserror::Error;
use validator::ValidationErrors;

/// Errors that can occur while validating customer input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CustomerValidationError {
    #[error("Customer ID cannot be empty")]
    EmptyId,

    #[error("Customer ID cannot exceed {0} characters")]
    IdTooLong(usize),

    #[error("Customer ID can only contain alphanumeric characters")]
    InvalidIdCharacters,

    #[error("Customer ID '{route}' does not match payload ID '{payload}'")]
    IdMismatch { route: String, payload: String },

    #[error("Invalid customer fields: {0}")]
    InvalidFields(String),
}

pub(crate) const MAX_CUSTOMER_ID_LENGTH: usize = 5;

/// Validate a customer ID as supplied by a caller, before normalization
pub fn validate_customer_id(id: &str) -> Result<(), CustomerValidationError> {
    let id = id.trim();

    if id.is_empty() {
        return Err(CustomerValidationError::EmptyId);
    }

    if id.chars().count() > MAX_CUSTOMER_ID_LENGTH {
        return Err(CustomerValidationError::IdTooLong(MAX_CUSTOMER_ID_LENGTH));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CustomerValidationError::InvalidIdCharacters);
    }

    Ok(())
}

impl From<ValidationErrors> for CustomerValidationError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort_unstable();
        Self::InvalidFields(fields.join(", "))
    }
}
