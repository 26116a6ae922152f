//! Customer entity and identifier

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation::{validate_customer_id, CustomerValidationError};
use crate::domain::storage::{StorageEntity, StorageKey};

/// Customer identifier, always held in normalized (trimmed, uppercase) form
/// so that `alfki` and `ALFKI` address the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Validate and normalize a caller supplied identifier
    pub fn new(id: impl AsRef<str>) -> Result<Self, CustomerValidationError> {
        let id = id.as_ref();
        validate_customer_id(id)?;
        Ok(Self(id.trim().to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used in resource locations
    pub fn to_route_segment(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl TryFrom<String> for CustomerId {
    type Error = CustomerValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CustomerId> for String {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for CustomerId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// A Northwind customer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: CustomerId,
    #[validate(length(min = 1, max = 40))]
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 30))]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 30))]
    pub contact_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 60))]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 15))]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 15))]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10))]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 15))]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 24))]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 24))]
    pub fax: Option<String>,
}

impl Customer {
    /// Create a customer with only the required columns set
    pub fn new(customer_id: CustomerId, company_name: impl Into<String>) -> Self {
        Self {
            customer_id,
            company_name: company_name.into(),
            contact_name: None,
            contact_title: None,
            address: None,
            city: None,
            region: None,
            postal_code: None,
            country: None,
            phone: None,
            fax: None,
        }
    }

    pub fn with_contact(mut self, name: impl Into<String>, title: impl Into<String>) -> Self {
        self.contact_name = Some(name.into());
        self.contact_title = Some(title.into());
        self
    }

    pub fn with_address(
        mut self,
        address: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        self.address = Some(address.into());
        self.city = Some(city.into());
        self.postal_code = Some(postal_code.into());
        self.country = Some(country.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Check the column constraints of the customers table
    pub fn check(&self) -> Result<(), CustomerValidationError> {
        self.validate().map_err(CustomerValidationError::from)
    }

    /// Exact, case-sensitive country match
    pub fn is_in_country(&self, country: &str) -> bool {
        self.country.as_deref() == Some(country)
    }
}

impl StorageEntity for Customer {
    type Key = CustomerId;

    fn key(&self) -> &Self::Key {
        &self.customer_id
    }
}
