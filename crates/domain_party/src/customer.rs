//! Customer records
//!
//! Customers are owned by the directory. The billing engine only reads them:
//! it needs `status` to decide who gets billed, and the contact fields to
//! render and address an invoice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::CustomerId;

use crate::error::PartyError;

/// Whether a customer is billed by the monthly run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Active => "active",
            CustomerStatus::Inactive => "inactive",
        }
    }
}

impl Default for CustomerStatus {
    fn default() -> Self {
        CustomerStatus::Active
    }
}

impl std::str::FromStr for CustomerStatus {
    type Err = PartyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CustomerStatus::Active),
            "inactive" => Ok(CustomerStatus::Inactive),
            other => Err(PartyError::InvalidData(format!("unknown customer status '{}'", other))),
        }
    }
}

/// A billed customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier
    pub id: CustomerId,
    /// Display name, printed on invoices
    pub name: String,
    /// Invoice recipient; unique within the directory
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Postal address, used for both billing and delivery
    pub address: String,
    /// Billing status
    pub status: CustomerStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns true if the customer takes part in bill generation
    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }
}

/// Fields accepted when registering a customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCustomer {
    /// Optional caller-chosen id; generated when absent
    pub id: Option<CustomerId>,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[serde(default)]
    pub status: CustomerStatus,
}

impl NewCustomer {
    /// Validates the request and builds the record
    pub fn into_customer(self, now: DateTime<Utc>) -> Result<Customer, PartyError> {
        self.validate()
            .map_err(|e| PartyError::ValidationFailed(e.to_string()))?;

        Ok(Customer {
            id: self.id.unwrap_or_else(CustomerId::generate),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_ascii_lowercase(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            status: self.status,
            created_at: now,
            updated_at: now,
        })
    }
}
