//! Party domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur in the customer directory
#[derive(Debug, Error)]
pub enum PartyError {
    /// Customer with the given ID was not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// A customer with the same email is already registered
    #[error("Duplicate customer: {0}")]
    DuplicateCustomer(String),

    /// Invalid customer data provided
    #[error("Invalid customer data: {0}")]
    InvalidData(String),

    /// Customer validation failed
    #[error("Customer validation failed: {0}")]
    ValidationFailed(String),
}

impl From<PartyError> for PortError {
    fn from(err: PartyError) -> Self {
        match err {
            PartyError::CustomerNotFound(id) => PortError::not_found("Customer", id),
            PartyError::DuplicateCustomer(msg) => PortError::conflict(msg),
            PartyError::InvalidData(msg) | PartyError::ValidationFailed(msg) => {
                PortError::validation(msg)
            }
        }
    }
}
