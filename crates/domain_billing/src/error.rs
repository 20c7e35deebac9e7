//! Billing domain errors
//!
//! Every error maps onto one [`ErrorCategory`]; callers branch on the
//! category and show the message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{BillId, CoreError, CustomerId, PaymentId, PortError};

use crate::bill::BillStatus;
use crate::recorder::SettlementJournal;

/// Stable error categories surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid input
    Validation,
    /// Duplicate record or illegal state for the operation
    Conflict,
    /// Referenced bill, payment or customer does not exist
    NotFound,
    /// Storage, rendering or mail transport failure
    Internal,
}

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// Bill does not exist
    #[error("Bill not found: {0}")]
    BillNotFound(BillId),

    /// Bill exists but has no recorded payment
    #[error("Payment not found for bill {0}")]
    PaymentNotFound(BillId),

    /// Customer does not exist
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Bill id or (customer, period) already taken
    #[error("Bill already exists: {0}")]
    DuplicateBill(String),

    /// Payment attempted on a bill that is not payable
    #[error("Bill {bill_id} is already {status}")]
    AlreadySettled {
        bill_id: BillId,
        status: BillStatus,
    },

    /// Another request changed the bill between read and write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Status change that is not an edge of the state machine
    #[error("Invalid transition for bill {bill_id}: {from} -> {to}")]
    InvalidTransition {
        bill_id: BillId,
        from: BillStatus,
        to: BillStatus,
    },

    /// Payment could not be written; the bill transition was compensated
    #[error("Error processing payment for bill {}: {message}", .journal.bill_id)]
    Settlement {
        message: String,
        journal: SettlementJournal,
    },

    /// Payment is recorded but the invoice could not be rendered or mailed
    #[error("Error processing payment {payment_id}: {source}")]
    InvoiceDelivery {
        payment_id: PaymentId,
        #[source]
        source: PortError,
    },

    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(#[source] PortError),
}

impl BillingError {
    /// Returns the stable category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            BillingError::Validation(_) => ErrorCategory::Validation,
            BillingError::BillNotFound(_)
            | BillingError::PaymentNotFound(_)
            | BillingError::CustomerNotFound(_) => ErrorCategory::NotFound,
            BillingError::DuplicateBill(_)
            | BillingError::AlreadySettled { .. }
            | BillingError::Conflict(_)
            | BillingError::InvalidTransition { .. } => ErrorCategory::Conflict,
            BillingError::Settlement { .. }
            | BillingError::InvoiceDelivery { .. }
            | BillingError::Storage(_) => ErrorCategory::Internal,
        }
    }
}

impl From<CoreError> for BillingError {
    fn from(err: CoreError) -> Self {
        BillingError::Validation(err.to_string())
    }
}

impl From<PortError> for BillingError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Validation { message, .. } => BillingError::Validation(message),
            PortError::Conflict { message } => BillingError::Conflict(message),
            other => BillingError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let bill_id = BillId::parse("B1").unwrap();
        assert_eq!(BillingError::BillNotFound(bill_id.clone()).category(), ErrorCategory::NotFound);
        assert_eq!(
            BillingError::AlreadySettled { bill_id, status: BillStatus::Paid }.category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            BillingError::from(PortError::connection("refused")).category(),
            ErrorCategory::Internal
        );
        assert_eq!(
            BillingError::from(PortError::conflict("duplicate")).category(),
            ErrorCategory::Conflict
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = BillingError::BillNotFound(BillId::parse("B9").unwrap());
        assert_eq!(err.to_string(), "Bill not found: B9");

        let err = BillingError::PaymentNotFound(BillId::parse("B9").unwrap());
        assert_eq!(err.to_string(), "Payment not found for bill B9");
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
