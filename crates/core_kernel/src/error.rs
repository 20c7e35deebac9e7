//! Kernel error type
//!
//! Wraps the value-type errors so callers can convert any of them with `?`.

use thiserror::Error;

use crate::money::MoneyError;
use crate::period::PeriodError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Period error: {0}")]
    Period(#[from] PeriodError),

    /// A bill, customer or payment id that cannot be used
    #[error("{kind} {reason}")]
    InvalidIdentifier { kind: &'static str, reason: String },
}

impl CoreError {
    pub fn invalid_identifier(kind: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidIdentifier {
            kind,
            reason: reason.into(),
        }
    }
}
