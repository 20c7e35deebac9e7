//! Customer Directory Domain
//!
//! Holds the customer records the billing engine bills and invoices. The
//! engine never mutates a customer; registration and status changes belong
//! to the directory's own surfaces.

pub mod customer;
pub mod error;
pub mod ports;

pub use customer::{Customer, CustomerStatus, NewCustomer};
pub use error::PartyError;
pub use ports::CustomerDirectory;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryCustomerDirectory;
