//! Core Kernel - Foundational types for the billing system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money types with precise decimal arithmetic
//! - Billing periods and time sources
//! - String-keyed identifiers for customers, bills and payments
//! - The port error type used by all adapters

pub mod money;
pub mod period;
pub mod clock;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use period::{BillingPeriod, PeriodError};
pub use clock::{Clock, SystemClock, ManualClock, Timezone};
pub use identifiers::{CustomerId, BillId, PaymentId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;
