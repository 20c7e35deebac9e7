//! Billing Domain
//!
//! The bill lifecycle for a fixed monthly tariff:
//!
//! - [`BillGenerator`] issues one pending bill per active customer for the
//!   period that just closed
//! - [`PaymentRecorder`] settles a bill, stores the payment and hands the
//!   invoice to the renderer and dispatcher ports
//! - [`OverdueSweeper`] moves unpaid bills past their due date to overdue
//! - [`BillingScheduler`] drives generation and the sweep on a wall clock
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{PaymentRecorder, RecordPayment, PaymentMode};
//!
//! let receipt = recorder
//!     .record(RecordPayment { bill_id, mode: PaymentMode::Upi })
//!     .await?;
//! assert_eq!(receipt.bill.status, BillStatus::Paid);
//! ```

pub mod bill;
pub mod payment;
pub mod error;
pub mod ports;
pub mod generator;
pub mod recorder;
pub mod service;
pub mod overdue;
pub mod scheduler;

pub use bill::{Bill, BillStatus, BillingPolicy, NewBill, DEFAULT_GRACE_DAYS};
pub use payment::{Payment, PaymentMode};
pub use error::{BillingError, ErrorCategory};
pub use ports::{BillLedger, InvoiceArtifact, InvoiceDispatcher, InvoiceRenderer, PaymentLedger};
pub use generator::{BillGenerator, GenerationReport};
pub use recorder::{PaymentReceipt, PaymentRecorder, RecordPayment, SettlementJournal, SettlementStep};
pub use service::BillService;
pub use overdue::{OverdueSweeper, SweepReport};
pub use scheduler::{next_daily_run, next_monthly_run, BillingScheduler, SchedulerHandle};

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{InMemoryBillLedger, InMemoryPaymentLedger, RecordingDispatcher, StubInvoiceRenderer};
