//! Billing ports
//!
//! The ledgers own bill and payment persistence; the invoice ports turn a
//! settled bill into a document and deliver it. Adapters live in
//! `infra_db`, `infra_documents` and `infra_mail`.
//!
//! ```rust,ignore
//! use domain_billing::ports::BillLedger;
//!
//! let bill = ledger
//!     .transition(&bill_id, BillStatus::Pending, BillStatus::Paid, Some(now))
//!     .await?;
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::{BillId, BillingPeriod, CustomerId, DomainPort, HealthCheckable, PortError};
use domain_party::Customer;

use crate::bill::{Bill, BillStatus};
use crate::payment::Payment;

/// Durable store of bills
#[async_trait]
pub trait BillLedger: DomainPort + HealthCheckable {
    /// Inserts a new bill
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the bill id is taken or the customer already
    /// has a bill for the period.
    async fn insert(&self, bill: &Bill) -> Result<(), PortError>;

    /// Retrieves a bill by ID
    async fn get(&self, id: &BillId) -> Result<Bill, PortError>;

    /// Finds the bill for a customer and period, if any
    async fn find_for_period(
        &self,
        customer_id: &CustomerId,
        period: BillingPeriod,
    ) -> Result<Option<Bill>, PortError>;

    /// Moves a bill from `expected` to `next` atomically
    ///
    /// The write only happens if the stored status still equals `expected`.
    /// `paid_date` is stored when `next` is `Paid` and cleared otherwise.
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` if the bill does not exist,
    /// `PortError::Conflict` if the stored status differs from `expected`.
    async fn transition(
        &self,
        id: &BillId,
        expected: BillStatus,
        next: BillStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<Bill, PortError>;

    /// Lists pending bills whose due date is before `date`
    async fn list_pending_due_before(&self, date: NaiveDate) -> Result<Vec<Bill>, PortError>;
}

/// Durable store of payments
#[async_trait]
pub trait PaymentLedger: DomainPort + HealthCheckable {
    /// Inserts a payment
    ///
    /// # Errors
    ///
    /// `PortError::Conflict` if the payment id is taken or the bill already
    /// has a payment.
    async fn insert(&self, payment: &Payment) -> Result<(), PortError>;

    /// Finds the payment recorded against a bill, if any
    async fn find_by_bill(&self, bill_id: &BillId) -> Result<Option<Payment>, PortError>;
}

/// A rendered invoice document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceArtifact {
    /// Attachment name, `<bill_id>.pdf`
    pub file_name: String,
    /// Where the document was written, if it was persisted
    pub path: Option<PathBuf>,
    /// Document bytes
    pub bytes: Vec<u8>,
}

/// Renders the invoice for a settled bill
#[async_trait]
pub trait InvoiceRenderer: Send + Sync + 'static {
    async fn render(
        &self,
        customer: &Customer,
        bill: &Bill,
        payment: &Payment,
    ) -> Result<InvoiceArtifact, PortError>;
}

/// Delivers a rendered invoice to the customer
#[async_trait]
pub trait InvoiceDispatcher: Send + Sync + 'static {
    async fn dispatch(
        &self,
        customer: &Customer,
        bill: &Bill,
        artifact: &InvoiceArtifact,
    ) -> Result<(), PortError>;
}

/// In-memory ledgers and invoice doubles
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::HealthCheckResult;

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryBillLedger {
        bills: Arc<RwLock<HashMap<BillId, Bill>>>,
        failing_customers: Arc<RwLock<HashSet<CustomerId>>>,
    }

    impl InMemoryBillLedger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with bills for testing
        pub async fn with_bills(bills: Vec<Bill>) -> Self {
            let ledger = Self::new();
            {
                let mut map = ledger.bills.write().await;
                for bill in bills {
                    map.insert(bill.bill_id.clone(), bill);
                }
            }
            ledger
        }

        /// Makes inserts for this customer fail with a connection error
        pub async fn fail_inserts_for(&self, customer_id: CustomerId) {
            self.failing_customers.write().await.insert(customer_id);
        }

        pub async fn clear_insert_failures(&self) {
            self.failing_customers.write().await.clear();
        }

        /// Returns every stored bill, ordered by id
        pub async fn all(&self) -> Vec<Bill> {
            let mut bills: Vec<Bill> = self.bills.read().await.values().cloned().collect();
            bills.sort_by(|a, b| a.bill_id.cmp(&b.bill_id));
            bills
        }
    }

    impl DomainPort for InMemoryBillLedger {}

    #[async_trait]
    impl HealthCheckable for InMemoryBillLedger {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("in-memory-bill-ledger")
        }
    }

    #[async_trait]
    impl BillLedger for InMemoryBillLedger {
        async fn insert(&self, bill: &Bill) -> Result<(), PortError> {
            if self.failing_customers.read().await.contains(&bill.customer_id) {
                return Err(PortError::connection("bill store unavailable"));
            }
            let mut map = self.bills.write().await;
            if map.contains_key(&bill.bill_id) {
                return Err(PortError::conflict(format!("bill {} already exists", bill.bill_id)));
            }
            if map
                .values()
                .any(|b| b.customer_id == bill.customer_id && b.period == bill.period)
            {
                return Err(PortError::conflict(format!(
                    "customer {} already has a bill for {}",
                    bill.customer_id, bill.period
                )));
            }
            map.insert(bill.bill_id.clone(), bill.clone());
            Ok(())
        }

        async fn get(&self, id: &BillId) -> Result<Bill, PortError> {
            self.bills
                .read()
                .await
                .get(id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Bill", id))
        }

        async fn find_for_period(
            &self,
            customer_id: &CustomerId,
            period: BillingPeriod,
        ) -> Result<Option<Bill>, PortError> {
            Ok(self
                .bills
                .read()
                .await
                .values()
                .find(|b| &b.customer_id == customer_id && b.period == period)
                .cloned())
        }

        async fn transition(
            &self,
            id: &BillId,
            expected: BillStatus,
            next: BillStatus,
            paid_date: Option<DateTime<Utc>>,
        ) -> Result<Bill, PortError> {
            let mut map = self.bills.write().await;
            let bill = map.get_mut(id).ok_or_else(|| PortError::not_found("Bill", id))?;
            if bill.status != expected {
                return Err(PortError::conflict(format!(
                    "bill {} is {}, expected {}",
                    id, bill.status, expected
                )));
            }
            bill.apply_transition(next, paid_date)
                .map_err(|e| PortError::conflict(e.to_string()))?;
            Ok(bill.clone())
        }

        async fn list_pending_due_before(&self, date: NaiveDate) -> Result<Vec<Bill>, PortError> {
            let map = self.bills.read().await;
            let mut due: Vec<Bill> = map.values().filter(|b| b.is_past_due(date)).cloned().collect();
            due.sort_by(|a, b| a.bill_id.cmp(&b.bill_id));
            Ok(due)
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct InMemoryPaymentLedger {
        payments: Arc<RwLock<HashMap<BillId, Payment>>>,
        fail_inserts: Arc<AtomicBool>,
    }

    impl InMemoryPaymentLedger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent insert fail with a connection error
        pub fn fail_inserts(&self, fail: bool) {
            self.fail_inserts.store(fail, Ordering::SeqCst);
        }

        pub async fn count(&self) -> usize {
            self.payments.read().await.len()
        }
    }

    impl DomainPort for InMemoryPaymentLedger {}

    #[async_trait]
    impl HealthCheckable for InMemoryPaymentLedger {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("in-memory-payment-ledger")
        }
    }

    #[async_trait]
    impl PaymentLedger for InMemoryPaymentLedger {
        async fn insert(&self, payment: &Payment) -> Result<(), PortError> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(PortError::connection("payment store unavailable"));
            }
            let mut map = self.payments.write().await;
            if map.contains_key(&payment.bill_id) {
                return Err(PortError::conflict(format!(
                    "bill {} already has a payment",
                    payment.bill_id
                )));
            }
            if map.values().any(|p| p.payment_id == payment.payment_id) {
                return Err(PortError::conflict(format!(
                    "payment {} already exists",
                    payment.payment_id
                )));
            }
            map.insert(payment.bill_id.clone(), payment.clone());
            Ok(())
        }

        async fn find_by_bill(&self, bill_id: &BillId) -> Result<Option<Payment>, PortError> {
            Ok(self.payments.read().await.get(bill_id).cloned())
        }
    }

    /// Renders a fixed byte payload; can be switched to fail
    #[derive(Debug, Default, Clone)]
    pub struct StubInvoiceRenderer {
        fail: Arc<AtomicBool>,
    }

    impl StubInvoiceRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let renderer = Self::default();
            renderer.fail.store(true, Ordering::SeqCst);
            renderer
        }
    }

    #[async_trait]
    impl InvoiceRenderer for StubInvoiceRenderer {
        async fn render(
            &self,
            _customer: &Customer,
            bill: &Bill,
            _payment: &Payment,
        ) -> Result<InvoiceArtifact, PortError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PortError::internal("renderer failed"));
            }
            Ok(InvoiceArtifact {
                file_name: format!("{}.pdf", bill.bill_id),
                path: None,
                bytes: b"%PDF-stub".to_vec(),
            })
        }
    }

    /// Records dispatched invoices; can be switched to fail
    #[derive(Debug, Default, Clone)]
    pub struct RecordingDispatcher {
        sent: Arc<RwLock<Vec<(String, BillId, String)>>>,
        fail: Arc<AtomicBool>,
    }

    impl RecordingDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let dispatcher = Self::default();
            dispatcher.fail.store(true, Ordering::SeqCst);
            dispatcher
        }

        /// (recipient email, bill id, attachment name) per dispatch
        pub async fn sent(&self) -> Vec<(String, BillId, String)> {
            self.sent.read().await.clone()
        }
    }

    #[async_trait]
    impl InvoiceDispatcher for RecordingDispatcher {
        async fn dispatch(
            &self,
            customer: &Customer,
            bill: &Bill,
            artifact: &InvoiceArtifact,
        ) -> Result<(), PortError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PortError::connection("mail transport unavailable"));
            }
            self.sent.write().await.push((
                customer.email.clone(),
                bill.bill_id.clone(),
                artifact.file_name.clone(),
            ));
            Ok(())
        }
    }
}
