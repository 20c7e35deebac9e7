//! Payment recording
//!
//! Settling a bill touches two ledgers and two external collaborators:
//!
//! 1. read the bill and check it is payable
//! 2. read the customer
//! 3. compare-and-swap the bill to `paid`
//! 4. insert the payment, reverting step 3 if that fails
//! 5. render the invoice, then dispatch it
//!
//! Nothing is written before step 3. Failures in step 5 leave the payment
//! committed and are reported with its id.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use core_kernel::{BillId, Clock, PaymentId, PortError};
use domain_party::CustomerDirectory;

use crate::bill::{Bill, BillStatus};
use crate::error::BillingError;
use crate::payment::{Payment, PaymentMode};
use crate::ports::{BillLedger, InvoiceDispatcher, InvoiceRenderer, PaymentLedger};

/// One completed step of a settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SettlementStep {
    BillMarkedPaid { from: BillStatus },
    PaymentRecorded { payment_id: PaymentId },
    BillReverted { to: BillStatus },
    InvoiceRendered { file_name: String },
    InvoiceDispatched,
}

/// Audit trail of a single settlement attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementJournal {
    pub bill_id: BillId,
    pub steps: Vec<SettlementStep>,
}

impl SettlementJournal {
    fn new(bill_id: BillId) -> Self {
        Self {
            bill_id,
            steps: Vec::new(),
        }
    }

    fn push(&mut self, step: SettlementStep) {
        self.steps.push(step);
    }

    /// Returns true if the journal contains a step of the same kind
    pub fn contains(&self, step: &SettlementStep) -> bool {
        self.steps
            .iter()
            .any(|s| std::mem::discriminant(s) == std::mem::discriminant(step))
    }
}

/// Payment request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayment {
    pub bill_id: BillId,
    pub mode: PaymentMode,
}

/// Successful settlement
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub bill: Bill,
    pub journal: SettlementJournal,
}

/// Settles bills
#[derive(Clone)]
pub struct PaymentRecorder {
    bills: Arc<dyn BillLedger>,
    payments: Arc<dyn PaymentLedger>,
    customers: Arc<dyn CustomerDirectory>,
    renderer: Arc<dyn InvoiceRenderer>,
    dispatcher: Arc<dyn InvoiceDispatcher>,
    clock: Arc<dyn Clock>,
}

impl PaymentRecorder {
    pub fn new(
        bills: Arc<dyn BillLedger>,
        payments: Arc<dyn PaymentLedger>,
        customers: Arc<dyn CustomerDirectory>,
        renderer: Arc<dyn InvoiceRenderer>,
        dispatcher: Arc<dyn InvoiceDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bills,
            payments,
            customers,
            renderer,
            dispatcher,
            clock,
        }
    }

    /// Records a full payment against a bill and delivers its invoice
    ///
    /// # Errors
    ///
    /// - `BillNotFound` / `CustomerNotFound` before anything is written
    /// - `AlreadySettled` if the bill is paid, `Conflict` if a concurrent
    ///   payment won the race
    /// - `Settlement` if the payment could not be stored (the bill is reverted)
    /// - `InvoiceDelivery` if rendering or mailing failed after the commit
    pub async fn record(&self, request: RecordPayment) -> Result<PaymentReceipt, BillingError> {
        let RecordPayment { bill_id, mode } = request;

        let bill = self.bills.get(&bill_id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::BillNotFound(bill_id.clone())
            } else {
                BillingError::Storage(e)
            }
        })?;

        if !bill.status.is_payable() {
            return Err(BillingError::AlreadySettled {
                bill_id,
                status: bill.status,
            });
        }

        let customer = self.customers.get_customer(&bill.customer_id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::CustomerNotFound(bill.customer_id.clone())
            } else {
                BillingError::Storage(e)
            }
        })?;

        let mut journal = SettlementJournal::new(bill_id.clone());
        let now = self.clock.now();
        let previous = bill.status;

        let bill = self
            .bills
            .transition(&bill_id, previous, BillStatus::Paid, Some(now))
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    BillingError::Conflict(format!("bill {} was settled concurrently", bill_id))
                } else {
                    BillingError::Storage(e)
                }
            })?;
        journal.push(SettlementStep::BillMarkedPaid { from: previous });
        info!(bill_id = %bill_id, from = %previous, "Bill marked paid");

        let payment = Payment::settling(&bill, mode, now);
        if let Err(e) = self.payments.insert(&payment).await {
            return Err(self.compensate(journal, previous, e).await);
        }
        journal.push(SettlementStep::PaymentRecorded {
            payment_id: payment.payment_id.clone(),
        });
        info!(
            bill_id = %bill_id,
            payment_id = %payment.payment_id,
            amount = %payment.amount_paid,
            mode = %mode,
            "Payment recorded"
        );

        let delivery = async {
            let artifact = self.renderer.render(&customer, &bill, &payment).await?;
            journal.push(SettlementStep::InvoiceRendered {
                file_name: artifact.file_name.clone(),
            });
            self.dispatcher.dispatch(&customer, &bill, &artifact).await?;
            journal.push(SettlementStep::InvoiceDispatched);
            Ok::<(), PortError>(())
        };

        if let Err(e) = delivery.await {
            error!(
                bill_id = %bill_id,
                payment_id = %payment.payment_id,
                error = %e,
                steps = ?journal.steps,
                "Invoice delivery failed after payment commit"
            );
            return Err(BillingError::InvoiceDelivery {
                payment_id: payment.payment_id,
                source: e,
            });
        }

        info!(bill_id = %bill_id, steps = ?journal.steps, "Settlement complete");
        Ok(PaymentReceipt {
            payment,
            bill,
            journal,
        })
    }

    async fn compensate(
        &self,
        mut journal: SettlementJournal,
        previous: BillStatus,
        cause: PortError,
    ) -> BillingError {
        let bill_id = journal.bill_id.clone();
        match self
            .bills
            .transition(&bill_id, BillStatus::Paid, previous, None)
            .await
        {
            Ok(_) => {
                journal.push(SettlementStep::BillReverted { to: previous });
                warn!(bill_id = %bill_id, error = %cause, "Payment write failed, bill reverted");
            }
            Err(revert) => {
                error!(
                    bill_id = %bill_id,
                    error = %cause,
                    revert_error = %revert,
                    "Payment write failed and bill could not be reverted"
                );
            }
        }
        BillingError::Settlement {
            message: cause.to_string(),
            journal,
        }
    }
}
