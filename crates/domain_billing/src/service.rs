//! Bill queries and manual bill creation

use std::sync::Arc;

use tracing::info;

use core_kernel::BillId;
use domain_party::CustomerDirectory;

use crate::bill::{Bill, NewBill};
use crate::error::BillingError;
use crate::payment::Payment;
use crate::ports::{BillLedger, PaymentLedger};

#[derive(Clone)]
pub struct BillService {
    bills: Arc<dyn BillLedger>,
    payments: Arc<dyn PaymentLedger>,
    customers: Arc<dyn CustomerDirectory>,
}

impl BillService {
    pub fn new(
        bills: Arc<dyn BillLedger>,
        payments: Arc<dyn PaymentLedger>,
        customers: Arc<dyn CustomerDirectory>,
    ) -> Self {
        Self {
            bills,
            payments,
            customers,
        }
    }

    /// Creates a bill outside the monthly run
    ///
    /// The customer must exist. A taken bill id or (customer, period) is a
    /// `DuplicateBill` error.
    pub async fn create_bill(&self, request: NewBill) -> Result<Bill, BillingError> {
        let bill = request.into_bill()?;

        self.customers
            .get_customer(&bill.customer_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    BillingError::CustomerNotFound(bill.customer_id.clone())
                } else {
                    BillingError::Storage(e)
                }
            })?;

        self.bills.insert(&bill).await.map_err(|e| {
            if e.is_conflict() {
                BillingError::DuplicateBill(e.to_string())
            } else {
                BillingError::Storage(e)
            }
        })?;

        info!(bill_id = %bill.bill_id, customer_id = %bill.customer_id, period = %bill.period, "Bill created manually");
        Ok(bill)
    }

    pub async fn get_bill(&self, id: &BillId) -> Result<Bill, BillingError> {
        self.bills.get(id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::BillNotFound(id.clone())
            } else {
                BillingError::Storage(e)
            }
        })
    }

    /// Returns the payment recorded against a bill
    ///
    /// `PaymentNotFound` if the bill does not exist or has no payment yet.
    pub async fn payment_for_bill(&self, id: &BillId) -> Result<Payment, BillingError> {
        self.payments
            .find_by_bill(id)
            .await?
            .ok_or_else(|| BillingError::PaymentNotFound(id.clone()))
    }
}
