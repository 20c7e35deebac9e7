//! Monthly bill generation
//!
//! Creates the missing bill for every active customer for the period that
//! just closed. Runs are idempotent: the ledger's (customer, period)
//! uniqueness makes a second run a no-op.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use core_kernel::{BillId, BillingPeriod, Clock, CustomerId};
use domain_party::{Customer, CustomerDirectory};

use crate::bill::{Bill, BillingPolicy};
use crate::ports::BillLedger;

/// Outcome of one generator run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    /// Period that was billed
    pub period: BillingPeriod,
    /// Bills created by this run
    pub created: Vec<BillId>,
    /// Customers that already had a bill for the period
    pub skipped: Vec<CustomerId>,
    /// Customers whose bill could not be created, with the reason
    pub failed: Vec<(CustomerId, String)>,
}

impl GenerationReport {
    fn empty(period: BillingPeriod) -> Self {
        Self {
            period,
            created: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

enum Outcome {
    Created(BillId),
    Skipped,
}

/// Bill generator
#[derive(Clone)]
pub struct BillGenerator {
    customers: Arc<dyn CustomerDirectory>,
    bills: Arc<dyn BillLedger>,
    policy: BillingPolicy,
    clock: Arc<dyn Clock>,
}

impl BillGenerator {
    pub fn new(
        customers: Arc<dyn CustomerDirectory>,
        bills: Arc<dyn BillLedger>,
        policy: BillingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            customers,
            bills,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &BillingPolicy {
        &self.policy
    }

    /// Bills the period preceding the clock's current local date
    pub async fn run(&self) -> GenerationReport {
        let today = self.policy.timezone.local_date(self.clock.now());
        self.run_for(BillingPeriod::preceding(today), today).await
    }

    /// Bills `period`, stamping new bills as generated on `today`
    ///
    /// Never fails: per-customer errors are logged and collected in the
    /// report, and a directory failure yields an empty report.
    pub async fn run_for(&self, period: BillingPeriod, today: NaiveDate) -> GenerationReport {
        let mut report = GenerationReport::empty(period);

        let customers = match self.customers.list_active().await {
            Ok(customers) => customers,
            Err(e) => {
                warn!(%period, error = %e, "Failed to list active customers, no bills generated");
                return report;
            }
        };

        for customer in &customers {
            match self.bill_customer(customer, period, today).await {
                Ok(Outcome::Created(bill_id)) => report.created.push(bill_id),
                Ok(Outcome::Skipped) => report.skipped.push(customer.id.clone()),
                Err(reason) => {
                    warn!(customer_id = %customer.id, %period, error = %reason, "Bill generation failed");
                    report.failed.push((customer.id.clone(), reason));
                }
            }
        }

        info!(
            %period,
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Bill generation finished"
        );
        report
    }

    async fn bill_customer(
        &self,
        customer: &Customer,
        period: BillingPeriod,
        today: NaiveDate,
    ) -> Result<Outcome, String> {
        let existing = self
            .bills
            .find_for_period(&customer.id, period)
            .await
            .map_err(|e| e.to_string())?;
        if existing.is_some() {
            return Ok(Outcome::Skipped);
        }

        let bill = Bill::issue(customer.id.clone(), period, &self.policy, today);
        match self.bills.insert(&bill).await {
            Ok(()) => {
                info!(
                    bill_id = %bill.bill_id,
                    customer_id = %customer.id,
                    %period,
                    amount = %bill.amount,
                    due_date = %bill.due_date,
                    "Bill generated"
                );
                Ok(Outcome::Created(bill.bill_id))
            }
            // A concurrent run won the (customer, period) slot
            Err(e) if e.is_conflict() => Ok(Outcome::Skipped),
            Err(e) => Err(e.to_string()),
        }
    }
}
