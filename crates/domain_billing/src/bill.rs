//! Bills and the bill state machine
//!
//! A bill is issued once per customer per billing period. Its status only
//! moves along these edges:
//!
//! - Pending -> Paid (payment recorded)
//! - Pending -> Overdue (due date passed, via the overdue sweep)
//! - Overdue -> Paid (late payment)
//! - Paid -> Pending / Overdue (compensation when the payment write fails)

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, BillingPeriod, CoreError, Currency, CustomerId, Money, Timezone};

use crate::error::BillingError;

/// Days between generation and due date
pub const DEFAULT_GRACE_DAYS: u32 = 10;

/// Bill status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Issued and awaiting payment
    Pending,
    /// Settled by a recorded payment
    Paid,
    /// Due date passed without payment
    Overdue,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
            BillStatus::Overdue => "overdue",
        }
    }

    /// Returns true if a payment may be recorded against a bill in this state
    pub fn is_payable(&self) -> bool {
        matches!(self, BillStatus::Pending | BillStatus::Overdue)
    }

    /// Returns true if `self -> next` is an edge of the state machine
    pub fn can_transition_to(&self, next: BillStatus) -> bool {
        matches!(
            (self, next),
            (BillStatus::Pending, BillStatus::Paid)
                | (BillStatus::Pending, BillStatus::Overdue)
                | (BillStatus::Overdue, BillStatus::Paid)
                | (BillStatus::Paid, BillStatus::Pending)
                | (BillStatus::Paid, BillStatus::Overdue)
        )
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BillStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BillStatus::Pending),
            "paid" => Ok(BillStatus::Paid),
            "overdue" => Ok(BillStatus::Overdue),
            other => Err(BillingError::Validation(format!("unknown bill status '{}'", other))),
        }
    }
}

/// Tariff and timing rules applied by the bill generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingPolicy {
    /// Amount billed per customer per period
    pub tariff: Money,
    /// Days between generation and due date
    pub grace_days: u32,
    /// Timezone that decides "today" and period boundaries
    pub timezone: Timezone,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            tariff: Money::new(Decimal::new(2500, 0), Currency::INR),
            grace_days: DEFAULT_GRACE_DAYS,
            timezone: Timezone::default(),
        }
    }
}

impl BillingPolicy {
    /// Due date for a bill generated on `generated`
    pub fn due_date(&self, generated: NaiveDate) -> NaiveDate {
        generated
            .checked_add_days(Days::new(self.grace_days as u64))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// A bill for one customer and one billing period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Unique, externally visible identifier
    pub bill_id: BillId,
    /// Billed customer
    pub customer_id: CustomerId,
    /// Billing cycle; unique per customer
    pub period: BillingPeriod,
    /// Amount due
    pub amount: Money,
    /// Current status
    pub status: BillStatus,
    /// Date the bill was issued
    pub generated_date: NaiveDate,
    /// Date payment is due
    pub due_date: NaiveDate,
    /// When the bill was paid
    pub paid_date: Option<DateTime<Utc>>,
}

impl Bill {
    /// Issues a pending bill under `policy`, generated on `today`
    pub fn issue(customer_id: CustomerId, period: BillingPeriod, policy: &BillingPolicy, today: NaiveDate) -> Self {
        Self {
            bill_id: BillId::generate(),
            customer_id,
            period,
            amount: policy.tariff,
            status: BillStatus::Pending,
            generated_date: today,
            due_date: policy.due_date(today),
            paid_date: None,
        }
    }

    /// Applies a status transition in memory
    ///
    /// Ledgers call this after their own compare step so the edge rules live
    /// in one place.
    pub fn apply_transition(
        &mut self,
        next: BillStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<(), BillingError> {
        if !self.status.can_transition_to(next) {
            return Err(BillingError::InvalidTransition {
                bill_id: self.bill_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.paid_date = if next == BillStatus::Paid { paid_date } else { None };
        Ok(())
    }

    /// Returns true if the bill is unpaid and its due date is before `today`
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == BillStatus::Pending && self.due_date < today
    }
}

/// A manually created bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    pub bill_id: BillId,
    pub customer_id: CustomerId,
    pub period: BillingPeriod,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Currency,
    pub generated_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl NewBill {
    /// Validates the request and builds a pending bill
    pub fn into_bill(self) -> Result<Bill, BillingError> {
        let amount = Money::positive(self.amount, self.currency).map_err(CoreError::from)?;

        if self.due_date < self.generated_date {
            return Err(BillingError::Validation(format!(
                "due date {} is before generated date {}",
                self.due_date, self.generated_date
            )));
        }

        Ok(Bill {
            bill_id: self.bill_id,
            customer_id: self.customer_id,
            period: self.period,
            amount,
            status: BillStatus::Pending,
            generated_date: self.generated_date,
            due_date: self.due_date,
            paid_date: None,
        })
    }
}
