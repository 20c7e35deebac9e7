//! Test Data Builders
//!
//! Builders with sensible defaults so tests only spell out the fields they
//! care about.

use chrono::{DateTime, Days, NaiveDate, Utc};
use core_kernel::{BillId, BillingPeriod, CustomerId, Money};
use domain_billing::{Bill, BillStatus, NewBill, DEFAULT_GRACE_DAYS};
use domain_party::Customer;

use crate::fixtures::{CustomerFixtures, MoneyFixtures, TemporalFixtures};

/// Builder for customers
pub struct CustomerBuilder {
    customer: Customer,
}

impl Default for CustomerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerBuilder {
    /// Starts from C1 with a fresh id
    pub fn new() -> Self {
        let mut customer = CustomerFixtures::c1();
        customer.id = CustomerId::generate();
        Self { customer }
    }

    pub fn with_id(mut self, id: CustomerId) -> Self {
        self.customer.id = id;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.customer.email = email.into();
        self
    }

    pub fn build(self) -> Customer {
        self.customer
    }
}

/// Builder for bills
///
/// Defaults to a pending Sep-2025 bill at the standard tariff, generated on
/// the run date and due ten days later.
pub struct BillBuilder {
    bill_id: BillId,
    customer_id: CustomerId,
    period: BillingPeriod,
    amount: Money,
    status: BillStatus,
    generated_date: NaiveDate,
    due_date: Option<NaiveDate>,
    paid_date: Option<DateTime<Utc>>,
}

impl BillBuilder {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            bill_id: BillId::generate(),
            customer_id,
            period: TemporalFixtures::billed_period(),
            amount: MoneyFixtures::tariff(),
            status: BillStatus::Pending,
            generated_date: TemporalFixtures::run_date(),
            due_date: None,
            paid_date: None,
        }
    }

    pub fn for_customer(customer: &Customer) -> Self {
        Self::new(customer.id.clone())
    }

    pub fn with_bill_id(mut self, id: BillId) -> Self {
        self.bill_id = id;
        self
    }

    pub fn with_period(mut self, period: BillingPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_date = date;
        self
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn overdue(mut self) -> Self {
        self.status = BillStatus::Overdue;
        self
    }

    pub fn paid_at(mut self, at: DateTime<Utc>) -> Self {
        self.status = BillStatus::Paid;
        self.paid_date = Some(at);
        self
    }

    fn resolved_due_date(&self) -> NaiveDate {
        self.due_date.unwrap_or_else(|| {
            self.generated_date
                .checked_add_days(Days::new(DEFAULT_GRACE_DAYS as u64))
                .unwrap_or(self.generated_date)
        })
    }

    pub fn build(self) -> Bill {
        let due_date = self.resolved_due_date();
        Bill {
            bill_id: self.bill_id,
            customer_id: self.customer_id,
            period: self.period,
            amount: self.amount,
            status: self.status,
            generated_date: self.generated_date,
            due_date,
            paid_date: self.paid_date,
        }
    }

    /// The same bill as a manual creation request
    pub fn build_request(self) -> NewBill {
        let due_date = self.resolved_due_date();
        NewBill {
            bill_id: self.bill_id,
            customer_id: self.customer_id,
            period: self.period,
            amount: self.amount.amount(),
            currency: self.amount.currency(),
            generated_date: self.generated_date,
            due_date,
        }
    }
}
