//! Pre-built Test Fixtures
//!
//! Consistent values for the billing scenarios: the run on 1 Oct 2025 that
//! bills Sep-2025 at the standard tariff.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{BillingPeriod, Currency, CustomerId, ManualClock, Money};
use domain_party::{Customer, CustomerStatus};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The standard monthly tariff
    pub fn tariff() -> Money {
        Money::new(dec!(2500), Currency::INR)
    }

    pub fn inr(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }
}

/// Fixture for dates and clocks
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// 1 Oct 2025, 09:00 UTC
    pub fn run_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Local date of the monthly run
    pub fn run_date() -> NaiveDate {
        Self::run_instant().date_naive()
    }

    /// The period billed on the run date
    pub fn billed_period() -> BillingPeriod {
        BillingPeriod::preceding(Self::run_date())
    }

    /// A clock frozen at [`TemporalFixtures::run_instant`]
    pub fn clock() -> ManualClock {
        ManualClock::at(Self::run_instant())
    }
}

/// Fixture for customers
pub struct CustomerFixtures;

impl CustomerFixtures {
    /// C1: active, `a@x.com`
    pub fn c1() -> Customer {
        Self::with_id("C1", "Asha Rao", "a@x.com", CustomerStatus::Active)
    }

    /// C2: active, `b@x.com`
    pub fn c2() -> Customer {
        Self::with_id("C2", "Bikash Das", "b@x.com", CustomerStatus::Active)
    }

    /// C3: inactive, never billed
    pub fn inactive() -> Customer {
        Self::with_id("C3", "Chitra Nayak", "c@x.com", CustomerStatus::Inactive)
    }

    fn with_id(id: &str, name: &str, email: &str, status: CustomerStatus) -> Customer {
        let now = TemporalFixtures::run_instant();
        Customer {
            id: CustomerId::parse(id).unwrap_or_else(|_| CustomerId::generate()),
            name: name.to_string(),
            email: email.to_string(),
            phone: "+91 98765 43210".to_string(),
            address: "Plot 12, Saheed Nagar, Bhubaneswar".to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }
}
