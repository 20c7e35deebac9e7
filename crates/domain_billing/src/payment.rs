//! Payment records
//!
//! A payment is written once per settled bill and never modified afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, CustomerId, Money, PaymentId};

use crate::bill::Bill;
use crate::error::BillingError;

/// How the customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    #[serde(rename = "UPI")]
    Upi,
    Card,
    NetBanking,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Upi => "UPI",
            PaymentMode::Card => "Card",
            PaymentMode::NetBanking => "NetBanking",
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMode::Cash),
            "UPI" => Ok(PaymentMode::Upi),
            "Card" => Ok(PaymentMode::Card),
            "NetBanking" => Ok(PaymentMode::NetBanking),
            other => Err(BillingError::Validation(format!(
                "mode must be one of Cash, UPI, Card, NetBanking (got '{}')",
                other
            ))),
        }
    }
}

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub payment_id: PaymentId,
    /// Settled bill
    pub bill_id: BillId,
    /// Paying customer, copied from the bill
    pub customer_id: CustomerId,
    /// Amount paid; always the bill's full amount
    pub amount_paid: Money,
    /// When the payment was recorded
    pub payment_date: DateTime<Utc>,
    /// Payment mode
    pub mode: PaymentMode,
}

impl Payment {
    /// Builds the payment that settles `bill` in full
    pub fn settling(bill: &Bill, mode: PaymentMode, payment_date: DateTime<Utc>) -> Self {
        Self {
            payment_id: PaymentId::generate(),
            bill_id: bill.bill_id.clone(),
            customer_id: bill.customer_id.clone(),
            amount_paid: bill.amount,
            payment_date,
            mode,
        }
    }
}
