//! Bill DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BillId, BillingPeriod, CoreError, CustomerId};
use domain_billing::{Bill, NewBill};

use crate::error::ApiError;

/// Body of `POST /api/v1/bills/create`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    #[validate(length(min = 1, message = "billId is required"))]
    pub bill_id: String,
    #[validate(length(min = 1, message = "customerId is required"))]
    pub customer_id: String,
    /// Period label such as `Sep-2025`
    #[serde(alias = "month")]
    #[validate(length(min = 1, message = "period is required"))]
    pub period: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub generated_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl TryFrom<CreateBillRequest> for NewBill {
    type Error = ApiError;

    fn try_from(request: CreateBillRequest) -> Result<Self, Self::Error> {
        request.validate()?;

        Ok(NewBill {
            bill_id: BillId::parse(request.bill_id)?,
            customer_id: CustomerId::parse(request.customer_id)?,
            period: request.period.parse::<BillingPeriod>().map_err(CoreError::from)?,
            amount: request.amount,
            currency: match request.currency {
                Some(code) => code.parse().map_err(CoreError::from)?,
                None => Default::default(),
            },
            generated_date: request.generated_date,
            due_date: request.due_date,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillResponse {
    pub bill_id: String,
    pub customer_id: String,
    pub period: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub generated_date: NaiveDate,
    pub due_date: NaiveDate,
    pub paid_date: Option<DateTime<Utc>>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            bill_id: bill.bill_id.to_string(),
            customer_id: bill.customer_id.to_string(),
            period: bill.period.label(),
            amount: bill.amount.amount(),
            currency: bill.amount.currency().code().to_string(),
            status: bill.status.as_str().to_string(),
            generated_date: bill.generated_date,
            due_date: bill.due_date,
            paid_date: bill.paid_date,
        }
    }
}

/// Envelope for single-bill responses
#[derive(Debug, Serialize)]
pub struct BillEnvelope {
    pub success: bool,
    pub message: String,
    pub bill: BillResponse,
}

impl BillEnvelope {
    pub fn new(message: impl Into<String>, bill: Bill) -> Self {
        Self {
            success: true,
            message: message.into(),
            bill: bill.into(),
        }
    }
}
