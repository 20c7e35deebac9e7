//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::BillId;
use domain_billing::{Payment, PaymentMode, PaymentReceipt, RecordPayment};

use crate::error::ApiError;

/// Body of `POST /api/v1/payments/create`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[validate(length(min = 1, message = "billId is required"))]
    pub bill_id: String,
    /// One of `Cash`, `UPI`, `Card`, `NetBanking`
    #[validate(length(min = 1, message = "mode is required"))]
    pub mode: String,
}

impl TryFrom<CreatePaymentRequest> for RecordPayment {
    type Error = ApiError;

    fn try_from(request: CreatePaymentRequest) -> Result<Self, Self::Error> {
        request.validate()?;
        Ok(RecordPayment {
            bill_id: BillId::parse(request.bill_id)?,
            mode: request.mode.parse::<PaymentMode>()?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub payment_id: String,
    pub bill_id: String,
    pub customer_id: String,
    pub amount_paid: Decimal,
    pub currency: String,
    pub payment_date: DateTime<Utc>,
    pub mode: String,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            payment_id: payment.payment_id.to_string(),
            bill_id: payment.bill_id.to_string(),
            customer_id: payment.customer_id.to_string(),
            amount_paid: payment.amount_paid.amount(),
            currency: payment.amount_paid.currency().code().to_string(),
            payment_date: payment.payment_date,
            mode: payment.mode.as_str().to_string(),
        }
    }
}

/// `201` body of a recorded payment
#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub message: String,
    pub payment: PaymentResponse,
}

impl From<PaymentReceipt> for CreatePaymentResponse {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            success: true,
            message: "Payment recorded & invoice mailed!".to_string(),
            payment: receipt.payment.into(),
        }
    }
}
