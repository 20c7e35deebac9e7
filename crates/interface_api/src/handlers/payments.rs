//! Payment handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use core_kernel::BillId;
use domain_billing::RecordPayment;

use crate::dto::payments::{CreatePaymentRequest, CreatePaymentResponse, PaymentResponse};
use crate::{error::ApiError, AppState};

/// Records a payment, renders the invoice and mails it
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePaymentResponse>), ApiError> {
    let Json(request) = payload?;
    let request = RecordPayment::try_from(request)?;
    let receipt = state.recorder.record(request).await?;

    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// Gets the payment that settled a bill
pub async fn get_bill_payment(
    State(state): State<AppState>,
    Path(bill_id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let bill_id = BillId::parse(bill_id)?;
    let payment = state.bills.payment_for_bill(&bill_id).await?;
    Ok(Json(payment.into()))
}
