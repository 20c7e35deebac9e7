//! Bill handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use core_kernel::BillId;
use domain_billing::{GenerationReport, NewBill};

use crate::dto::bills::{BillEnvelope, BillResponse, CreateBillRequest};
use crate::{error::ApiError, AppState};

/// Creates a bill outside the monthly run
pub async fn create_bill(
    State(state): State<AppState>,
    payload: Result<Json<CreateBillRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BillEnvelope>), ApiError> {
    let Json(request) = payload?;
    let request = NewBill::try_from(request)?;
    let bill = state.bills.create_bill(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BillEnvelope::new("Bill created successfully", bill)),
    ))
}

/// Gets a bill by id
pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BillResponse>, ApiError> {
    let id = BillId::parse(id)?;
    let bill = state.bills.get_bill(&id).await?;
    Ok(Json(bill.into()))
}

/// Runs the bill generator now
///
/// Per-customer failures are reported in the body, never as an error status.
pub async fn generate_bills(State(state): State<AppState>) -> Json<GenerationReport> {
    let report = state.generator.run().await;
    info!(
        period = %report.period,
        created = report.created.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Manual bill generation finished"
    );
    Json(report)
}
