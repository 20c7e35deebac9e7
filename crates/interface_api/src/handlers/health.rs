//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use core_kernel::{AdapterHealth, HealthCheckResult};

use crate::{error::ApiError, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    pub adapters: Vec<HealthCheckResult>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check (includes every storage adapter)
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, ApiError> {
    let mut adapters = Vec::with_capacity(state.probes.len());
    for probe in &state.probes {
        adapters.push(probe.health_check().await);
    }

    if let Some(down) = adapters.iter().find(|r| r.status == AdapterHealth::Unhealthy) {
        return Err(ApiError::Unavailable(format!(
            "{} is unhealthy: {}",
            down.adapter_id,
            down.message.clone().unwrap_or_default()
        )));
    }

    Ok(Json(ReadinessResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        adapters,
    }))
}
