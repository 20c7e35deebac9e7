//! HTTP API Layer
//!
//! A thin REST surface over the billing core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: bill creation and lookup, manual generation, payments
//! - **Middleware**: request ids, tracing, audit logging
//! - **DTOs**: camelCase request/response bodies
//! - **Error Handling**: `{ error, message }` bodies keyed by error category
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(bills, recorder, generator));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_billing::{BillGenerator, BillService, PaymentRecorder};

use crate::handlers::{bills, health, payments};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub bills: BillService,
    pub recorder: PaymentRecorder,
    pub generator: BillGenerator,
    /// Adapters probed by `/health/ready`
    pub probes: Vec<Arc<dyn HealthCheckable>>,
}

impl AppState {
    pub fn new(bills: BillService, recorder: PaymentRecorder, generator: BillGenerator) -> Self {
        Self {
            bills,
            recorder,
            generator,
            probes: Vec::new(),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthCheckable>) -> Self {
        self.probes.push(probe);
        self
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let bill_routes = Router::new()
        .route("/create", post(bills::create_bill))
        .route("/generate", post(bills::generate_bills))
        .route("/:id", get(bills::get_bill));

    let payment_routes = Router::new()
        .route("/create", post(payments::create_payment))
        .route("/bills/:id", get(payments::get_bill_payment));

    let api_routes = Router::new()
        .nest("/bills", bill_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
