//! PostgreSQL implementations of the domain ports
//!
//! Each adapter holds a pool clone, maps rows through a `*Row` type and
//! converts every failure into a `PortError`.

pub mod bills;
pub mod customers;
pub mod payments;

pub use bills::PostgresBillLedger;
pub use customers::PostgresCustomerDirectory;
pub use payments::PostgresPaymentLedger;

use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult};

/// Runs `SELECT 1` and reports latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };

    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}
