//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the customer directory and the bill and payment
//! ledgers, built on SQLx with runtime-checked queries. Uniqueness of bill
//! ids, (customer, period) pairs and per-bill payments is enforced by the
//! schema in `migrations/`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillLedger};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/billing")).await?;
//! run_migrations(&pool).await?;
//! let bills = PostgresBillLedger::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::{PostgresBillLedger, PostgresCustomerDirectory, PostgresPaymentLedger};
