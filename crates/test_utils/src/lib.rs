//! Test Utilities Crate
//!
//! Shared test data for the billing suites.
//!
//! # Modules
//!
//! - `fixtures`: Fixed instants, customers and amounts
//! - `builders`: Builders for customers and bills with sensible defaults
//! - `assertions`: Assertion helpers for bill state and money

pub mod fixtures;
pub mod builders;
pub mod assertions;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
