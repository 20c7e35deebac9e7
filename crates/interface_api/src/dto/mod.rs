//! Request and response bodies
//!
//! JSON field names are camelCase; amounts are decimal strings.

pub mod bills;
pub mod payments;
