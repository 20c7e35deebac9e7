//! Request handlers

pub mod bills;
pub mod health;
pub mod payments;
