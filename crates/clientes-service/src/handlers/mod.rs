//! API handlers.

pub mod customers;
pub mod health;
pub mod transactions;
