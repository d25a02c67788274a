//! Clientes HTTP API Service.
//!
//! This crate provides the HTTP API for customer accounts, including:
//!
//! - Customer registration, lookup, update and removal
//! - Deposits and withdrawals through the balance engine
//! - Paged transaction history
//!
//! # Consistency
//!
//! Balance changes for one customer are serialized by [`balance::BalanceEngine`]
//! and committed together with their ledger entry, so a customer's balance
//! always equals the sum of its ledger and never goes negative.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result

pub mod balance;
pub mod config;
pub mod customers;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod limit;
pub mod routes;
pub mod state;

pub use balance::BalanceEngine;
pub use config::ServiceConfig;
pub use customers::CustomerService;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
