//! Core types and utilities for the clientes account service.
//!
//! This crate provides the foundational types shared by the store, the service
//! and the client SDK:
//!
//! - **Identifiers**: `CustomerId`, `TransactionId`
//! - **Customers**: `Customer`, `NewCustomer`, `CustomerPatch`
//! - **Ledger**: `LedgerEntry`, `TransactionType`, `BalanceChange`
//! - **Paging**: `PageRequest`, `Page`
//! - **Errors**: `CustomerError`, the domain error taxonomy
//!
//! # Money
//!
//! Balances and amounts are `rust_decimal::Decimal`. They are never converted
//! to floating point, and they serialize as decimal strings (`"15.00"`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod customer;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod page;

pub use customer::{normalize_email, Customer, CustomerPatch, NewCustomer};
pub use error::{CustomerError, Result};
pub use ids::{CustomerId, IdError, TransactionId};
pub use ledger::{BalanceChange, LedgerEntry, TransactionType};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use rust_decimal::Decimal;
