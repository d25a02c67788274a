//! Clientes Client SDK.
//!
//! This crate provides a typed async client for the clientes HTTP API.
//!
//! # Example
//!
//! ```no_run
//! use clientes_client::CustomersClient;
//! use clientes_client::Decimal;
//!
//! # async fn example() -> Result<(), clientes_client::ClientError> {
//! let client = CustomersClient::new("http://clientes.svc:3000")?;
//!
//! let customer = client.create_customer("Ana Souza", "ana@example.com").await?;
//! let customer = client.deposit(&customer.id, Decimal::new(1500, 2)).await?;
//!
//! println!("New balance: {}", customer.balance);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, CustomersClient};
pub use error::ClientError;
pub use rust_decimal::Decimal;
pub use types::*;
