//! Storage layer for clientes.
//!
//! This crate provides persistent storage for customers and their transaction
//! ledger. Two narrow capability traits describe what the service needs:
//!
//! - [`AccountRepository`]: customer records and atomic balance changes
//! - [`LedgerRepository`]: paged reads of a customer's ledger
//!
//! # Backends
//!
//! - [`SqliteStore`] (default): `sqlx` over a SQLite file. Balance and ledger
//!   writes share one SQL transaction; ledger rows cascade on customer delete.
//! - `RocksStore` (feature `rocksdb-backend`): column families written with a
//!   single `WriteBatch` per mutation.
//!
//! # Example
//!
//! ```no_run
//! use clientes_core::{Customer, NewCustomer};
//! use clientes_store::{AccountRepository, SqliteStore};
//!
//! # async fn example() -> clientes_store::Result<()> {
//! let store = SqliteStore::open("/tmp/clientes.db", 5).await?;
//!
//! let customer = Customer::new(&NewCustomer::new("Ana", "ana@example.com")).unwrap();
//! store.insert_customer(&customer).await?;
//!
//! let retrieved = store.get_customer(&customer.id).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;
pub mod sqlite;

pub use error::{Result, StoreError, CONFLICT_MESSAGE};
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use clientes_core::{BalanceChange, Customer, CustomerId, CustomerPatch, LedgerEntry};

/// Customer records and balance mutations.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new customer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if the email is already registered.
    async fn insert_customer(&self, customer: &Customer) -> Result<()>;

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>>;

    /// List all customers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_customers(&self) -> Result<Vec<Customer>>;

    /// Apply a partial name/email update and bump the version.
    ///
    /// Returns the customer as stored after the update.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the customer doesn't exist.
    /// - `StoreError::DuplicateEmail` if another customer owns the new email.
    async fn update_customer(&self, id: &CustomerId, patch: &CustomerPatch) -> Result<Customer>;

    /// Delete a customer together with its ledger entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the customer doesn't exist.
    async fn delete_customer(&self, id: &CustomerId) -> Result<()>;

    /// Write a new balance and its ledger entry atomically.
    ///
    /// The write only happens if the customer's version still equals
    /// `change.expected_version`; on success the version is incremented.
    /// Either both the balance and the ledger entry become durable, or neither.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the customer doesn't exist.
    /// - `StoreError::VersionConflict` if the version moved.
    /// - `StoreError::Busy` if the database is locked by another writer.
    async fn commit_balance_change(&self, change: &BalanceChange) -> Result<Customer>;
}

/// Read access to the transaction ledger.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Count a customer's ledger entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn count_transactions(&self, customer_id: &CustomerId) -> Result<u64>;

    /// List a customer's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_transactions(
        &self,
        customer_id: &CustomerId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<LedgerEntry>>;
}

/// A complete storage backend.
pub trait Store: AccountRepository + LedgerRepository {}

impl<T: AccountRepository + LedgerRepository> Store for T {}
