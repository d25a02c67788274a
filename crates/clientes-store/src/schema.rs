//! Database schema definitions.
//!
//! SQL DDL for the SQLite backend and column family names for the `RocksDB`
//! backend.

/// Statements run at startup to create the SQLite schema.
///
/// Balances and amounts are stored as decimal text to keep them exact.
/// Deleting a customer cascades to its ledger entries.
pub const SQLITE_SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        balance TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS transactions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        customer_id TEXT NOT NULL REFERENCES customers(id) ON UPDATE CASCADE ON DELETE CASCADE,
        amount TEXT NOT NULL,
        type TEXT NOT NULL CHECK (type IN ('deposit', 'withdraw')),
        created_at TEXT NOT NULL
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_transactions_customer_created
    ON transactions(customer_id, created_at DESC, seq DESC)
    ",
];

/// Column family names for the `RocksDB` database.
#[cfg(feature = "rocksdb-backend")]
pub mod cf {
    /// Primary customer records, keyed by `customer_id`.
    pub const CUSTOMERS: &str = "customers";

    /// Unique index: normalized email to `customer_id`.
    pub const CUSTOMERS_BY_EMAIL: &str = "customers_by_email";

    /// Ledger entries, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: ledger entries by customer, keyed by
    /// `customer_id || version`. Value is the `transaction_id`.
    pub const TRANSACTIONS_BY_CUSTOMER: &str = "transactions_by_customer";
}

/// Returns all column family names for database initialization.
#[cfg(feature = "rocksdb-backend")]
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::CUSTOMERS,
        cf::CUSTOMERS_BY_EMAIL,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_CUSTOMER,
    ]
}
