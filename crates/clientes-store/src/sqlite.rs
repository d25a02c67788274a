//! SQLite storage implementation.
//!
//! This module provides the `SqliteStore` implementation of the repository
//! traits on top of an `sqlx` connection pool.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use clientes_core::{
    BalanceChange, Customer, CustomerId, CustomerPatch, Decimal, LedgerEntry, TransactionId,
    TransactionType,
};

use crate::error::{Result, StoreError};
use crate::schema::SQLITE_SCHEMA;
use crate::{AccountRepository, LedgerRepository};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed storage implementation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create a SQLite database file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub async fn open<P: AsRef<Path>>(path: P, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to a single connection that never expires, since
    /// every SQLite in-memory connection is a separate database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        for statement in SQLITE_SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        tracing::debug!("SQLite schema ready");
        Ok(Self { pool })
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AccountRepository for SqliteStore {
    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO customers (id, name, email, balance, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(customer.id.to_string())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.balance.to_string())
        .bind(customer.version)
        .bind(encode_timestamp(&customer.created_at))
        .bind(encode_timestamp(&customer.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_email_or(e, &customer.email))?;

        Ok(())
    }

    async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        sqlx::query(
            r"
            SELECT id, name, email, balance, version, created_at, updated_at
            FROM customers
            WHERE id = ?
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(customer_from_row)
        .transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        sqlx::query(
            r"
            SELECT id, name, email, balance, version, created_at, updated_at
            FROM customers
            ORDER BY created_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(customer_from_row)
        .collect()
    }

    async fn update_customer(&self, id: &CustomerId, patch: &CustomerPatch) -> Result<Customer> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r"
            UPDATE customers
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                version = version + 1,
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(patch.name.as_deref())
        .bind(patch.email.as_deref())
        .bind(encode_timestamp(&Utc::now()))
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| duplicate_email_or(e, patch.email.as_deref().unwrap_or_default()))?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                customer_id: id.to_string(),
            });
        }

        let row = sqlx::query(
            r"
            SELECT id, name, email, balance, version, created_at, updated_at
            FROM customers
            WHERE id = ?
            ",
        )
        .bind(id.to_string())
        .fetch_one(&mut *tx)
        .await?;
        let customer = customer_from_row(&row)?;

        tx.commit().await?;
        Ok(customer)
    }

    async fn delete_customer(&self, id: &CustomerId) -> Result<()> {
        // Ledger rows go with the customer through ON DELETE CASCADE.
        let deleted = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                customer_id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn commit_balance_change(&self, change: &BalanceChange) -> Result<Customer> {
        let customer_id = change.customer_id.to_string();
        let mut tx = self.pool.begin().await?;

        // The first statement writes, so the transaction takes the write lock
        // up front instead of upgrading from a read snapshot.
        let updated = sqlx::query(
            r"
            UPDATE customers
            SET balance = ?, version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            ",
        )
        .bind(change.new_balance.to_string())
        .bind(encode_timestamp(&change.entry.created_at))
        .bind(&customer_id)
        .bind(change.expected_version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM customers WHERE id = ?")
                .bind(&customer_id)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();

            return Err(if exists {
                StoreError::VersionConflict {
                    customer_id,
                    expected: change.expected_version,
                }
            } else {
                StoreError::NotFound { customer_id }
            });
        }

        sqlx::query(
            r"
            INSERT INTO transactions (id, customer_id, amount, type, created_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(change.entry.id.to_string())
        .bind(&customer_id)
        .bind(change.entry.amount.to_string())
        .bind(change.entry.transaction_type.as_str())
        .bind(encode_timestamp(&change.entry.created_at))
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            r"
            SELECT id, name, email, balance, version, created_at, updated_at
            FROM customers
            WHERE id = ?
            ",
        )
        .bind(&customer_id)
        .fetch_one(&mut *tx)
        .await?;
        let customer = customer_from_row(&row)?;

        tx.commit().await?;
        Ok(customer)
    }
}

#[async_trait]
impl LedgerRepository for SqliteStore {
    async fn count_transactions(&self, customer_id: &CustomerId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE customer_id = ?")
            .bind(customer_id.to_string())
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn list_transactions(
        &self,
        customer_id: &CustomerId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<LedgerEntry>> {
        sqlx::query(
            r"
            SELECT id, customer_id, amount, type, created_at
            FROM transactions
            WHERE customer_id = ?
            ORDER BY created_at DESC, seq DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(customer_id.to_string())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(entry_from_row)
        .collect()
    }
}

/// Map a unique-constraint violation to `DuplicateEmail`.
///
/// `email` is the only unique column a caller can choose.
fn duplicate_email_or(err: sqlx::Error, email: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::DuplicateEmail {
                email: email.to_string(),
            };
        }
    }
    err.into()
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(format!("bad timestamp {raw:?}: {e}")))
}

fn decode_decimal(raw: &str) -> Result<Decimal> {
    raw.parse()
        .map_err(|e| StoreError::Serialization(format!("bad decimal {raw:?}: {e}")))
}

fn customer_from_row(row: &SqliteRow) -> Result<Customer> {
    let id: String = row.try_get("id")?;
    let balance: String = row.try_get("balance")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Customer {
        id: id
            .parse()
            .map_err(|e| StoreError::Serialization(format!("bad customer id {id:?}: {e}")))?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        balance: decode_decimal(&balance)?,
        version: row.try_get("version")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<LedgerEntry> {
    let id: String = row.try_get("id")?;
    let customer_id: String = row.try_get("customer_id")?;
    let amount: String = row.try_get("amount")?;
    let kind: String = row.try_get("type")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(LedgerEntry {
        id: id
            .parse::<TransactionId>()
            .map_err(|e| StoreError::Serialization(format!("bad transaction id {id:?}: {e}")))?,
        customer_id: customer_id.parse().map_err(|e| {
            StoreError::Serialization(format!("bad customer id {customer_id:?}: {e}"))
        })?,
        amount: decode_decimal(&amount)?,
        transaction_type: kind
            .parse::<TransactionType>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?,
        created_at: decode_timestamp(&created_at)?,
    })
}
