//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the repository
//! traits. Every mutation is a single `WriteBatch`; a process-wide write lock
//! makes the read-check-write sequence of each mutation exclusive.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use clientes_core::{BalanceChange, Customer, CustomerId, CustomerPatch, LedgerEntry};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{AccountRepository, LedgerRepository};

/// RocksDB-backed storage implementation.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn read_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        let cf = self.cf(cf::CUSTOMERS)?;

        self.db
            .get_cf(&cf, keys::customer_key(id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn require_customer(&self, id: &CustomerId) -> Result<Customer> {
        self.read_customer(id)?.ok_or_else(|| StoreError::NotFound {
            customer_id: id.to_string(),
        })
    }

    fn email_owner(&self, email: &str) -> Result<Option<CustomerId>> {
        let cf = self.cf(cf::CUSTOMERS_BY_EMAIL)?;

        self.db
            .get_cf(&cf, keys::email_key(email))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Index keys and transaction IDs for one customer, oldest first.
    fn ledger_index(&self, customer_id: &CustomerId) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let cf = self.cf(cf::TRANSACTIONS_BY_CUSTOMER)?;
        let prefix = keys::customer_transactions_prefix(customer_id);

        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            entries.push((key, value));
        }

        Ok(entries)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn insert_sync(&self, customer: &Customer) -> Result<()> {
        let _guard = self.lock_writes()?;

        if self.email_owner(&customer.email)?.is_some() {
            return Err(StoreError::DuplicateEmail {
                email: customer.email.clone(),
            });
        }

        let cf_customers = self.cf(cf::CUSTOMERS)?;
        let cf_email = self.cf(cf::CUSTOMERS_BY_EMAIL)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_customers,
            keys::customer_key(&customer.id),
            Self::serialize(customer)?,
        );
        batch.put_cf(
            &cf_email,
            keys::email_key(&customer.email),
            Self::serialize(&customer.id)?,
        );
        self.write(batch)
    }

    fn list_sync(&self) -> Result<Vec<Customer>> {
        let cf = self.cf(cf::CUSTOMERS)?;

        let mut customers = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            customers.push(Self::deserialize::<Customer>(&value)?);
        }

        customers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(customers)
    }

    fn update_sync(&self, id: &CustomerId, patch: &CustomerPatch) -> Result<Customer> {
        let _guard = self.lock_writes()?;

        let mut customer = self.require_customer(id)?;
        let cf_customers = self.cf(cf::CUSTOMERS)?;
        let cf_email = self.cf(cf::CUSTOMERS_BY_EMAIL)?;
        let mut batch = WriteBatch::default();

        if let Some(email) = patch.email.as_deref().filter(|e| *e != customer.email) {
            if self.email_owner(email)?.is_some() {
                return Err(StoreError::DuplicateEmail {
                    email: email.to_string(),
                });
            }
            batch.delete_cf(&cf_email, keys::email_key(&customer.email));
            batch.put_cf(&cf_email, keys::email_key(email), Self::serialize(id)?);
            customer.email = email.to_string();
        }
        if let Some(name) = &patch.name {
            customer.name.clone_from(name);
        }
        customer.version += 1;
        customer.updated_at = Utc::now();

        batch.put_cf(
            &cf_customers,
            keys::customer_key(id),
            Self::serialize(&customer)?,
        );
        self.write(batch)?;

        Ok(customer)
    }

    fn delete_sync(&self, id: &CustomerId) -> Result<()> {
        let _guard = self.lock_writes()?;

        let customer = self.require_customer(id)?;
        let cf_customers = self.cf(cf::CUSTOMERS)?;
        let cf_email = self.cf(cf::CUSTOMERS_BY_EMAIL)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_customer = self.cf(cf::TRANSACTIONS_BY_CUSTOMER)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_customers, keys::customer_key(id));
        batch.delete_cf(&cf_email, keys::email_key(&customer.email));
        for (index_key, tx_id) in self.ledger_index(id)? {
            batch.delete_cf(&cf_tx, &tx_id);
            batch.delete_cf(&cf_by_customer, &index_key);
        }
        self.write(batch)
    }

    fn commit_sync(&self, change: &BalanceChange) -> Result<Customer> {
        let _guard = self.lock_writes()?;

        let current = self.require_customer(&change.customer_id)?;
        if current.version != change.expected_version {
            return Err(StoreError::VersionConflict {
                customer_id: change.customer_id.to_string(),
                expected: change.expected_version,
            });
        }

        let updated = change.applied_to(&current);
        let sequence = u64::try_from(updated.version)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let cf_customers = self.cf(cf::CUSTOMERS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_customer = self.cf(cf::TRANSACTIONS_BY_CUSTOMER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_customers,
            keys::customer_key(&updated.id),
            Self::serialize(&updated)?,
        );
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&change.entry.id),
            Self::serialize(&change.entry)?,
        );
        batch.put_cf(
            &cf_by_customer,
            keys::customer_transaction_key(&updated.id, sequence),
            keys::transaction_key(&change.entry.id),
        );
        self.write(batch)?;

        Ok(updated)
    }

    fn page_sync(&self, customer_id: &CustomerId, limit: u64, offset: u64) -> Result<Vec<LedgerEntry>> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);

        let mut entries = Vec::new();
        for (_, value) in self.ledger_index(customer_id)?.into_iter().rev().skip(skip).take(take) {
            let tx_id = keys::transaction_id_from_value(&value)
                .ok_or_else(|| StoreError::Serialization("bad ledger index value".into()))?;
            if let Some(data) = self
                .db
                .get_cf(&cf_tx, keys::transaction_key(&tx_id))
                .map_err(|e| StoreError::Database(e.to_string()))?
            {
                entries.push(Self::deserialize(&data)?);
            }
        }

        Ok(entries)
    }
}

#[async_trait]
impl AccountRepository for RocksStore {
    async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        self.insert_sync(customer)
    }

    async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
        self.read_customer(id)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.list_sync()
    }

    async fn update_customer(&self, id: &CustomerId, patch: &CustomerPatch) -> Result<Customer> {
        self.update_sync(id, patch)
    }

    async fn delete_customer(&self, id: &CustomerId) -> Result<()> {
        self.delete_sync(id)
    }

    async fn commit_balance_change(&self, change: &BalanceChange) -> Result<Customer> {
        self.commit_sync(change)
    }
}

#[async_trait]
impl LedgerRepository for RocksStore {
    async fn count_transactions(&self, customer_id: &CustomerId) -> Result<u64> {
        let count = self.ledger_index(customer_id)?.len();
        u64::try_from(count).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn list_transactions(
        &self,
        customer_id: &CustomerId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<LedgerEntry>> {
        self.page_sync(customer_id, limit, offset)
    }
}
