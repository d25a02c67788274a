//! Balance mutation engine.
//!
//! Every balance change for a customer goes through [`BalanceEngine::apply_delta`].
//! Changes to the same customer are serialized by a per-account async lock
//! held for the whole read-compute-commit sequence; the store additionally
//! rejects a commit whose expected version is stale, which catches writers
//! that do not go through this engine.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use clientes_core::{BalanceChange, Customer, CustomerError, CustomerId, Decimal, Result};
use clientes_store::{Store, StoreError};

/// How many times a commit is attempted before giving up with `Conflict`.
pub const MAX_ATTEMPTS: u32 = 3;

/// Serializes and commits balance changes.
pub struct BalanceEngine {
    store: Arc<dyn Store>,
    locks: LockRegistry,
}

impl BalanceEngine {
    /// Create an engine over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: LockRegistry::default(),
        }
    }

    /// Apply a signed `delta` to a customer's balance.
    ///
    /// Positive deltas are deposits, negative deltas withdrawals. On success
    /// the new balance and a ledger entry for `delta` have been committed
    /// together and the refreshed customer is returned.
    ///
    /// # Errors
    ///
    /// - `CustomerError::Validation` if `delta` is zero or overflows the balance.
    /// - `CustomerError::NotFound` if the customer doesn't exist.
    /// - `CustomerError::InsufficientFunds` if the balance would go negative.
    /// - `CustomerError::Conflict` if the commit kept losing to concurrent writers.
    pub async fn apply_delta(&self, customer_id: CustomerId, delta: Decimal) -> Result<Customer> {
        if delta.is_zero() {
            return Err(CustomerError::Validation("amount must not be zero".into()));
        }

        self.with_account_lock(customer_id, self.commit_with_retry(customer_id, delta))
            .await
    }

    /// Run `fut` while holding the customer's account lock.
    ///
    /// Calls for different customers never wait on each other. Waiters for
    /// the same customer are served in FIFO order.
    pub async fn with_account_lock<F, T>(&self, customer_id: CustomerId, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let slot = self.locks.checkout(customer_id);
        let _guard = slot.mutex.lock().await;
        fut.await
    }

    async fn commit_with_retry(&self, customer_id: CustomerId, delta: Decimal) -> Result<Customer> {
        let mut attempt = 1;
        loop {
            match self.try_commit(customer_id, delta).await {
                Ok(customer) => {
                    tracing::debug!(
                        customer_id = %customer_id,
                        delta = %delta,
                        balance = %customer.balance,
                        version = customer.version,
                        "Balance change committed"
                    );
                    return Ok(customer);
                }
                Err(Attempt::Retry(err)) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        customer_id = %customer_id,
                        attempt,
                        error = %err,
                        "Balance change lost a race, retrying"
                    );
                    attempt += 1;
                }
                Err(Attempt::Retry(err)) => {
                    tracing::warn!(customer_id = %customer_id, error = %err, "Giving up on balance change");
                    return Err(err.into());
                }
                Err(Attempt::Fail(err)) => return Err(err),
            }
        }
    }

    async fn try_commit(
        &self,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> std::result::Result<Customer, Attempt> {
        let current = self
            .store
            .get_customer(&customer_id)
            .await?
            .ok_or_else(|| CustomerError::not_found(customer_id))?;

        let change = BalanceChange::plan(&current, delta)?;
        Ok(self.store.commit_balance_change(&change).await?)
    }

    #[cfg(test)]
    fn tracked_accounts(&self) -> usize {
        self.locks.len()
    }
}

/// Outcome of one commit attempt that did not succeed.
enum Attempt {
    Retry(StoreError),
    Fail(CustomerError),
}

impl From<StoreError> for Attempt {
    fn from(err: StoreError) -> Self {
        if err.is_transient() {
            Self::Retry(err)
        } else {
            Self::Fail(err.into())
        }
    }
}

impl From<CustomerError> for Attempt {
    fn from(err: CustomerError) -> Self {
        Self::Fail(err)
    }
}

/// Per-customer async mutexes, created on demand.
///
/// An entry lives only while some caller holds or waits for it.
#[derive(Default)]
struct LockRegistry {
    slots: Mutex<HashMap<CustomerId, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockRegistry {
    fn checkout(&self, customer_id: CustomerId) -> Slot<'_> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mutex = Arc::clone(slots.entry(customer_id).or_default());
        Slot {
            registry: self,
            customer_id,
            mutex,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// A checked-out registry entry. Dropping the last one removes the entry.
struct Slot<'a> {
    registry: &'a LockRegistry,
    customer_id: CustomerId,
    mutex: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        let mut slots = self
            .registry
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Two references left: ours and the registry's.
        let unused = slots
            .get(&self.customer_id)
            .is_some_and(|m| Arc::ptr_eq(m, &self.mutex) && Arc::strong_count(m) == 2);
        if unused {
            slots.remove(&self.customer_id);
        }
    }
}
