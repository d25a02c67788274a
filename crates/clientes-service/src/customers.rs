//! Account service: customer lifecycle, deposits, withdrawals and ledger reads.

use std::sync::Arc;

use clientes_core::{
    Customer, CustomerError, CustomerId, CustomerPatch, Decimal, LedgerEntry, NewCustomer, Page,
    PageRequest, Result,
};
use clientes_store::Store;

use crate::balance::BalanceEngine;

/// Customer operations on top of a store and the balance engine.
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn Store>,
    engine: Arc<BalanceEngine>,
}

impl CustomerService {
    /// Create a service sharing `store` with a new balance engine.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        let engine = Arc::new(BalanceEngine::new(Arc::clone(&store)));
        Self { store, engine }
    }

    /// The balance engine used for deposits and withdrawals.
    #[must_use]
    pub fn engine(&self) -> &Arc<BalanceEngine> {
        &self.engine
    }

    /// Register a new customer with a zero balance.
    ///
    /// # Errors
    ///
    /// - `CustomerError::Validation` if the name or email is invalid.
    /// - `CustomerError::DuplicateEmail` if the email is taken.
    pub async fn create(&self, input: NewCustomer) -> Result<Customer> {
        let customer = Customer::new(&input)?;
        self.store.insert_customer(&customer).await?;

        tracing::info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Fetch one customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the customer doesn't exist.
    pub async fn get(&self, id: CustomerId) -> Result<Customer> {
        self.store
            .get_customer(&id)
            .await?
            .ok_or_else(|| CustomerError::not_found(id))
    }

    /// All customers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Internal` if the store fails.
    pub async fn list(&self) -> Result<Vec<Customer>> {
        Ok(self.store.list_customers().await?)
    }

    /// Change a customer's name and/or email.
    ///
    /// Blank fields count as absent; a patch with nothing left returns the
    /// customer unchanged.
    ///
    /// # Errors
    ///
    /// - `CustomerError::Validation` if a supplied field is invalid.
    /// - `CustomerError::NotFound` if the customer doesn't exist.
    /// - `CustomerError::DuplicateEmail` if another customer owns the email.
    pub async fn update(&self, id: CustomerId, patch: CustomerPatch) -> Result<Customer> {
        let patch = patch.normalized()?;
        if patch.is_empty() {
            return self.get(id).await;
        }

        let customer = self
            .engine
            .with_account_lock(id, self.store.update_customer(&id, &patch))
            .await?;

        tracing::info!(customer_id = %id, version = customer.version, "Customer updated");
        Ok(customer)
    }

    /// Remove a customer and its ledger.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the customer doesn't exist.
    pub async fn delete(&self, id: CustomerId) -> Result<()> {
        self.engine
            .with_account_lock(id, self.store.delete_customer(&id))
            .await?;

        tracing::info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    /// Add `amount` to the balance.
    ///
    /// # Errors
    ///
    /// - `CustomerError::Validation` if `amount` is not positive.
    /// - `CustomerError::NotFound` if the customer doesn't exist.
    pub async fn deposit(&self, id: CustomerId, amount: Decimal) -> Result<Customer> {
        ensure_positive(amount)?;
        self.engine.apply_delta(id, amount).await
    }

    /// Take `amount` from the balance.
    ///
    /// # Errors
    ///
    /// - `CustomerError::Validation` if `amount` is not positive.
    /// - `CustomerError::NotFound` if the customer doesn't exist.
    /// - `CustomerError::InsufficientFunds` if the balance is too low.
    pub async fn withdraw(&self, id: CustomerId, amount: Decimal) -> Result<Customer> {
        ensure_positive(amount)?;
        self.engine.apply_delta(id, -amount).await
    }

    /// One page of a customer's ledger, newest first.
    ///
    /// # Errors
    ///
    /// - `CustomerError::NotFound` if the customer doesn't exist.
    /// - `CustomerError::Validation` if `page` or `size` is below 1.
    /// - `CustomerError::InvalidPage` if `page` is past the last page.
    pub async fn list_transactions(
        &self,
        id: CustomerId,
        page: i64,
        size: i64,
    ) -> Result<Page<LedgerEntry>> {
        self.get(id).await?;

        let request = PageRequest::new(page, size)?;

        let total = self.store.count_transactions(&id).await?;
        request.ensure_within(total)?;

        let items = self
            .store
            .list_transactions(&id, request.size(), request.offset())
            .await?;
        Ok(Page::new(request, total, items))
    }
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(CustomerError::Validation(
            "amount must be greater than zero".into(),
        ));
    }
    Ok(())
}
