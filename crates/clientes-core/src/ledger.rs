//! Ledger entry types.
//!
//! Every change to a customer's balance is recorded as one immutable ledger
//! entry. Summing the amounts of a customer's entries reconstructs its balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CustomerError, Result};
use crate::{Customer, CustomerId, TransactionId};

/// A single balance-changing event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The customer whose balance was affected.
    pub customer_id: CustomerId,

    /// Signed amount. Positive = deposit, negative = withdrawal.
    pub amount: Decimal,

    /// Kind of transaction, derived from the sign of `amount`.
    pub transaction_type: TransactionType,

    /// When the entry was persisted.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create the entry recording `delta` against a customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Validation` if `delta` is zero.
    pub fn for_delta(customer_id: CustomerId, delta: Decimal, at: DateTime<Utc>) -> Result<Self> {
        let transaction_type = TransactionType::from_delta(delta)
            .ok_or_else(|| CustomerError::Validation("amount must not be zero".into()))?;

        Ok(Self {
            id: TransactionId::generate(),
            customer_id,
            amount: delta,
            transaction_type,
            created_at: at,
        })
    }
}

/// Types of ledger transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money added to the balance.
    Deposit,

    /// Money taken from the balance.
    Withdraw,
}

impl TransactionType {
    /// Classify a signed delta. Zero has no transaction type.
    #[must_use]
    pub fn from_delta(delta: Decimal) -> Option<Self> {
        if delta > Decimal::ZERO {
            Some(Self::Deposit)
        } else if delta < Decimal::ZERO {
            Some(Self::Withdraw)
        } else {
            None
        }
    }

    /// Stable lowercase name, as stored and rendered.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = CustomerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            other => Err(CustomerError::Internal(format!(
                "unknown transaction type: {other}"
            ))),
        }
    }
}

/// A computed balance mutation, ready to be committed atomically.
///
/// The store writes `new_balance` and `entry` together, and only if the
/// customer's version still equals `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// The customer being changed.
    pub customer_id: CustomerId,

    /// Version observed when the change was computed.
    pub expected_version: i64,

    /// Balance after the change.
    pub new_balance: Decimal,

    /// Ledger entry recording the change.
    pub entry: LedgerEntry,
}

impl BalanceChange {
    /// Plan applying `delta` to `customer`.
    ///
    /// # Errors
    ///
    /// - `CustomerError::Validation` if `delta` is zero or overflows.
    /// - `CustomerError::InsufficientFunds` if the balance would go negative.
    pub fn plan(customer: &Customer, delta: Decimal) -> Result<Self> {
        let entry = LedgerEntry::for_delta(customer.id, delta, Utc::now())?;
        let new_balance = customer.balance_after(delta)?;

        Ok(Self {
            customer_id: customer.id,
            expected_version: customer.version,
            new_balance,
            entry,
        })
    }

    /// The customer as it reads after this change is committed.
    #[must_use]
    pub fn applied_to(&self, customer: &Customer) -> Customer {
        Customer {
            balance: self.new_balance,
            version: self.expected_version + 1,
            updated_at: self.entry.created_at,
            ..customer.clone()
        }
    }
}
