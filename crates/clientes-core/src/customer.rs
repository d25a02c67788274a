//! Customer account types.
//!
//! A customer is created with a zero balance. Afterwards its name and email
//! change only through a [`CustomerPatch`], and its balance only through a
//! signed delta applied by the balance engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{CustomerError, Result};
use crate::CustomerId;

/// A customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Stable unique identifier.
    pub id: CustomerId,

    /// Display name, at least two characters.
    pub name: String,

    /// Email address, unique across all customers (stored lowercased).
    pub email: String,

    /// Current balance. Never negative.
    pub balance: Decimal,

    /// Incremented on every successful balance or field update.
    pub version: i64,

    /// When the customer was created.
    pub created_at: DateTime<Utc>,

    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create a new customer with zero balance from validated input.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Validation` if the input is invalid.
    pub fn new(input: &NewCustomer) -> Result<Self> {
        let input = input.normalized();
        input.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: CustomerId::generate(),
            name: input.name,
            email: input.email,
            balance: Decimal::ZERO,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Compute the balance that results from applying `delta`.
    ///
    /// # Errors
    ///
    /// - `CustomerError::InsufficientFunds` if the result would be negative.
    /// - `CustomerError::Validation` if the addition overflows.
    pub fn balance_after(&self, delta: Decimal) -> Result<Decimal> {
        let next = self
            .balance
            .checked_add(delta)
            .ok_or_else(|| CustomerError::Validation("amount out of range".into()))?;

        if next < Decimal::ZERO {
            return Err(CustomerError::InsufficientFunds {
                balance: self.balance,
                requested: delta.abs(),
            });
        }

        Ok(next)
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewCustomer {
    /// Display name.
    #[validate(length(min = 2, message = "name must have at least 2 characters"))]
    pub name: String,

    /// Email address.
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
}

impl NewCustomer {
    /// Build a new-customer input.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
        }
    }
}

/// A partial update of a customer's name and/or email.
///
/// Fields that are absent, empty or only whitespace are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CustomerPatch {
    /// New display name.
    #[validate(length(min = 2, message = "name must have at least 2 characters"))]
    pub name: Option<String>,

    /// New email address.
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
}

impl CustomerPatch {
    /// Drop blank fields, trim names and normalize emails, then validate.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::Validation` if a supplied field is invalid.
    pub fn normalized(self) -> Result<Self> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let email = self
            .email
            .map(|e| normalize_email(&e))
            .filter(|e| !e.is_empty());

        let patch = Self { name, email };
        patch.validate()?;
        Ok(patch)
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Canonical form of an email used for storage and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
