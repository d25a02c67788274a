//! Request and response types for the clientes client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Customer {
    /// Customer ID (UUID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address (lowercased by the server).
    pub email: String,
    /// Current balance.
    pub balance: Decimal,
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money added.
    Deposit,
    /// Money taken.
    Withdraw,
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    /// Transaction ID (ULID).
    pub transaction_id: String,
    /// Owning customer.
    pub customer_id: String,
    /// Signed amount (positive deposit, negative withdrawal).
    pub amount: Decimal,
    /// Deposit or withdrawal.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// One page of transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionPage {
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub size: u64,
    /// Total entries across all pages.
    pub total_items: u64,
    /// Total pages.
    pub total_pages: u64,
    /// Entries on this page, newest first.
    pub items: Vec<Transaction>,
}

/// Create customer request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateCustomerRequest {
    /// Display name (at least 2 characters).
    pub name: String,
    /// Email address.
    pub email: String,
}

/// Partial customer update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCustomerRequest {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Deposit or withdrawal request.
#[derive(Debug, Clone, Serialize)]
pub struct AmountRequest {
    /// Amount to move, sent as a decimal string.
    pub amount: Decimal,
}

/// API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}
