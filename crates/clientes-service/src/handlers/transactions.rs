//! Transaction history handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use clientes_core::{Decimal, LedgerEntry, Page, TransactionType, DEFAULT_PAGE_SIZE};

use crate::error::ApiError;
use crate::extract::{AppPath, AppQuery};
use crate::handlers::customers::parse_id;
use crate::state::AppState;

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// 1-based page number (default: 1).
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page (default: 10).
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 {
    1
}

#[allow(clippy::cast_possible_wrap)]
fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE as i64
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub transaction_id: String,
    /// Owning customer.
    pub customer_id: String,
    /// Signed amount (positive deposit, negative withdrawal).
    pub amount: Decimal,
    /// `deposit` or `withdraw`.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Timestamp (RFC 3339).
    pub created_at: String,
}

impl From<LedgerEntry> for TransactionResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            transaction_id: entry.id.to_string(),
            customer_id: entry.customer_id.to_string(),
            amount: entry.amount,
            transaction_type: entry.transaction_type,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// List a customer's transactions, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
    AppQuery(query): AppQuery<ListTransactionsQuery>,
) -> Result<Json<Page<TransactionResponse>>, ApiError> {
    let page = state
        .customers
        .list_transactions(parse_id(&id)?, query.page, query.size)
        .await?;

    Ok(Json(page.map(Into::into)))
}
