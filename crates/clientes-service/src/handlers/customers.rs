//! Customer handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use clientes_core::{Customer, CustomerError, CustomerId, CustomerPatch, Decimal, NewCustomer};

use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::state::AppState;

/// Customer response.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    /// Customer ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Current balance, as a decimal string.
    pub balance: Decimal,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            name: customer.name,
            email: customer.email,
            balance: customer.balance,
        }
    }
}

/// Deposit or withdrawal request. `amount` may be a JSON string or number.
///
/// Numbers are parsed from their literal text, never through `f64`.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Amount to move, greater than zero.
    #[serde(deserialize_with = "rust_decimal::serde::arbitrary_precision::deserialize")]
    pub amount: Decimal,
}

pub(crate) fn parse_id(raw: &str) -> Result<CustomerId, ApiError> {
    raw.parse::<CustomerId>()
        .map_err(|e| CustomerError::from(e).into())
}

/// List all customers.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CustomerResponse>>, ApiError> {
    let customers = state.customers.list().await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// Get one customer.
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state.customers.get(parse_id(&id)?).await?;
    Ok(Json(customer.into()))
}

/// Register a customer.
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<NewCustomer>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = state.customers.create(body).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// Change a customer's name and/or email.
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
    AppJson(body): AppJson<CustomerPatch>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state.customers.update(parse_id(&id)?, body).await?;
    Ok(Json(customer.into()))
}

/// Delete a customer and its ledger.
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<StatusCode, ApiError> {
    state.customers.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deposit into a customer's balance.
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
    AppJson(body): AppJson<AmountRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let id = parse_id(&id)?;
    let customer = state.customers.deposit(id, body.amount).await?;

    tracing::info!(customer_id = %id, amount = %body.amount, "Deposit applied");
    Ok(Json(customer.into()))
}

/// Withdraw from a customer's balance.
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
    AppJson(body): AppJson<AmountRequest>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let id = parse_id(&id)?;
    let customer = state.customers.withdraw(id, body.amount).await?;

    tracing::info!(customer_id = %id, amount = %body.amount, "Withdrawal applied");
    Ok(Json(customer.into()))
}
