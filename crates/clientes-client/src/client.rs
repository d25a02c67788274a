//! Clientes HTTP client implementation.

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    AmountRequest, ApiErrorResponse, CreateCustomerRequest, Customer, TransactionPage,
    UpdateCustomerRequest,
};

/// Clientes API client.
///
/// Provides methods for managing customers, moving money and reading the
/// transaction history.
#[derive(Debug, Clone)]
pub struct CustomersClient {
    client: Client,
    base_url: String,
}

impl CustomersClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the clientes service (e.g., `"http://clientes:3000"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// List all customers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, ClientError> {
        self.send(self.request(Method::GET, "/clientes")).await
    }

    /// Get one customer.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CustomerNotFound` if the customer doesn't exist.
    pub async fn get_customer(&self, id: &str) -> Result<Customer, ClientError> {
        self.send(self.request(Method::GET, &format!("/clientes/{id}")))
            .await
    }

    /// Register a customer.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::EmailAlreadyExists` if the email is taken.
    pub async fn create_customer(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Customer, ClientError> {
        let request = CreateCustomerRequest {
            name: name.into(),
            email: email.into(),
        };

        self.send(self.request(Method::POST, "/clientes").json(&request))
            .await
    }

    /// Change a customer's name and/or email.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer doesn't exist or the email is taken.
    pub async fn update_customer(
        &self,
        id: &str,
        update: &UpdateCustomerRequest,
    ) -> Result<Customer, ClientError> {
        self.send(
            self.request(Method::PUT, &format!("/clientes/{id}"))
                .json(update),
        )
        .await
    }

    /// Delete a customer and its transaction history.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::CustomerNotFound` if the customer doesn't exist.
    pub async fn delete_customer(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/clientes/{id}"))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from(response).await)
    }

    /// Deposit `amount` and return the updated customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn deposit(&self, id: &str, amount: Decimal) -> Result<Customer, ClientError> {
        self.send(
            self.request(Method::POST, &format!("/clientes/{id}/depositar"))
                .json(&AmountRequest { amount }),
        )
        .await
    }

    /// Withdraw `amount` and return the updated customer.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InsufficientBalance` if the balance is too low.
    pub async fn withdraw(&self, id: &str, amount: Decimal) -> Result<Customer, ClientError> {
        self.send(
            self.request(Method::POST, &format!("/clientes/{id}/sacar"))
                .json(&AmountRequest { amount }),
        )
        .await
    }

    /// Get one page of a customer's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_transactions(
        &self,
        id: &str,
        page: u64,
        size: u64,
    ) -> Result<TransactionPage, ClientError> {
        self.send(
            self.request(Method::GET, &format!("/clientes/{id}/transacoes"))
                .query(&[("page", page), ("size", size)]),
        )
        .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
    }

    /// Send a request and decode a successful JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;

        if response.status().is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        Err(Self::error_from(response).await)
    }

    /// Convert an error response into a typed error.
    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body: Result<ApiErrorResponse, _> = response.json().await;

        match body {
            Ok(api_error) => {
                tracing::debug!(
                    status = status.as_u16(),
                    code = %api_error.code,
                    "Clientes API returned an error"
                );
                map_error(status, api_error)
            }
            Err(_) => ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            },
        }
    }
}

/// Map specific error codes to typed errors.
fn map_error(status: StatusCode, error: ApiErrorResponse) -> ClientError {
    let ApiErrorResponse { code, message } = error;

    match code.as_str() {
        "CUSTOMER_NOT_FOUND" => ClientError::CustomerNotFound { message },
        "EMAIL_ALREADY_EXISTS" => ClientError::EmailAlreadyExists { message },
        "INSUFICIENT_BALANCE" => ClientError::InsufficientBalance { message },
        _ => ClientError::Api {
            code,
            message,
            status: status.as_u16(),
        },
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}
