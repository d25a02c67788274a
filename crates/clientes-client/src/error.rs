//! Client error types.

/// Errors that can occur when using the clientes client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Customer not found.
    #[error("customer not found: {message}")]
    CustomerNotFound {
        /// Server message.
        message: String,
    },

    /// Email already registered to another customer.
    #[error("email already exists: {message}")]
    EmailAlreadyExists {
        /// Server message.
        message: String,
    },

    /// Withdrawal larger than the balance.
    #[error("insufficient balance: {message}")]
    InsufficientBalance {
        /// Server message.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
