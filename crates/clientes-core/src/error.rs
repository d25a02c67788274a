//! Domain error types.

use rust_decimal::Decimal;

use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, CustomerError>;

/// Errors that can occur in customer and balance operations.
///
/// Storage errors are translated into this taxonomy before they leave the
/// service layer; no variant carries raw storage-engine text to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustomerError {
    /// Input has the wrong shape or is out of range.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Requested ledger page is past the last page.
    #[error("page {page} does not exist, total pages: {total_pages}")]
    InvalidPage {
        /// The requested page.
        page: u64,
        /// Number of pages available.
        total_pages: u64,
    },

    /// Customer not found.
    #[error("customer not found: {customer_id}")]
    NotFound {
        /// The customer ID that was not found.
        customer_id: String,
    },

    /// Another customer already uses this email.
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// The withdrawal would leave a negative balance.
    #[error("insufficient balance: balance={balance}, requested={requested}")]
    InsufficientFunds {
        /// Balance at the time of the attempt.
        balance: Decimal,
        /// Amount that was requested.
        requested: Decimal,
    },

    /// Concurrent modification could not be resolved within the retry budget.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected storage or IO failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CustomerError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(customer_id: impl ToString) -> Self {
        Self::NotFound {
            customer_id: customer_id.to_string(),
        }
    }
}

impl From<IdError> for CustomerError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for CustomerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        messages.sort();
        Self::Validation(messages.join("; "))
    }
}
