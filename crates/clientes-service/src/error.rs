//! API error types and responses.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use clientes_core::CustomerError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request - malformed or invalid input.
    #[error("{0}")]
    InvalidRequest(String),

    /// The request could not be read (body too large, wrong content type, ...).
    #[error("{message}")]
    Rejected {
        /// Status chosen by the extractor.
        status: StatusCode,
        /// Extractor message.
        message: String,
    },

    /// Requested ledger page does not exist.
    #[error("{0}")]
    InvalidPage(String),

    /// Customer not found.
    #[error("{0}")]
    NotFound(String),

    /// Email already registered.
    #[error("{0}")]
    EmailTaken(String),

    /// Withdrawal larger than the balance.
    #[error("{0}")]
    InsufficientBalance(String),

    /// Concurrent modification could not be resolved.
    #[error("{0}")]
    Conflict(String),

    /// Rate limit exceeded.
    #[error("too many requests, try again later")]
    TooManyRequests,

    /// The request took longer than the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidPage(_)
            | Self::EmailTaken(_)
            | Self::InsufficientBalance(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error code reported in the response body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::Rejected { .. } => "INVALID_REQUEST",
            Self::InvalidPage(_) => "INVALID_PAGE",
            Self::NotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::EmailTaken(_) => "EMAIL_ALREADY_EXISTS",
            Self::InsufficientBalance(_) => "INSUFICIENT_BALANCE",
            Self::Conflict(_) => "CONFLICT",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::Timeout => "REQUEST_TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: self.code().to_string(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<CustomerError> for ApiError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::Validation(msg) => Self::InvalidRequest(msg),
            err @ CustomerError::InvalidPage { .. } => Self::InvalidPage(err.to_string()),
            err @ CustomerError::NotFound { .. } => Self::NotFound(err.to_string()),
            err @ CustomerError::DuplicateEmail { .. } => Self::EmailTaken(err.to_string()),
            err @ CustomerError::InsufficientFunds { .. } => {
                Self::InsufficientBalance(err.to_string())
            }
            CustomerError::Conflict(msg) => Self::Conflict(msg),
            CustomerError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<clientes_store::StoreError> for ApiError {
    fn from(err: clientes_store::StoreError) -> Self {
        CustomerError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(_) => Self::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            },
            other => Self::InvalidRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientes_core::Decimal;
    use clientes_store::{StoreError, CONFLICT_MESSAGE};

    #[test]
    fn domain_errors_map_to_codes() {
        let cases = [
            (
                CustomerError::Validation("name".into()),
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
            ),
            (
                CustomerError::InvalidPage {
                    page: 3,
                    total_pages: 2,
                },
                StatusCode::BAD_REQUEST,
                "INVALID_PAGE",
            ),
            (
                CustomerError::not_found("abc"),
                StatusCode::NOT_FOUND,
                "CUSTOMER_NOT_FOUND",
            ),
            (
                CustomerError::DuplicateEmail {
                    email: "a@b.io".into(),
                },
                StatusCode::BAD_REQUEST,
                "EMAIL_ALREADY_EXISTS",
            ),
            (
                CustomerError::InsufficientFunds {
                    balance: Decimal::ONE,
                    requested: Decimal::TWO,
                },
                StatusCode::BAD_REQUEST,
                "INSUFICIENT_BALANCE",
            ),
            (
                CustomerError::Conflict("busy".into()),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                CustomerError::Internal("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    async fn render(err: ApiError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_details_stay_in_logs() {
        let (status, body) =
            render(ApiError::Internal("database is locked at page 7".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert_eq!(body.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn contention_details_stay_in_logs() {
        let busy = StoreError::Busy(
            "error returned from database: (code: 5) database is locked".into(),
        );
        let (status, body) = render(ApiError::from(busy)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.code, "CONFLICT");
        assert_eq!(body.message, CONFLICT_MESSAGE);
        assert!(!body.message.contains("database"));
    }
}
