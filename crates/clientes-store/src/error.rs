//! Error types for clientes storage.

use clientes_core::CustomerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The customer does not exist.
    #[error("customer not found: {customer_id}")]
    NotFound {
        /// The customer ID that was looked up.
        customer_id: String,
    },

    /// The email is already registered to another customer.
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// The customer changed since the caller read it.
    #[error("version conflict for customer {customer_id}: expected {expected}")]
    VersionConflict {
        /// The customer being written.
        customer_id: String,
        /// Version the caller expected.
        expected: i64,
    },

    /// The database is temporarily locked by another writer.
    #[error("database busy: {0}")]
    Busy(String),
}

impl StoreError {
    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::Busy(_))
    }
}

/// SQLite primary result codes for lock contention.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => Self::Busy(err.to_string()),
            sqlx::Error::Database(db) if is_lock_contention(db.code().as_deref()) => {
                Self::Busy(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Serialization(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Extended result codes keep the primary code in the low byte.
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

/// Client-facing text for contention; the storage detail stays in the logs.
pub const CONFLICT_MESSAGE: &str = "concurrent modification, retry";

impl From<StoreError> for CustomerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { customer_id } => Self::NotFound { customer_id },
            StoreError::DuplicateEmail { email } => Self::DuplicateEmail { email },
            StoreError::VersionConflict { .. } | StoreError::Busy(_) => {
                tracing::warn!(error = %err, "Storage contention reported as conflict");
                Self::Conflict(CONFLICT_MESSAGE.into())
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_contention_is_transient() {
        assert!(StoreError::Busy("locked".into()).is_transient());
        assert!(StoreError::VersionConflict {
            customer_id: "c".into(),
            expected: 1
        }
        .is_transient());
        assert!(!StoreError::NotFound {
            customer_id: "c".into()
        }
        .is_transient());
        assert!(!StoreError::Database("disk full".into()).is_transient());
    }

    #[test]
    fn sqlite_lock_codes_are_contention() {
        assert!(is_lock_contention(Some("5")));
        assert!(is_lock_contention(Some("517"))); // SQLITE_BUSY_SNAPSHOT
        assert!(is_lock_contention(Some("6")));
        assert!(!is_lock_contention(Some("2067"))); // SQLITE_CONSTRAINT_UNIQUE
        assert!(!is_lock_contention(None));
    }

    #[test]
    fn contention_hides_storage_text() {
        let busy = StoreError::Busy(
            "error returned from database: (code: 5) database is locked".into(),
        );
        assert_eq!(
            CustomerError::from(busy),
            CustomerError::Conflict(CONFLICT_MESSAGE.into())
        );

        let stale = StoreError::VersionConflict {
            customer_id: "c".into(),
            expected: 4,
        };
        assert_eq!(
            CustomerError::from(stale),
            CustomerError::Conflict(CONFLICT_MESSAGE.into())
        );
    }

    #[test]
    fn storage_failures_become_internal_errors() {
        let err = CustomerError::from(StoreError::Database("UNIQUE constraint".into()));
        assert!(matches!(err, CustomerError::Internal(_)));

        let err = CustomerError::from(StoreError::DuplicateEmail {
            email: "a@b.io".into(),
        });
        assert_eq!(
            err,
            CustomerError::DuplicateEmail {
                email: "a@b.io".into()
            }
        );
    }
}
