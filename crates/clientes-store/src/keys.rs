//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use clientes_core::{CustomerId, TransactionId};

/// Create a customer key from a customer ID.
#[must_use]
pub fn customer_key(customer_id: &CustomerId) -> Vec<u8> {
    customer_id.as_bytes().to_vec()
}

/// Create an email index key. Emails are stored normalized.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    email.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a customer-transaction index key.
///
/// Format: `customer_id (16 bytes) || sequence (8 bytes, big-endian)`
///
/// The sequence is the customer version produced by the balance change, so
/// keys for one customer sort in commit order even within one millisecond.
#[must_use]
pub fn customer_transaction_key(customer_id: &CustomerId, sequence: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(customer_id.as_bytes());
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

/// Create a prefix for iterating all transactions of a customer.
#[must_use]
pub fn customer_transactions_prefix(customer_id: &CustomerId) -> Vec<u8> {
    customer_id.as_bytes().to_vec()
}

/// Decode a transaction ID stored as an index value.
///
/// Returns `None` if the value is not 16 bytes long.
#[must_use]
pub fn transaction_id_from_value(value: &[u8]) -> Option<TransactionId> {
    let bytes: [u8; 16] = value.try_into().ok()?;
    Some(TransactionId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_key_length() {
        assert_eq!(customer_key(&CustomerId::generate()).len(), 16);
    }

    #[test]
    fn index_keys_sort_by_sequence() {
        let customer_id = CustomerId::generate();
        let low = customer_transaction_key(&customer_id, 9);
        let high = customer_transaction_key(&customer_id, 256);

        assert_eq!(low.len(), 24);
        assert!(low.starts_with(&customer_transactions_prefix(&customer_id)));
        assert!(low < high);
    }

    #[test]
    fn transaction_id_value_roundtrip() {
        let tx_id = TransactionId::generate();
        let value = transaction_key(&tx_id);

        assert_eq!(transaction_id_from_value(&value), Some(tx_id));
        assert_eq!(transaction_id_from_value(&value[..8]), None);
    }
}
