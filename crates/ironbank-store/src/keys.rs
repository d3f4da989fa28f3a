//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families.

use ironbank_core::{AccountId, TransactionId};

/// Create an account key from an account ID.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.to_bytes().to_vec()
}

/// Create an account-number index key.
#[must_use]
pub fn account_number_key(bank_account_number: &str) -> Vec<u8> {
    bank_account_number.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create an account-transaction index key.
///
/// Format: `account_id (16 bytes) || transaction_id (16 bytes)`
///
/// Since ULIDs are time-ordered, transfers for an account are sorted by
/// creation time.
#[must_use]
pub fn account_transaction_key(account_id: &AccountId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&account_id.to_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transfers touching an account.
#[must_use]
pub fn account_transactions_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.to_bytes().to_vec()
}

/// Extract the transaction ID from an account-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_account_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes).expect("valid ULID bytes")
}
