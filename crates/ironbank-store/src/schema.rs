//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `account_id` (ULID).
    pub const ACCOUNTS: &str = "accounts";

    /// Unique index: bank account number -> `account_id`.
    pub const ACCOUNTS_BY_NUMBER: &str = "accounts_by_number";

    /// Transfer records, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transfers by account, keyed by `account_id || transaction_id`.
    /// Value is empty (index only). Each transfer appears under both its
    /// source and destination account.
    pub const TRANSACTIONS_BY_ACCOUNT: &str = "transactions_by_account";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::ACCOUNTS_BY_NUMBER,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_ACCOUNT,
    ]
}
