//! Error types for ironbank storage.

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

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Which kind of record was missing.
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// Source balance does not cover the requested debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// A balance adjustment would drive the balance below zero.
    #[error("balance would go negative: balance={balance}, delta={delta}")]
    NegativeBalance {
        /// Current balance in cents.
        balance: i64,
        /// The rejected delta in cents.
        delta: i64,
    },

    /// The bank account number is already in use.
    #[error("bank account number already in use: {number}")]
    DuplicateAccountNumber {
        /// The conflicting number.
        number: String,
    },

    /// A transfer named the same account as both source and destination.
    #[error("transfer source and destination are the same account")]
    SameAccountTransfer,
}
