//! `RocksDB` storage layer for ironbank.
//!
//! This crate is the ledger accessor: it provides persistent storage for
//! bank accounts and transfer records using `RocksDB` with column families
//! for indexing, and it owns every balance mutation.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: Primary account records, keyed by `account_id` (ULID)
//! - `accounts_by_number`: Unique index from bank account number to `account_id`
//! - `transactions`: Transfer records, keyed by `transaction_id` (ULID)
//! - `transactions_by_account`: Index for listing transfers touching an account
//!
//! Balance mutations are serialized per account: `post_transfer` and
//! `apply_balance_delta` hold the affected accounts' locks across the
//! read-check-write sequence, and all multi-record effects land in a single
//! `WriteBatch`. A transfer record is therefore never observable without its
//! paired balance changes.
//!
//! # Example
//!
//! ```no_run
//! use ironbank_store::{RocksStore, Store};
//! use ironbank_core::{BankAccount, UserId};
//!
//! let store = RocksStore::open("/tmp/ironbank-db").unwrap();
//!
//! let owner = UserId::generate();
//! let account = BankAccount::new(owner, "First National".into(), "1234".into(), 1000);
//! store.create_account(&account).unwrap();
//!
//! let retrieved = store.get_account(&account.id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use ironbank_core::{AccountId, BankAccount, TransactionId, Transfer};

/// The storage trait defining all ledger operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a new account record, enforcing account-number uniqueness.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateAccountNumber` if another account already
    ///   holds the same bank account number.
    /// - `StoreError::Database` if the database operation fails.
    fn create_account(&self, account: &BankAccount) -> Result<()>;

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<BankAccount>>;

    /// List all accounts in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_accounts(&self) -> Result<Vec<BankAccount>>;

    /// Rewrite an account's bank name and account number, maintaining the
    /// unique number index.
    ///
    /// The balance carried by `account` is ignored; balances change only
    /// through `apply_balance_delta` and `post_transfer`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::DuplicateAccountNumber` if the new number belongs to
    ///   a different account.
    fn update_account(&self, account: &BankAccount) -> Result<()>;

    /// Delete an account and its number-index entry.
    ///
    /// Transfer history referencing the account is retained; transfer
    /// records are immutable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn delete_account(&self, account_id: &AccountId) -> Result<()>;

    /// Check whether a bank account number is already in use, optionally
    /// excluding one account (the record being updated).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn is_account_number_taken(
        &self,
        bank_account_number: &str,
        exclude: Option<&AccountId>,
    ) -> Result<bool>;

    /// Adjust an account balance by a signed delta, under the account's
    /// lock. Returns the new balance.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::NegativeBalance` if the resulting balance would be
    ///   negative.
    fn apply_balance_delta(&self, account_id: &AccountId, delta_cents: i64) -> Result<i64>;

    // =========================================================================
    // Transfer Operations
    // =========================================================================

    /// Get a transfer record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transfer>>;

    /// List all transfer records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions(&self) -> Result<Vec<Transfer>>;

    /// List transfers touching an account (as source or destination),
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_account(&self, account_id: &AccountId) -> Result<Vec<Transfer>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Post a transfer: debit the source, credit the destination, and insert
    /// the transfer record as one atomic unit.
    ///
    /// The sufficiency check and both balance writes happen under the two
    /// account locks, so concurrent transfers over the same account cannot
    /// lose updates; transfers over disjoint pairs proceed independently.
    ///
    /// Returns the new `(source, destination)` balances.
    ///
    /// # Errors
    ///
    /// - `StoreError::SameAccountTransfer` if source and destination match.
    /// - `StoreError::NotFound` if either account doesn't exist.
    /// - `StoreError::InsufficientFunds` if the source balance doesn't cover
    ///   the amount.
    fn post_transfer(&self, transfer: &Transfer) -> Result<(i64, i64)>;
}
