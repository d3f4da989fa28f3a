//! Bank account types for ironbank.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, UserId};

/// A bank account belonging to a user.
///
/// The balance is mutated only by account creation, deletion, and the
/// transfer engine's paired debit/credit. The `bank_account_number` is
/// unique across all live accounts; the store enforces this with a
/// dedicated index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    /// Unique account ID (ULID for time-ordering).
    pub id: AccountId,

    /// The user who owns this account.
    pub owner_id: UserId,

    /// Name of the bank holding the account.
    pub bank_name: String,

    /// Bank account number, unique across all accounts.
    pub bank_account_number: String,

    /// Current balance in cents. Never negative.
    pub balance_cents: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl BankAccount {
    /// Create a new account with the given opening balance.
    #[must_use]
    pub fn new(
        owner_id: UserId,
        bank_name: String,
        bank_account_number: String,
        balance_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::generate(),
            owner_id,
            bank_name,
            bank_account_number,
            balance_cents,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can cover a debit of `amount_cents`.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount_cents: i64) -> bool {
        self.balance_cents >= amount_cents
    }

    /// Check if the account is owned by the given user.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id == *user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account(balance_cents: i64) -> BankAccount {
        BankAccount::new(
            UserId::generate(),
            "First National".into(),
            "1234567890".into(),
            balance_cents,
        )
    }

    #[test]
    fn new_account_carries_opening_balance() {
        let account = test_account(2500);
        assert_eq!(account.balance_cents, 2500);
        assert_eq!(account.bank_name, "First National");
        assert_eq!(account.created_at, account.updated_at);
    }

    #[test]
    fn sufficient_funds_boundary() {
        let account = test_account(1000);
        assert!(account.has_sufficient_funds(500));
        assert!(account.has_sufficient_funds(1000));
        assert!(!account.has_sufficient_funds(1001));
    }

    #[test]
    fn ownership_check() {
        let account = test_account(0);
        let owner = account.owner_id;
        let stranger = UserId::generate();

        assert!(account.is_owned_by(&owner));
        assert!(!account.is_owned_by(&stranger));
    }
}
