//! Transfer transaction types for ironbank.
//!
//! A transfer records a completed movement of funds between two accounts.
//! Records are immutable once created; the store only ever inserts them,
//! and only together with the paired balance mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, TransactionId};

/// A completed funds transfer between two bank accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The account that was debited.
    pub source_account_id: AccountId,

    /// The account that was credited.
    pub destination_account_id: AccountId,

    /// Amount moved, in cents. Always strictly positive.
    pub amount_cents: i64,

    /// Free-text note attached by the caller.
    pub notes: String,

    /// When the transfer was created.
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Create a new transfer record with a generated ID.
    #[must_use]
    pub fn new(
        source_account_id: AccountId,
        destination_account_id: AccountId,
        amount_cents: i64,
        notes: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            source_account_id,
            destination_account_id,
            amount_cents,
            notes,
            created_at: Utc::now(),
        }
    }

    /// Check whether the given account participates in this transfer.
    #[must_use]
    pub fn touches(&self, account_id: &AccountId) -> bool {
        self.source_account_id == *account_id || self.destination_account_id == *account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transfer_has_unique_ids() {
        let source = AccountId::generate();
        let destination = AccountId::generate();
        let a = Transfer::new(source, destination, 300, "rent".into());
        let b = Transfer::new(source, destination, 300, "rent".into());

        assert_ne!(a.id, b.id);
        assert_eq!(a.amount_cents, 300);
        assert_eq!(a.notes, "rent");
    }

    #[test]
    fn touches_both_sides() {
        let source = AccountId::generate();
        let destination = AccountId::generate();
        let other = AccountId::generate();
        let transfer = Transfer::new(source, destination, 100, String::new());

        assert!(transfer.touches(&source));
        assert!(transfer.touches(&destination));
        assert!(!transfer.touches(&other));
    }

    #[test]
    fn transfer_serde_json() {
        let transfer = Transfer::new(
            AccountId::generate(),
            AccountId::generate(),
            4200,
            "invoice #17".into(),
        );
        let json = serde_json::to_string(&transfer).unwrap();
        let parsed: Transfer = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, transfer.id);
        assert_eq!(parsed.amount_cents, 4200);
        assert_eq!(parsed.notes, "invoice #17");
    }
}
