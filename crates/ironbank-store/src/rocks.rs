//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use ironbank_core::{AccountId, BankAccount, TransactionId, Transfer};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
///
/// Balance mutations are serialized per account through `account_locks`;
/// the number index is guarded by `number_index_lock` so uniqueness checks
/// and the corresponding writes cannot interleave.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Per-account mutexes. Entries are created on first use and retained
    /// for the life of the process.
    account_locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
    number_index_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            account_locks: Mutex::new(HashMap::new()),
            number_index_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Acquire a guard on a plain mutex, converting poisoning into a
    /// storage error instead of panicking.
    fn guard<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>> {
        mutex
            .lock()
            .map_err(|_| StoreError::Database("lock poisoned".into()))
    }

    /// Get (or create) the mutex serializing balance mutations for one
    /// account.
    fn account_lock(&self, account_id: &AccountId) -> Result<Arc<Mutex<()>>> {
        let mut table = Self::guard(&self.account_locks)?;
        Ok(Arc::clone(table.entry(*account_id).or_default()))
    }

    /// Fetch an account or fail with a typed `NotFound`.
    fn require_account(&self, account_id: &AccountId, entity: &'static str) -> Result<BankAccount> {
        self.get_account(account_id)?.ok_or(StoreError::NotFound {
            entity,
            id: account_id.to_string(),
        })
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(&self, account: &BankAccount) -> Result<()> {
        // Uniqueness check and index write must not interleave with another
        // create or update.
        let _index_guard = Self::guard(&self.number_index_lock)?;

        if self.is_account_number_taken(&account.bank_account_number, None)? {
            return Err(StoreError::DuplicateAccountNumber {
                number: account.bank_account_number.clone(),
            });
        }

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_numbers = self.cf(cf::ACCOUNTS_BY_NUMBER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&account.id),
            Self::serialize(account)?,
        );
        batch.put_cf(
            &cf_numbers,
            keys::account_number_key(&account.bank_account_number),
            keys::account_key(&account.id),
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<BankAccount>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(account_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_accounts(&self) -> Result<Vec<BankAccount>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let mut accounts = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            accounts.push(Self::deserialize(&value)?);
        }

        Ok(accounts)
    }

    fn update_account(&self, account: &BankAccount) -> Result<()> {
        let _index_guard = Self::guard(&self.number_index_lock)?;
        let account_lock = self.account_lock(&account.id)?;
        let _account_guard = Self::guard(&account_lock)?;

        // Re-fetch under the lock: the caller's copy may carry a stale
        // balance, and balances are owned by the transfer paths.
        let mut current = self.require_account(&account.id, "account")?;

        let number_changed = account.bank_account_number != current.bank_account_number;
        if number_changed
            && self.is_account_number_taken(&account.bank_account_number, Some(&account.id))?
        {
            return Err(StoreError::DuplicateAccountNumber {
                number: account.bank_account_number.clone(),
            });
        }

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_numbers = self.cf(cf::ACCOUNTS_BY_NUMBER)?;

        let mut batch = WriteBatch::default();
        if number_changed {
            batch.delete_cf(
                &cf_numbers,
                keys::account_number_key(&current.bank_account_number),
            );
            batch.put_cf(
                &cf_numbers,
                keys::account_number_key(&account.bank_account_number),
                keys::account_key(&account.id),
            );
        }

        current.bank_name = account.bank_name.clone();
        current.bank_account_number = account.bank_account_number.clone();
        current.updated_at = chrono::Utc::now();

        batch.put_cf(
            &cf_accounts,
            keys::account_key(&account.id),
            Self::serialize(&current)?,
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn delete_account(&self, account_id: &AccountId) -> Result<()> {
        let _index_guard = Self::guard(&self.number_index_lock)?;
        let account_lock = self.account_lock(account_id)?;
        let _account_guard = Self::guard(&account_lock)?;

        let account = self.require_account(account_id, "account")?;

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_numbers = self.cf(cf::ACCOUNTS_BY_NUMBER)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_accounts, keys::account_key(account_id));
        batch.delete_cf(
            &cf_numbers,
            keys::account_number_key(&account.bank_account_number),
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(account_id = %account_id, "Account deleted");

        Ok(())
    }

    fn is_account_number_taken(
        &self,
        bank_account_number: &str,
        exclude: Option<&AccountId>,
    ) -> Result<bool> {
        let cf = self.cf(cf::ACCOUNTS_BY_NUMBER)?;
        let key = keys::account_number_key(bank_account_number);

        let existing = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match existing {
            None => Ok(false),
            Some(holder) => match exclude {
                Some(account_id) if holder == keys::account_key(account_id) => Ok(false),
                _ => Ok(true),
            },
        }
    }

    fn apply_balance_delta(&self, account_id: &AccountId, delta_cents: i64) -> Result<i64> {
        let account_lock = self.account_lock(account_id)?;
        let _account_guard = Self::guard(&account_lock)?;

        let mut account = self.require_account(account_id, "account")?;

        let new_balance = account.balance_cents + delta_cents;
        if new_balance < 0 {
            return Err(StoreError::NegativeBalance {
                balance: account.balance_cents,
                delta: delta_cents,
            });
        }

        account.balance_cents = new_balance;
        account.updated_at = chrono::Utc::now();

        let cf = self.cf(cf::ACCOUNTS)?;
        self.db
            .put_cf(&cf, keys::account_key(account_id), Self::serialize(&account)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(new_balance)
    }

    // =========================================================================
    // Transfer Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<Transfer>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_transactions(&self) -> Result<Vec<Transfer>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let mut transactions = Vec::new();

        // ULID keys iterate oldest first; reverse for newest first.
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            transactions.push(Self::deserialize(&value)?);
        }
        transactions.reverse();

        Ok(transactions)
    }

    fn list_transactions_by_account(&self, account_id: &AccountId) -> Result<Vec<Transfer>> {
        let cf_by_account = self.cf(cf::TRANSACTIONS_BY_ACCOUNT)?;
        let prefix = keys::account_transactions_prefix(account_id);

        let iter = self.db.iterator_cf(
            &cf_by_account,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        let mut matching_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            matching_keys.push(key.to_vec());
        }

        // Reverse to get newest first.
        matching_keys.reverse();

        let mut transactions = Vec::new();
        for key in matching_keys {
            let tx_id = keys::extract_transaction_id_from_account_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn post_transfer(&self, transfer: &Transfer) -> Result<(i64, i64)> {
        if transfer.source_account_id == transfer.destination_account_id {
            return Err(StoreError::SameAccountTransfer);
        }

        // Acquire both account locks in ascending ID order so two transfers
        // over the same pair cannot deadlock.
        let (first, second) = if transfer.source_account_id < transfer.destination_account_id {
            (transfer.source_account_id, transfer.destination_account_id)
        } else {
            (transfer.destination_account_id, transfer.source_account_id)
        };
        let first_lock = self.account_lock(&first)?;
        let second_lock = self.account_lock(&second)?;
        let _first_guard = Self::guard(&first_lock)?;
        let _second_guard = Self::guard(&second_lock)?;

        // State read under the locks is authoritative; callers may have
        // validated against an earlier snapshot.
        let mut source = self.require_account(&transfer.source_account_id, "source account")?;
        let mut destination =
            self.require_account(&transfer.destination_account_id, "destination account")?;

        if source.balance_cents < transfer.amount_cents {
            return Err(StoreError::InsufficientFunds {
                balance: source.balance_cents,
                required: transfer.amount_cents,
            });
        }

        let now = chrono::Utc::now();
        source.balance_cents -= transfer.amount_cents;
        source.updated_at = now;
        destination.balance_cents += transfer.amount_cents;
        destination.updated_at = now;

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_account = self.cf(cf::TRANSACTIONS_BY_ACCOUNT)?;

        // All five writes land together or not at all: the transfer record
        // is never visible without its balance effects.
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_tx,
            keys::transaction_key(&transfer.id),
            Self::serialize(transfer)?,
        );
        batch.put_cf(
            &cf_tx_by_account,
            keys::account_transaction_key(&transfer.source_account_id, &transfer.id),
            [],
        );
        batch.put_cf(
            &cf_tx_by_account,
            keys::account_transaction_key(&transfer.destination_account_id, &transfer.id),
            [],
        );
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&transfer.source_account_id),
            Self::serialize(&source)?,
        );
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&transfer.destination_account_id),
            Self::serialize(&destination)?,
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(
            transaction_id = %transfer.id,
            source_account_id = %transfer.source_account_id,
            destination_account_id = %transfer.destination_account_id,
            amount_cents = %transfer.amount_cents,
            "Transfer posted"
        );

        Ok((source.balance_cents, destination.balance_cents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironbank_core::UserId;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn seed_account(store: &RocksStore, number: &str, balance_cents: i64) -> BankAccount {
        let account = BankAccount::new(
            UserId::generate(),
            "First National".into(),
            number.into(),
            balance_cents,
        );
        store.create_account(&account).unwrap();
        account
    }

    #[test]
    fn account_crud() {
        let (store, _dir) = create_test_store();
        let account = seed_account(&store, "100-200", 5000);

        let retrieved = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(retrieved.balance_cents, 5000);
        assert_eq!(retrieved.bank_account_number, "100-200");

        let mut renamed = retrieved.clone();
        renamed.bank_name = "Second National".into();
        store.update_account(&renamed).unwrap();
        let updated = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(updated.bank_name, "Second National");

        store.delete_account(&account.id).unwrap();
        assert!(store.get_account(&account.id).unwrap().is_none());
        assert!(!store.is_account_number_taken("100-200", None).unwrap());
    }

    #[test]
    fn delete_missing_account_fails() {
        let (store, _dir) = create_test_store();
        let result = store.delete_account(&AccountId::generate());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn duplicate_account_number_rejected_on_create() {
        let (store, _dir) = create_test_store();
        seed_account(&store, "100-200", 0);

        let clash = BankAccount::new(UserId::generate(), "Other Bank".into(), "100-200".into(), 0);
        let result = store.create_account(&clash);
        assert!(matches!(
            result,
            Err(StoreError::DuplicateAccountNumber { .. })
        ));
        assert!(store.get_account(&clash.id).unwrap().is_none());
    }

    #[test]
    fn duplicate_account_number_rejected_on_update() {
        let (store, _dir) = create_test_store();
        seed_account(&store, "100-200", 0);
        let second = seed_account(&store, "300-400", 0);

        let mut renumbered = second.clone();
        renumbered.bank_account_number = "100-200".into();
        let result = store.update_account(&renumbered);
        assert!(matches!(
            result,
            Err(StoreError::DuplicateAccountNumber { .. })
        ));

        // Keeping its own number is not a conflict.
        let unchanged = second.clone();
        store.update_account(&unchanged).unwrap();
    }

    #[test]
    fn update_renumber_releases_old_number() {
        let (store, _dir) = create_test_store();
        let account = seed_account(&store, "100-200", 0);

        let mut renumbered = account.clone();
        renumbered.bank_account_number = "300-400".into();
        store.update_account(&renumbered).unwrap();

        assert!(!store.is_account_number_taken("100-200", None).unwrap());
        assert!(store.is_account_number_taken("300-400", None).unwrap());
    }

    #[test]
    fn update_does_not_touch_balance() {
        let (store, _dir) = create_test_store();
        let account = seed_account(&store, "100-200", 5000);

        let mut stale = account.clone();
        stale.balance_cents = 0;
        stale.bank_name = "Second National".into();
        store.update_account(&stale).unwrap();

        let current = store.get_account(&account.id).unwrap().unwrap();
        assert_eq!(current.balance_cents, 5000);
        assert_eq!(current.bank_name, "Second National");
    }

    #[test]
    fn balance_delta_applies_and_guards_overdraw() {
        let (store, _dir) = create_test_store();
        let account = seed_account(&store, "100-200", 1000);

        assert_eq!(store.apply_balance_delta(&account.id, 500).unwrap(), 1500);
        assert_eq!(store.apply_balance_delta(&account.id, -1500).unwrap(), 0);

        let result = store.apply_balance_delta(&account.id, -1);
        assert!(matches!(
            result,
            Err(StoreError::NegativeBalance {
                balance: 0,
                delta: -1
            })
        ));
        assert_eq!(
            store.get_account(&account.id).unwrap().unwrap().balance_cents,
            0
        );
    }

    #[test]
    fn post_transfer_moves_funds() {
        let (store, _dir) = create_test_store();
        let source = seed_account(&store, "100-200", 1000);
        let destination = seed_account(&store, "300-400", 500);

        let transfer = Transfer::new(source.id, destination.id, 300, "rent".into());
        let (source_balance, destination_balance) = store.post_transfer(&transfer).unwrap();

        assert_eq!(source_balance, 700);
        assert_eq!(destination_balance, 800);

        // Conservation: total unchanged.
        assert_eq!(source_balance + destination_balance, 1500);

        let recorded = store.get_transaction(&transfer.id).unwrap().unwrap();
        assert_eq!(recorded.amount_cents, 300);
        assert_eq!(recorded.notes, "rent");

        // Indexed under both accounts.
        let by_source = store.list_transactions_by_account(&source.id).unwrap();
        let by_destination = store.list_transactions_by_account(&destination.id).unwrap();
        assert_eq!(by_source.len(), 1);
        assert_eq!(by_destination.len(), 1);
        assert_eq!(by_source[0].id, transfer.id);
    }

    #[test]
    fn post_transfer_insufficient_leaves_no_trace() {
        let (store, _dir) = create_test_store();
        let source = seed_account(&store, "100-200", 1000);
        let destination = seed_account(&store, "300-400", 500);

        let transfer = Transfer::new(source.id, destination.id, 1500, String::new());
        let result = store.post_transfer(&transfer);
        assert!(matches!(
            result,
            Err(StoreError::InsufficientFunds {
                balance: 1000,
                required: 1500
            })
        ));

        assert_eq!(
            store.get_account(&source.id).unwrap().unwrap().balance_cents,
            1000
        );
        assert_eq!(
            store
                .get_account(&destination.id)
                .unwrap()
                .unwrap()
                .balance_cents,
            500
        );
        assert!(store.get_transaction(&transfer.id).unwrap().is_none());
        assert!(store.list_transactions().unwrap().is_empty());
    }

    #[test]
    fn post_transfer_same_account_rejected() {
        let (store, _dir) = create_test_store();
        let account = seed_account(&store, "100-200", 1000);

        let transfer = Transfer::new(account.id, account.id, 100, String::new());
        let result = store.post_transfer(&transfer);
        assert!(matches!(result, Err(StoreError::SameAccountTransfer)));
        assert_eq!(
            store.get_account(&account.id).unwrap().unwrap().balance_cents,
            1000
        );
    }

    #[test]
    fn post_transfer_missing_destination() {
        let (store, _dir) = create_test_store();
        let source = seed_account(&store, "100-200", 1000);

        let transfer = Transfer::new(source.id, AccountId::generate(), 100, String::new());
        let result = store.post_transfer(&transfer);
        assert!(matches!(
            result,
            Err(StoreError::NotFound {
                entity: "destination account",
                ..
            })
        ));
    }

    #[test]
    fn list_transactions_newest_first() {
        let (store, _dir) = create_test_store();
        let source = seed_account(&store, "100-200", 1000);
        let destination = seed_account(&store, "300-400", 0);

        let first = Transfer::new(source.id, destination.id, 100, "first".into());
        store.post_transfer(&first).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs

        let second = Transfer::new(source.id, destination.id, 200, "second".into());
        store.post_transfer(&second).unwrap();

        let all = store.list_transactions().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].notes, "second");
        assert_eq!(all[1].notes, "first");

        let by_account = store.list_transactions_by_account(&source.id).unwrap();
        assert_eq!(by_account[0].notes, "second");
        assert_eq!(by_account[1].notes, "first");
    }

    #[test]
    fn concurrent_transfers_never_overdraw() {
        let (store, _dir) = create_test_store();
        let source = seed_account(&store, "100-200", 1000);
        let destination = seed_account(&store, "300-400", 0);

        let t1 = Transfer::new(source.id, destination.id, 500, String::new());
        let t2 = Transfer::new(source.id, destination.id, 600, String::new());

        let (r1, r2) = std::thread::scope(|s| {
            let h1 = s.spawn(|| store.post_transfer(&t1));
            let h2 = s.spawn(|| store.post_transfer(&t2));
            (h1.join().unwrap(), h2.join().unwrap())
        });

        // Exactly one wins; the loser sees insufficient funds.
        let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        let loser = if r1.is_err() { r1 } else { r2 };
        assert!(matches!(loser, Err(StoreError::InsufficientFunds { .. })));

        let final_source = store.get_account(&source.id).unwrap().unwrap();
        let final_destination = store.get_account(&destination.id).unwrap().unwrap();
        assert!(final_source.balance_cents >= 0);
        assert_eq!(
            final_source.balance_cents + final_destination.balance_cents,
            1000
        );
        assert_eq!(store.list_transactions().unwrap().len(), 1);
    }
}
