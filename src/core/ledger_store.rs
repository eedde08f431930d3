//! Thread-safe in-memory ledger store
//!
//! This module provides `InMemoryLedgerStore`, the default `LedgerStore`
//! implementation. Every collection lives in its own `DashMap`, which shards
//! its locks so that operations on different users or transactions never
//! block each other.
//!
//! # Atomic updates
//!
//! `update_user` and `update_transaction` hold the entry's write lock for the
//! whole closure. The closure works on a draft copy which is only written back
//! when it returns `Ok`, so a failed closure can never leave a half-applied
//! record behind.
//!
//! # Lock ordering
//!
//! The settlement engine nests transaction updates inside user updates.
//! Nothing in the crate takes a user lock while holding a transaction lock,
//! which keeps the two maps deadlock free.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

use super::traits::{Collection, LedgerStore};
use crate::types::{
    normalize_email, GoldPrice, LedgerError, PaymentMethod, PaymentMethodInfo, PriceId,
    Transaction, TransactionId, User, UserId,
};

/// Plain copy of every collection, used for persistence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    /// Users ordered by id
    pub users: Vec<User>,
    /// Price history ordered by id (oldest first)
    pub prices: Vec<GoldPrice>,
    /// Payment instructions in display order
    pub payment_methods: Vec<PaymentMethodInfo>,
    /// Transactions ordered by id (oldest first)
    pub transactions: Vec<Transaction>,
}

/// `DashMap`-backed ledger store
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    users: DashMap<UserId, User>,

    /// Normalized email -> user id; claimed before the user row is written
    email_index: DashMap<String, UserId>,

    prices: DashMap<PriceId, GoldPrice>,
    payment_methods: DashMap<PaymentMethod, PaymentMethodInfo>,
    transactions: DashMap<TransactionId, Transaction>,

    user_seq: AtomicU64,
    price_seq: AtomicU64,
    txn_seq: AtomicU64,
}

impl InMemoryLedgerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot
    ///
    /// Id sequences resume after the highest id found in each collection.
    /// Duplicate ids or emails in the snapshot are rejected.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        let store = Self::new();

        for user in snapshot.users {
            store.insert_user(user)?;
        }
        for price in snapshot.prices {
            store.append_price(price)?;
        }
        for info in snapshot.payment_methods {
            store.upsert_payment_method(info);
        }
        for txn in snapshot.transactions {
            store.insert_transaction(txn)?;
        }

        debug!(
            users = store.users.len(),
            prices = store.prices.len(),
            transactions = store.transactions.len(),
            "Ledger store restored from snapshot"
        );

        Ok(store)
    }

    /// Copy every collection out of the store
    ///
    /// Each collection is copied separately; callers that need a consistent
    /// cut across collections should snapshot while no writes are in flight.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut prices: Vec<GoldPrice> = self.prices.iter().map(|e| e.value().clone()).collect();
        prices.sort_by_key(|p| p.id);

        let mut transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .map(|e| e.value().clone())
            .collect();
        transactions.sort_by_key(|t| t.id);

        LedgerSnapshot {
            users: self.list_users(),
            prices,
            payment_methods: self.list_payment_methods(),
            transactions,
        }
    }

    fn sequence(&self, collection: Collection) -> &AtomicU64 {
        match collection {
            Collection::Users => &self.user_seq,
            Collection::Prices => &self.price_seq,
            Collection::Transactions => &self.txn_seq,
        }
    }

    /// Make sure ids handed out later never collide with `id`
    fn observe_id(&self, collection: Collection, id: u64) {
        self.sequence(collection).fetch_max(id, Ordering::SeqCst);
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn next_id(&self, collection: Collection) -> u64 {
        self.sequence(collection).fetch_add(1, Ordering::SeqCst) + 1
    }

    fn get_user(&self, user_id: UserId) -> Option<User> {
        self.users.get(&user_id).map(|entry| entry.value().clone())
    }

    fn find_user_by_email(&self, email: &str) -> Option<User> {
        let user_id = self
            .email_index
            .get(&normalize_email(email))
            .map(|entry| *entry.value())?;
        self.get_user(user_id)
    }

    fn insert_user(&self, user: User) -> Result<User, LedgerError> {
        let email = normalize_email(&user.email);
        let user_id = user.id;

        // Claim the email first so two concurrent registrations cannot both win
        let mut claimed = false;
        self.email_index.entry(email.clone()).or_insert_with(|| {
            claimed = true;
            user_id
        });
        if !claimed {
            return Err(LedgerError::already_exists(&email));
        }

        let mut inserted = false;
        self.users.entry(user_id).or_insert_with(|| {
            inserted = true;
            user.clone()
        });
        if !inserted {
            self.email_index.remove(&email);
            return Err(LedgerError::conflict("user", user_id, "id already taken"));
        }

        self.observe_id(Collection::Users, user_id);
        debug!(user = user_id, email = %email, "User inserted");
        Ok(user)
    }

    fn update_user<F, R>(&self, user_id: UserId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut User) -> Result<R, LedgerError>,
    {
        let mut entry = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| LedgerError::not_found("user", user_id))?;

        let mut draft = entry.value().clone();
        let result = f(&mut draft)?;
        *entry.value_mut() = draft;

        Ok(result)
    }

    fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    fn append_price(&self, price: GoldPrice) -> Result<GoldPrice, LedgerError> {
        let price_id = price.id;

        let mut inserted = false;
        self.prices.entry(price_id).or_insert_with(|| {
            inserted = true;
            price.clone()
        });
        if !inserted {
            return Err(LedgerError::conflict("price", price_id, "id already taken"));
        }

        self.observe_id(Collection::Prices, price_id);
        debug!(price = price_id, per_gram = %price.price_per_gram, "Price appended");
        Ok(price)
    }

    fn latest_price(&self) -> Option<GoldPrice> {
        self.prices
            .iter()
            .max_by_key(|entry| *entry.key())
            .map(|entry| entry.value().clone())
    }

    fn price_history(&self) -> Vec<GoldPrice> {
        let mut prices: Vec<GoldPrice> = self.prices.iter().map(|e| e.value().clone()).collect();
        prices.sort_by(|a, b| b.id.cmp(&a.id));
        prices
    }

    fn get_payment_method(&self, method: PaymentMethod) -> Option<PaymentMethodInfo> {
        self.payment_methods
            .get(&method)
            .map(|entry| entry.value().clone())
    }

    fn upsert_payment_method(&self, info: PaymentMethodInfo) {
        debug!(method = %info.method, "Payment method instructions stored");
        self.payment_methods.insert(info.method, info);
    }

    fn list_payment_methods(&self) -> Vec<PaymentMethodInfo> {
        let mut methods: Vec<PaymentMethodInfo> = self
            .payment_methods
            .iter()
            .map(|e| e.value().clone())
            .collect();
        methods.sort_by_key(|info| info.method);
        methods
    }

    fn get_transaction(&self, txn_id: TransactionId) -> Option<Transaction> {
        self.transactions
            .get(&txn_id)
            .map(|entry| entry.value().clone())
    }

    fn insert_transaction(&self, txn: Transaction) -> Result<Transaction, LedgerError> {
        let txn_id = txn.id;

        let mut inserted = false;
        self.transactions.entry(txn_id).or_insert_with(|| {
            inserted = true;
            txn.clone()
        });
        if !inserted {
            return Err(LedgerError::conflict(
                "transaction",
                txn_id,
                "id already taken",
            ));
        }

        self.observe_id(Collection::Transactions, txn_id);
        debug!(txn = txn_id, user = txn.user_id, "Transaction inserted");
        Ok(txn)
    }

    fn update_transaction<F, R>(&self, txn_id: TransactionId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut Transaction) -> Result<R, LedgerError>,
    {
        let mut entry = self
            .transactions
            .get_mut(&txn_id)
            .ok_or_else(|| LedgerError::not_found("transaction", txn_id))?;

        let mut draft = entry.value().clone();
        let result = f(&mut draft)?;
        *entry.value_mut() = draft;

        Ok(result)
    }

    fn find_transactions<P>(&self, predicate: P) -> Vec<Transaction>
    where
        P: Fn(&Transaction) -> bool,
    {
        let mut found: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| b.id.cmp(&a.id));
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionStatus, TransactionType, UserRole};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn user(id: UserId, email: &str) -> User {
        User::new(id, "Test User", email, "01700000000", UserRole::User)
    }

    fn txn(id: TransactionId, user_id: UserId, status: TransactionStatus) -> Transaction {
        Transaction {
            id,
            user_id,
            tx_type: TransactionType::Buy,
            amount_bdt: Decimal::new(1000, 0),
            price_per_gram: Decimal::new(9500, 0),
            gold_grams: Decimal::new(105263, 6),
            method: PaymentMethod::Bkash,
            status,
            created_at: Utc::now(),
            proof: Some("proof-1".to_string()),
            payout_details: None,
        }
    }

    #[test]
    fn test_next_id_is_monotonic_per_collection() {
        let store = InMemoryLedgerStore::new();

        assert_eq!(store.next_id(Collection::Users), 1);
        assert_eq!(store.next_id(Collection::Users), 2);
        assert_eq!(store.next_id(Collection::Transactions), 1);
        assert_eq!(store.next_id(Collection::Prices), 1);
    }

    #[test]
    fn test_insert_user_and_find_by_email_case_insensitive() {
        let store = InMemoryLedgerStore::new();
        store.insert_user(user(1, "alice@example.com")).unwrap();

        let found = store.find_user_by_email("  ALICE@example.com ").unwrap();
        assert_eq!(found.id, 1);
        assert!(store.find_user_by_email("bob@example.com").is_none());
    }

    #[test]
    fn test_insert_user_rejects_duplicate_email() {
        let store = InMemoryLedgerStore::new();
        store.insert_user(user(1, "alice@example.com")).unwrap();

        let result = store.insert_user(user(2, "Alice@Example.com"));
        assert_eq!(
            result.unwrap_err(),
            LedgerError::already_exists("alice@example.com")
        );
        assert!(store.get_user(2).is_none());
    }

    #[test]
    fn test_insert_user_id_collision_releases_email() {
        let store = InMemoryLedgerStore::new();
        store.insert_user(user(1, "alice@example.com")).unwrap();

        let result = store.insert_user(user(1, "bob@example.com"));
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));

        // The email claim was rolled back, so bob can still register
        store.insert_user(user(2, "bob@example.com")).unwrap();
    }

    #[test]
    fn test_inserted_ids_advance_sequence() {
        let store = InMemoryLedgerStore::new();
        store.insert_user(user(41, "alice@example.com")).unwrap();

        assert_eq!(store.next_id(Collection::Users), 42);
    }

    #[test]
    fn test_update_user_applies_closure() {
        let store = InMemoryLedgerStore::new();
        store.insert_user(user(1, "alice@example.com")).unwrap();

        let balance = store
            .update_user(1, |u| {
                u.gold_balance = Decimal::new(5, 1);
                Ok(u.gold_balance)
            })
            .unwrap();

        assert_eq!(balance, Decimal::new(5, 1));
        assert_eq!(store.get_user(1).unwrap().gold_balance, Decimal::new(5, 1));
    }

    #[test]
    fn test_update_user_error_leaves_record_untouched() {
        let store = InMemoryLedgerStore::new();
        store.insert_user(user(1, "alice@example.com")).unwrap();

        let result: Result<(), LedgerError> = store.update_user(1, |u| {
            u.gold_balance = Decimal::new(99, 0);
            Err(LedgerError::validation("gold_balance", "rejected"))
        });

        assert!(result.is_err());
        assert_eq!(store.get_user(1).unwrap().gold_balance, Decimal::ZERO);
    }

    #[test]
    fn test_update_unknown_user_is_not_found() {
        let store = InMemoryLedgerStore::new();

        let result = store.update_user(7, |_| Ok(()));
        assert_eq!(result.unwrap_err(), LedgerError::not_found("user", 7));
    }

    #[test]
    fn test_latest_price_and_history_order() {
        let store = InMemoryLedgerStore::new();
        assert!(store.latest_price().is_none());

        store
            .append_price(GoldPrice::new(1, Decimal::new(9500, 0), 1))
            .unwrap();
        store
            .append_price(GoldPrice::new(2, Decimal::new(9800, 0), 1))
            .unwrap();

        assert_eq!(store.latest_price().unwrap().id, 2);
        let history: Vec<PriceId> = store.price_history().iter().map(|p| p.id).collect();
        assert_eq!(history, vec![2, 1]);
    }

    #[test]
    fn test_append_price_rejects_duplicate_id() {
        let store = InMemoryLedgerStore::new();
        store
            .append_price(GoldPrice::new(1, Decimal::new(9500, 0), 1))
            .unwrap();

        let result = store.append_price(GoldPrice::new(1, Decimal::new(1, 0), 1));
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
        assert_eq!(
            store.latest_price().unwrap().price_per_gram,
            Decimal::new(9500, 0)
        );
    }

    #[test]
    fn test_payment_methods_listed_in_display_order() {
        let store = InMemoryLedgerStore::new();
        for method in [PaymentMethod::BankTransfer, PaymentMethod::Bkash] {
            store.upsert_payment_method(PaymentMethodInfo {
                method,
                details: method.to_string(),
            });
        }

        let methods: Vec<PaymentMethod> = store
            .list_payment_methods()
            .iter()
            .map(|m| m.method)
            .collect();
        assert_eq!(
            methods,
            vec![PaymentMethod::Bkash, PaymentMethod::BankTransfer]
        );
    }

    #[test]
    fn test_find_transactions_filters_and_orders_newest_first() {
        let store = InMemoryLedgerStore::new();
        store.insert_transaction(txn(1, 1, TransactionStatus::Pending)).unwrap();
        store.insert_transaction(txn(2, 2, TransactionStatus::Pending)).unwrap();
        store.insert_transaction(txn(3, 1, TransactionStatus::Success)).unwrap();

        let for_user: Vec<TransactionId> = store
            .find_transactions(|t| t.user_id == 1)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(for_user, vec![3, 1]);

        let pending = store.find_transactions(|t| t.is_pending());
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_insert_transaction_rejects_duplicate_id() {
        let store = InMemoryLedgerStore::new();
        store.insert_transaction(txn(1, 1, TransactionStatus::Pending)).unwrap();

        let result = store.insert_transaction(txn(1, 2, TransactionStatus::Pending));
        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
        assert_eq!(store.get_transaction(1).unwrap().user_id, 1);
    }

    #[test]
    fn test_update_transaction_error_leaves_record_untouched() {
        let store = InMemoryLedgerStore::new();
        store.insert_transaction(txn(1, 1, TransactionStatus::Pending)).unwrap();

        let result: Result<(), LedgerError> = store.update_transaction(1, |t| {
            t.status = TransactionStatus::Success;
            Err(LedgerError::validation("status", "rejected"))
        });

        assert!(result.is_err());
        assert!(store.get_transaction(1).unwrap().is_pending());
    }

    #[test]
    fn test_snapshot_restores_records_and_sequences() {
        let store = InMemoryLedgerStore::new();
        store.insert_user(user(1, "alice@example.com")).unwrap();
        store
            .append_price(GoldPrice::new(3, Decimal::new(9500, 0), 1))
            .unwrap();
        store.insert_transaction(txn(5, 1, TransactionStatus::Pending)).unwrap();

        let restored = InMemoryLedgerStore::from_snapshot(store.snapshot()).unwrap();

        assert_eq!(restored.snapshot(), store.snapshot());
        assert_eq!(restored.next_id(Collection::Users), 2);
        assert_eq!(restored.next_id(Collection::Prices), 4);
        assert_eq!(restored.next_id(Collection::Transactions), 6);
    }

    #[test]
    fn test_from_snapshot_rejects_duplicate_emails() {
        let snapshot = LedgerSnapshot {
            users: vec![user(1, "a@example.com"), user(2, "A@example.com")],
            ..LedgerSnapshot::default()
        };

        let result = InMemoryLedgerStore::from_snapshot(snapshot);
        assert!(matches!(result, Err(LedgerError::AlreadyExists { .. })));
    }

    #[test]
    fn test_concurrent_registration_same_email_single_winner() {
        use std::thread;

        let store = Arc::new(InMemoryLedgerStore::new());
        let mut handles = vec![];

        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let id = store.next_id(Collection::Users);
                store.insert_user(user(id, "race@example.com"))
            }));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(winners, 1);
        assert_eq!(store.list_users().len(), 1);
    }
}
