//! Core traits for ledger persistence
//!
//! `LedgerStore` is the injectable storage seam. The in-memory implementation
//! backs it with `DashMap`; a database-backed store only needs to honour the
//! same atomicity contract on `update_user` and `update_transaction`.

use crate::types::{
    GoldPrice, LedgerError, PaymentMethod, PaymentMethodInfo, Transaction, TransactionId, User,
    UserId,
};

/// Record collections kept by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Registered users
    Users,
    /// Append-only price history
    Prices,
    /// Buy/sell transactions
    Transactions,
}

/// Trait for durable key-value storage of ledger records
///
/// # Atomicity
///
/// `update_user` and `update_transaction` run their closure while holding an
/// exclusive lock on that single record. If the closure returns an error the
/// record is left untouched. Callers that need to touch a user and one of the
/// user's transactions together must nest the transaction update *inside* the
/// user update, never the other way round.
pub trait LedgerStore: Send + Sync {
    /// Reserve the next id in a collection
    fn next_id(&self, collection: Collection) -> u64;

    /// Get a user by id
    fn get_user(&self, user_id: UserId) -> Option<User>;

    /// Find a user by (normalized) email
    fn find_user_by_email(&self, email: &str) -> Option<User>;

    /// Insert a new user
    ///
    /// Fails with `AlreadyExists` if the email is taken and `Conflict` if the
    /// id is.
    fn insert_user(&self, user: User) -> Result<User, LedgerError>;

    /// Atomically read-modify-write a user
    fn update_user<F, R>(&self, user_id: UserId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut User) -> Result<R, LedgerError>;

    /// All users, ordered by id
    fn list_users(&self) -> Vec<User>;

    /// Append a price record
    fn append_price(&self, price: GoldPrice) -> Result<GoldPrice, LedgerError>;

    /// Most recently appended price record
    fn latest_price(&self) -> Option<GoldPrice>;

    /// Every price record, newest first
    fn price_history(&self) -> Vec<GoldPrice>;

    /// Instructions for one payment method
    fn get_payment_method(&self, method: PaymentMethod) -> Option<PaymentMethodInfo>;

    /// Insert or replace the instructions for a payment method
    fn upsert_payment_method(&self, info: PaymentMethodInfo);

    /// All configured payment methods, in display order
    fn list_payment_methods(&self) -> Vec<PaymentMethodInfo>;

    /// Get a transaction by id
    fn get_transaction(&self, txn_id: TransactionId) -> Option<Transaction>;

    /// Insert a new transaction; fails with `Conflict` if the id is taken
    fn insert_transaction(&self, txn: Transaction) -> Result<Transaction, LedgerError>;

    /// Atomically read-modify-write a transaction
    fn update_transaction<F, R>(&self, txn_id: TransactionId, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&mut Transaction) -> Result<R, LedgerError>;

    /// Transactions matching a predicate, most recent first
    fn find_transactions<P>(&self, predicate: P) -> Vec<Transaction>
    where
        P: Fn(&Transaction) -> bool;
}
