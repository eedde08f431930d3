//! Settlement engine: transaction creation and review
//!
//! This module provides `SettlementEngine`, the only component allowed to
//! change gold balances or transaction status.
//!
//! # Reservation timing
//!
//! BUY and SELL settle asymmetrically:
//!
//! | type | on create          | on approve        | on reject          |
//! |------|--------------------|-------------------|--------------------|
//! | BUY  | nothing            | credit grams      | nothing            |
//! | SELL | debit (reserve)    | nothing           | refund grams       |
//!
//! A SELL reserves gold as soon as it is requested so a user can never
//! oversell. A BUY credits nothing until an admin has checked the payment.
//!
//! # Atomicity
//!
//! Every balance change happens inside `LedgerStore::update_user`, i.e. under
//! the owning user's exclusive lock. Creating a SELL checks the balance,
//! inserts the transaction and debits the balance inside that one region.
//! Reviewing a transaction nests `update_transaction` inside it, so only one
//! caller can ever move a given transaction out of `PENDING`, and the status
//! and balance change land together or not at all.
//!
//! The price snapshot is read before the lock is taken.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::pricing::PricingService;
use super::traits::{Collection, LedgerStore};
use crate::types::{
    gold_grams_for, LedgerError, NewTransaction, ReviewAction, Transaction, TransactionId,
    TransactionScope, TransactionStatus, TransactionType,
};

/// Default number of fractional digits kept for gram amounts
pub const DEFAULT_GRAM_SCALE: u32 = 6;

/// Tunables for transaction creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPolicy {
    /// Fractional digits kept when converting BDT to grams
    pub gram_scale: u32,

    /// Reject BUY requests that arrive without a payment proof
    pub require_buy_proof: bool,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            gram_scale: DEFAULT_GRAM_SCALE,
            require_buy_proof: false,
        }
    }
}

/// Creates and settles buy/sell transactions
#[derive(Debug)]
pub struct SettlementEngine<S: LedgerStore> {
    store: Arc<S>,
    pricing: PricingService<S>,
    policy: SettlementPolicy,
}

impl<S: LedgerStore> Clone for SettlementEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pricing: self.pricing.clone(),
            policy: self.policy,
        }
    }
}

impl<S: LedgerStore> SettlementEngine<S> {
    /// Create a new SettlementEngine
    ///
    /// # Arguments
    ///
    /// * `store` - Shared ledger store
    /// * `pricing` - Source of the price snapshot for new transactions
    /// * `policy` - Gram scale and proof policy
    pub fn new(store: Arc<S>, pricing: PricingService<S>, policy: SettlementPolicy) -> Self {
        Self {
            store,
            pricing,
            policy,
        }
    }

    /// Policy this engine was built with
    pub fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    /// Create a PENDING transaction
    ///
    /// This method:
    /// 1. Validates the request
    /// 2. Snapshots the current price and computes the frozen gram amount
    /// 3. Under the user's lock: for SELL checks and debits the balance, then
    ///    records the transaction
    ///
    /// # Returns
    ///
    /// * `Ok(Transaction)` - The new PENDING transaction
    /// * `Err(LedgerError::Validation)` - Bad amount, missing payout details, ...
    /// * `Err(LedgerError::NotFound)` - Unknown user
    /// * `Err(LedgerError::NotConfigured)` - No gold price has been set
    /// * `Err(LedgerError::InsufficientBalance)` - SELL exceeds the balance
    pub fn create_transaction(&self, request: NewTransaction) -> Result<Transaction, LedgerError> {
        self.validate(&request)?;

        // Snapshot the price outside the critical section
        let price = self.pricing.current_price()?;
        let gold_grams = gold_grams_for(
            request.amount_bdt,
            price.price_per_gram,
            self.policy.gram_scale,
        )
        .ok_or_else(|| {
            LedgerError::validation("amount_bdt", "too large to convert at the current price")
        })?;

        if gold_grams <= Decimal::ZERO {
            return Err(LedgerError::validation(
                "amount_bdt",
                "too small to buy any gold at the current price",
            ));
        }

        let user_id = request.user_id;
        let txn = Transaction {
            id: self.store.next_id(Collection::Transactions),
            user_id,
            tx_type: request.tx_type,
            amount_bdt: request.amount_bdt,
            price_per_gram: price.price_per_gram,
            gold_grams,
            method: request.method,
            status: TransactionStatus::Pending,
            created_at: chrono::Utc::now(),
            proof: request.proof,
            payout_details: request.payout_details,
        };

        let store = &self.store;
        let created = self.store.update_user(user_id, |user| match txn.tx_type {
            TransactionType::Sell => {
                if user.gold_balance < gold_grams {
                    return Err(LedgerError::insufficient_balance(
                        user_id,
                        user.gold_balance,
                        gold_grams,
                    ));
                }

                let remaining = user
                    .gold_balance
                    .checked_sub(gold_grams)
                    .ok_or_else(|| LedgerError::arithmetic_overflow("sell reservation", user_id))?;

                let created = store.insert_transaction(txn)?;
                user.gold_balance = remaining;
                Ok(created)
            }
            TransactionType::Buy => store.insert_transaction(txn),
        });

        match &created {
            Ok(txn) => info!(
                txn = txn.id,
                user = user_id,
                tx_type = %txn.tx_type,
                amount_bdt = %txn.amount_bdt,
                grams = %txn.gold_grams,
                "Transaction created"
            ),
            Err(e) => debug!(user = user_id, error = %e, "Transaction rejected"),
        }

        created
    }

    /// Approve or reject a PENDING transaction
    ///
    /// | action  | BUY            | SELL           |
    /// |---------|----------------|----------------|
    /// | approve | credit grams   | no effect      |
    /// | reject  | no effect      | refund grams   |
    ///
    /// # Returns
    ///
    /// * `Ok(Transaction)` - The transaction in its terminal state
    /// * `Err(LedgerError::NotFound)` - Unknown transaction (or owner)
    /// * `Err(LedgerError::InvalidState)` - Already approved or rejected
    pub fn process_transaction(
        &self,
        txn_id: TransactionId,
        action: ReviewAction,
    ) -> Result<Transaction, LedgerError> {
        let owner = self
            .store
            .get_transaction(txn_id)
            .ok_or_else(|| LedgerError::not_found("transaction", txn_id))?
            .user_id;

        let store = &self.store;
        let result = self.store.update_user(owner, |user| {
            store.update_transaction(txn_id, |txn| {
                // Exclusive claim: only the first reviewer sees PENDING
                if txn.status != TransactionStatus::Pending {
                    return Err(LedgerError::invalid_state(txn.id, txn.status));
                }

                let balance = match (txn.tx_type, action) {
                    (TransactionType::Buy, ReviewAction::Approve)
                    | (TransactionType::Sell, ReviewAction::Reject) => user
                        .gold_balance
                        .checked_add(txn.gold_grams)
                        .ok_or_else(|| LedgerError::arithmetic_overflow("settlement", owner))?,
                    (TransactionType::Buy, ReviewAction::Reject)
                    | (TransactionType::Sell, ReviewAction::Approve) => user.gold_balance,
                };

                txn.status = action.target_status();
                user.gold_balance = balance;
                Ok(txn.clone())
            })
        });

        match &result {
            Ok(txn) => info!(
                txn = txn.id,
                user = owner,
                tx_type = %txn.tx_type,
                status = %txn.status,
                grams = %txn.gold_grams,
                "Transaction settled"
            ),
            Err(LedgerError::InvalidState { status, .. }) => warn!(
                txn = txn_id,
                %action,
                %status,
                "Review on a settled transaction, possible double submit"
            ),
            Err(e) => debug!(txn = txn_id, %action, error = %e, "Review failed"),
        }

        result
    }

    /// Get a transaction by id
    pub fn get_transaction(&self, txn_id: TransactionId) -> Result<Transaction, LedgerError> {
        self.store
            .get_transaction(txn_id)
            .ok_or_else(|| LedgerError::not_found("transaction", txn_id))
    }

    /// List transactions, most recent first
    pub fn list_transactions(&self, scope: TransactionScope) -> Vec<Transaction> {
        self.store.find_transactions(|txn| scope.matches(txn))
    }

    fn validate(&self, request: &NewTransaction) -> Result<(), LedgerError> {
        if request.amount_bdt <= Decimal::ZERO {
            return Err(LedgerError::validation(
                "amount_bdt",
                "must be greater than zero",
            ));
        }

        let has_text = |value: &Option<String>| value.as_deref().is_some_and(|s| !s.trim().is_empty());

        match request.tx_type {
            TransactionType::Sell => {
                if !has_text(&request.payout_details) {
                    return Err(LedgerError::validation(
                        "payout_details",
                        "required for SELL",
                    ));
                }
                if request.proof.is_some() {
                    return Err(LedgerError::validation("proof", "only allowed for BUY"));
                }
            }
            TransactionType::Buy => {
                if request.payout_details.is_some() {
                    return Err(LedgerError::validation(
                        "payout_details",
                        "only allowed for SELL",
                    ));
                }
                if !has_text(&request.proof) {
                    if self.policy.require_buy_proof {
                        return Err(LedgerError::validation("proof", "required for BUY"));
                    }
                    warn!(user = request.user_id, "BUY submitted without payment proof");
                }
            }
        }

        Ok(())
    }
}
