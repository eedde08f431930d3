//! Admin review surface
//!
//! Thin wrapper used by admin tooling. Every action first checks that the
//! actor is an ADMIN, then delegates to the settlement engine, the pricing
//! service or the payment-method table. Nothing here writes balances or
//! transaction status directly.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::engine::SettlementEngine;
use super::pricing::PricingService;
use super::traits::LedgerStore;
use crate::types::{
    GoldPrice, LedgerError, PaymentMethod, PaymentMethodInfo, ReviewAction, Transaction,
    TransactionId, TransactionScope, User, UserId,
};

/// Admin-only operations
#[derive(Debug)]
pub struct AdminReview<S: LedgerStore> {
    store: Arc<S>,
    engine: SettlementEngine<S>,
    pricing: PricingService<S>,
}

impl<S: LedgerStore> Clone for AdminReview<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            engine: self.engine.clone(),
            pricing: self.pricing.clone(),
        }
    }
}

impl<S: LedgerStore> AdminReview<S> {
    /// Create the admin surface
    pub fn new(store: Arc<S>, engine: SettlementEngine<S>, pricing: PricingService<S>) -> Self {
        Self {
            store,
            engine,
            pricing,
        }
    }

    /// Transactions awaiting review, most recent first
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.engine.list_transactions(TransactionScope::Pending)
    }

    /// Approve a pending transaction
    pub fn approve(&self, admin_id: UserId, txn_id: TransactionId) -> Result<Transaction, LedgerError> {
        self.review(admin_id, txn_id, ReviewAction::Approve)
    }

    /// Reject a pending transaction
    pub fn reject(&self, admin_id: UserId, txn_id: TransactionId) -> Result<Transaction, LedgerError> {
        self.review(admin_id, txn_id, ReviewAction::Reject)
    }

    /// Apply a review decision on behalf of an admin
    pub fn review(
        &self,
        admin_id: UserId,
        txn_id: TransactionId,
        action: ReviewAction,
    ) -> Result<Transaction, LedgerError> {
        let admin = self.require_admin(admin_id, "review transactions")?;
        let txn = self.engine.process_transaction(txn_id, action)?;

        info!(admin = admin.id, txn = txn.id, %action, "Transaction reviewed");
        Ok(txn)
    }

    /// Set today's gold price
    pub fn set_price(&self, admin_id: UserId, price_per_gram: Decimal) -> Result<GoldPrice, LedgerError> {
        let admin = self.require_admin(admin_id, "set the gold price")?;
        self.pricing.set_price(price_per_gram, admin.id)
    }

    /// Replace the buyer-facing instructions of a payment method
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentMethodInfo)` - The stored instructions
    /// * `Err(LedgerError::NotFound)` - The method was never configured
    /// * `Err(LedgerError::InvalidInput)` - Blank instructions
    pub fn update_payment_method(
        &self,
        admin_id: UserId,
        method: PaymentMethod,
        details: &str,
    ) -> Result<PaymentMethodInfo, LedgerError> {
        let admin = self.require_admin(admin_id, "edit payment methods")?;

        if details.trim().is_empty() {
            return Err(LedgerError::invalid_input("details", "must not be blank"));
        }
        if self.store.get_payment_method(method).is_none() {
            return Err(LedgerError::not_found("payment method", method));
        }

        let info = PaymentMethodInfo {
            method,
            details: details.trim().to_string(),
        };
        self.store.upsert_payment_method(info.clone());

        info!(admin = admin.id, %method, "Payment instructions updated");
        Ok(info)
    }

    fn require_admin(&self, admin_id: UserId, action: &str) -> Result<User, LedgerError> {
        let user = self
            .store
            .get_user(admin_id)
            .ok_or_else(|| LedgerError::not_found("user", admin_id))?;

        if !user.is_admin() {
            return Err(LedgerError::forbidden(admin_id, action));
        }
        Ok(user)
    }
}
