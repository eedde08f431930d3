//! Gold price management
//!
//! `PricingService` is the only writer of price records. Setting a price
//! appends a new record; existing transactions keep the price snapshot they
//! were created with.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::traits::{Collection, LedgerStore};
use crate::types::{GoldPrice, LedgerError, UserId};

/// Reads and appends gold prices
#[derive(Debug)]
pub struct PricingService<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for PricingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> PricingService<S> {
    /// Create a pricing service over a shared store
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Latest price record
    ///
    /// # Returns
    ///
    /// * `Ok(GoldPrice)` - The most recently set price
    /// * `Err(LedgerError::NotConfigured)` - No price has ever been set
    pub fn current_price(&self) -> Result<GoldPrice, LedgerError> {
        self.store
            .latest_price()
            .ok_or_else(|| LedgerError::not_configured("gold price"))
    }

    /// Append a new price record
    ///
    /// # Arguments
    ///
    /// * `price_per_gram` - New price in BDT, must be positive
    /// * `admin_id` - Admin who set the price
    ///
    /// # Returns
    ///
    /// * `Ok(GoldPrice)` - The appended record, now the current price
    /// * `Err(LedgerError::InvalidInput)` - If the price is zero or negative
    pub fn set_price(
        &self,
        price_per_gram: Decimal,
        admin_id: UserId,
    ) -> Result<GoldPrice, LedgerError> {
        if price_per_gram <= Decimal::ZERO {
            return Err(LedgerError::invalid_input(
                "price_per_gram",
                "must be greater than zero",
            ));
        }

        let id = self.store.next_id(Collection::Prices);
        let record = self
            .store
            .append_price(GoldPrice::new(id, price_per_gram, admin_id))?;

        info!(price = record.id, per_gram = %record.price_per_gram, admin = admin_id, "Gold price updated");
        Ok(record)
    }

    /// Every price ever set, newest first
    pub fn price_history(&self) -> Vec<GoldPrice> {
        self.store.price_history()
    }
}
