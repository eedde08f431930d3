//! Gold price records
//!
//! Prices form an append-only history. The current price is simply the most
//! recently appended record; records are never edited in place.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Price record identifier
pub type PriceId = u64;

/// A point-in-time gold price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldPrice {
    /// Unique price record id, increasing with every update
    pub id: PriceId,

    /// Price of one gram of gold in BDT
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_gram: Decimal,

    /// When the price was set
    pub updated_at: DateTime<Utc>,

    /// Admin who set the price
    pub updated_by: UserId,
}

impl GoldPrice {
    /// Create a new price record stamped with the current time
    pub fn new(id: PriceId, price_per_gram: Decimal, updated_by: UserId) -> Self {
        GoldPrice {
            id,
            price_per_gram,
            updated_at: Utc::now(),
            updated_by,
        }
    }
}
