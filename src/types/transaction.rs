//! Transaction-related types for the gold ledger
//!
//! This module defines transaction types, their lifecycle status, the request
//! used to create them and the review actions that settle them.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::payment_method::PaymentMethod;
use super::user::UserId;

/// Transaction identifier
pub type TransactionId = u64;

/// Direction of a gold trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// User pays BDT and receives gold once an admin verifies the payment
    ///
    /// No balance effect at creation; grams are credited on approval.
    Buy,

    /// User gives up gold and receives BDT once an admin sends the payout
    ///
    /// Grams are reserved (debited) at creation and refunded on rejection.
    Sell,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TransactionType::Buy),
            "sell" => Ok(TransactionType::Sell),
            other => Err(format!("Invalid transaction type: '{}'", other)),
        }
    }
}

/// Lifecycle status of a transaction
///
/// `Pending` is the only non-terminal state. `Success` and `Failed` accept no
/// further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Awaiting admin review
    Pending,
    /// Approved by an admin
    Success,
    /// Rejected by an admin
    Failed,
}

impl TransactionStatus {
    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "PENDING"),
            TransactionStatus::Success => write!(f, "SUCCESS"),
            TransactionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Admin decision on a pending transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// Move to `Success`; credits gold for BUY
    Approve,
    /// Move to `Failed`; refunds reserved gold for SELL
    Reject,
}

impl ReviewAction {
    /// Status the transaction ends up in
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            ReviewAction::Approve => TransactionStatus::Success,
            ReviewAction::Reject => TransactionStatus::Failed,
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewAction::Approve => write!(f, "approve"),
            ReviewAction::Reject => write!(f, "reject"),
        }
    }
}

/// Request to create a BUY or SELL transaction
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Requesting user
    pub user_id: UserId,

    /// Amount of BDT paid (BUY) or requested (SELL)
    pub amount_bdt: Decimal,

    /// Channel used for the payment or payout
    pub method: PaymentMethod,

    /// BUY or SELL
    pub tx_type: TransactionType,

    /// Reference to the uploaded payment proof (BUY only)
    pub proof: Option<String>,

    /// Where the user wants the payout sent (SELL only, required)
    pub payout_details: Option<String>,
}

impl NewTransaction {
    /// A BUY request with an optional proof reference
    pub fn buy(
        user_id: UserId,
        amount_bdt: Decimal,
        method: PaymentMethod,
        proof: Option<String>,
    ) -> Self {
        NewTransaction {
            user_id,
            amount_bdt,
            method,
            tx_type: TransactionType::Buy,
            proof,
            payout_details: None,
        }
    }

    /// A SELL request with the user's payout details
    pub fn sell(
        user_id: UserId,
        amount_bdt: Decimal,
        method: PaymentMethod,
        payout_details: impl Into<String>,
    ) -> Self {
        NewTransaction {
            user_id,
            amount_bdt,
            method,
            tx_type: TransactionType::Sell,
            proof: None,
            payout_details: Some(payout_details.into()),
        }
    }
}

/// A recorded gold trade
///
/// Amount, price snapshot and grams are frozen at creation. Only `status`
/// changes afterwards, exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id
    pub id: TransactionId,

    /// Owner of the transaction
    pub user_id: UserId,

    /// BUY or SELL
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// BDT amount of the trade
    #[serde(with = "rust_decimal::serde::str")]
    pub amount_bdt: Decimal,

    /// Price per gram at the moment of creation
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_gram: Decimal,

    /// `amount_bdt / price_per_gram`, rounded to the ledger scale
    #[serde(with = "rust_decimal::serde::str")]
    pub gold_grams: Decimal,

    /// Payment or payout channel
    pub method: PaymentMethod,

    /// Current lifecycle status
    pub status: TransactionStatus,

    /// When the request was made
    pub created_at: DateTime<Utc>,

    /// Payment proof reference (BUY only)
    pub proof: Option<String>,

    /// Payout destination supplied by the user (SELL only)
    pub payout_details: Option<String>,
}

impl Transaction {
    /// Whether the transaction is still awaiting review
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

/// Which transactions to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionScope {
    /// Every transaction in the ledger
    All,
    /// Transactions owned by one user
    User(UserId),
    /// Transactions still awaiting review
    Pending,
}

impl TransactionScope {
    /// Whether `txn` falls inside this scope
    pub fn matches(&self, txn: &Transaction) -> bool {
        match self {
            TransactionScope::All => true,
            TransactionScope::User(user_id) => txn.user_id == *user_id,
            TransactionScope::Pending => txn.is_pending(),
        }
    }
}

/// Convert a BDT amount to grams at the given price
///
/// The result is rounded to `scale` fractional digits with banker's rounding
/// so that balances built from these values reconcile exactly. Returns `None`
/// when the price is zero or the division overflows.
pub fn gold_grams_for(amount_bdt: Decimal, price_per_gram: Decimal, scale: u32) -> Option<Decimal> {
    amount_bdt
        .checked_div(price_per_gram)
        .map(|grams| grams.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven))
}
