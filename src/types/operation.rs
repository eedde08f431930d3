//! Wallet operations replayed from a batch file
//!
//! Every operation is keyed by an email. For user operations that is the
//! acting user (or, for reviews, the owner of the transaction); for global
//! operations it is the admin performing them.

use rust_decimal::Decimal;

use super::payment_method::PaymentMethod;
use super::transaction::ReviewAction;

/// One replayable wallet operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Register a new user
    Register {
        email: String,
        name: String,
        phone: String,
    },
    /// Change name and/or phone
    Profile {
        email: String,
        name: Option<String>,
        phone: Option<String>,
    },
    /// Admin sets a new gold price
    SetPrice { admin_email: String, price: Decimal },
    /// Admin edits payment instructions
    SetMethod {
        admin_email: String,
        method: PaymentMethod,
        details: String,
    },
    /// Request a BUY; `label` names the transaction for later review
    Buy {
        email: String,
        label: String,
        amount_bdt: Decimal,
        method: PaymentMethod,
        proof: Option<String>,
    },
    /// Request a SELL
    Sell {
        email: String,
        label: String,
        amount_bdt: Decimal,
        method: PaymentMethod,
        payout_details: String,
    },
    /// Approve or reject the owner's labelled transaction
    Review {
        owner_email: String,
        label: String,
        action: ReviewAction,
    },
}

impl Operation {
    /// Email the operation is keyed by
    pub fn email(&self) -> &str {
        match self {
            Operation::Register { email, .. }
            | Operation::Profile { email, .. }
            | Operation::Buy { email, .. }
            | Operation::Sell { email, .. } => email,
            Operation::SetPrice { admin_email, .. } | Operation::SetMethod { admin_email, .. } => {
                admin_email
            }
            Operation::Review { owner_email, .. } => owner_email,
        }
    }

    /// Global operations must not run concurrently with anything else
    ///
    /// Price and method changes affect every user. Registrations allocate
    /// user ids, which must follow file order.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Operation::Register { .. } | Operation::SetPrice { .. } | Operation::SetMethod { .. }
        )
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Register { .. } => "register",
            Operation::Profile { .. } => "profile",
            Operation::SetPrice { .. } => "price",
            Operation::SetMethod { .. } => "method",
            Operation::Buy { .. } => "buy",
            Operation::Sell { .. } => "sell",
            Operation::Review {
                action: ReviewAction::Approve,
                ..
            } => "approve",
            Operation::Review {
                action: ReviewAction::Reject,
                ..
            } => "reject",
        }
    }
}
