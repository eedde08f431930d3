//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `user`: Users, roles and profile updates
//! - `price`: Gold price records
//! - `payment_method`: Payment channels and their instructions
//! - `transaction`: Transactions, lifecycle status and review actions
//! - `operation`: Wallet operations replayed from batch files
//! - `error`: Error types for the gold ledger

pub mod error;
pub mod operation;
pub mod payment_method;
pub mod price;
pub mod transaction;
pub mod user;

pub use error::LedgerError;
pub use operation::Operation;
pub use payment_method::{PaymentMethod, PaymentMethodInfo};
pub use price::{GoldPrice, PriceId};
pub use transaction::{
    gold_grams_for, NewTransaction, ReviewAction, Transaction, TransactionId, TransactionScope,
    TransactionStatus, TransactionType,
};
pub use user::{normalize_email, ProfileUpdate, User, UserId, UserRole};
