//! Core business logic module
//!
//! This module contains the ledger components:
//! - `traits` - The `LedgerStore` storage seam
//! - `ledger_store` - `DashMap`-backed store and snapshots
//! - `pricing` - Current gold price and its history
//! - `engine` - Transaction creation and settlement
//! - `account_manager` - Registration, login and profiles
//! - `session` - Session tokens
//! - `admin` - Role-checked admin actions
//! - `wallet` - Facade over all of the above
//! - `batch_processor` - Concurrent replay of wallet operations

pub mod account_manager;
pub mod admin;
pub mod batch_processor;
pub mod engine;
pub mod ledger_store;
pub mod pricing;
pub mod session;
pub mod traits;
pub mod wallet;

pub use account_manager::AccountManager;
pub use admin::AdminReview;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::{SettlementEngine, SettlementPolicy, DEFAULT_GRAM_SCALE};
pub use ledger_store::{InMemoryLedgerStore, LedgerSnapshot};
pub use pricing::PricingService;
pub use session::{SessionManager, SessionToken};
pub use traits::{Collection, LedgerStore};
pub use wallet::Wallet;
