//! Gold Ledger Library
//! # Overview
//!
//! A digital gold wallet: users buy and sell gold for BDT at an admin-set
//! price per gram, and every trade waits in a PENDING state until an admin
//! approves or rejects it. Balances are only touched on approval.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (User, Transaction, GoldPrice, etc.)
//! - [`config`] - TOML configuration and seed records
//! - [`cli`] - Argument parsing and command dispatch
//! - [`core`] - Business logic components:
//!   - [`core::wallet`] - Facade over all wallet services
//!   - [`core::engine`] - Transaction creation and settlement
//!   - [`core::admin`] - Admin-only review, pricing and payment methods
//!   - [`core::account_manager`] - Registration, login and profiles
//!   - [`core::pricing`] - Append-only price history
//!   - [`core::ledger_store`] - Concurrent in-memory storage
//! - [`io`] - CSV readers, writers and on-disk snapshots
//! - [`strategy`] - Sync and async replay of operation files
//!
//! # Transaction Lifecycle
//!
//! - **BUY**: grams are frozen at request time; on approval they are added
//!   to the user's balance
//! - **SELL**: requires the user to hold the grams at request time; on
//!   approval the balance is re-checked and debited
//! - **Reject**: marks the transaction FAILED, balances untouched
//!
//! A transaction leaves PENDING exactly once.

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use config::AppConfig;
pub use core::{SettlementEngine, SettlementPolicy, Wallet};
pub use io::write_balances_csv;
pub use types::{
    GoldPrice, LedgerError, Operation, PaymentMethod, Transaction, TransactionId,
    TransactionStatus, TransactionType, User, UserId,
};
