//! Error types for the gold ledger
//!
//! This module defines every error that can surface from the ledger, the
//! settlement engine and the surrounding I/O.
//!
//! # Error Categories
//!
//! - **Request Errors**: validation failures, unknown ids, duplicate emails
//! - **Lifecycle Errors**: acting on a transaction that already left `PENDING`
//! - **Balance Errors**: SELL requests exceeding holdings, arithmetic overflow
//! - **Concurrency Errors**: id collisions detected by the store
//! - **File/Config Errors**: snapshot I/O, CSV parsing, TOML parsing
//!
//! None of the request, lifecycle or balance errors leave partial state behind.

use rust_decimal::Decimal;
use thiserror::Error;

use super::transaction::{TransactionId, TransactionStatus};
use super::user::UserId;

/// Main error type for the gold ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// A user request failed validation (non-positive amount, blank field, ...)
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Offending field
        field: String,
        /// Human readable reason
        reason: String,
    },

    /// An admin-supplied parameter was rejected (e.g. a non-positive price)
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput {
        /// Offending field
        field: String,
        /// Human readable reason
        reason: String,
    },

    /// Referenced entity does not exist
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity (user, transaction, payment method, ...)
        entity: String,
        /// The id or key that was looked up
        id: String,
    },

    /// A user with this email is already registered
    #[error("User with email '{email}' already exists")]
    AlreadyExists {
        /// The duplicate email
        email: String,
    },

    /// The transaction is no longer pending
    ///
    /// Usually a double submit or two admins racing on the same review.
    #[error("Transaction {txn} is {status}, expected PENDING")]
    InvalidState {
        /// Transaction ID
        txn: TransactionId,
        /// Status found at the time of the attempt
        status: TransactionStatus,
    },

    /// A SELL request exceeds the user's gold balance
    #[error("Insufficient gold balance for user {user}: available {available}g, requested {requested}g")]
    InsufficientBalance {
        /// User ID
        user: UserId,
        /// Balance at the time of the check
        available: Decimal,
        /// Grams the request needed
        requested: Decimal,
    },

    /// Concurrent mutation detected; the whole operation may be retried
    #[error("Conflict on {entity} '{id}': {reason}")]
    Conflict {
        /// Kind of entity
        entity: String,
        /// Entity id
        id: String,
        /// What collided
        reason: String,
    },

    /// Required bootstrap data is missing
    #[error("{what} is not configured")]
    NotConfigured {
        /// What is missing
        what: String,
    },

    /// Actor lacks the role required for the action
    #[error("User {user} is not allowed to {action}")]
    Forbidden {
        /// Acting user ID
        user: UserId,
        /// Attempted action
        action: String,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for user {user}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// User ID
        user: UserId,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(error: toml::de::Error) -> Self {
        LedgerError::Config {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a Validation error
    pub fn validation(field: &str, reason: &str) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: &str, reason: &str) -> Self {
        LedgerError::InvalidInput {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Create an AlreadyExists error
    pub fn already_exists(email: &str) -> Self {
        LedgerError::AlreadyExists {
            email: email.to_string(),
        }
    }

    /// Create an InvalidState error
    pub fn invalid_state(txn: TransactionId, status: TransactionStatus) -> Self {
        LedgerError::InvalidState { txn, status }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user: UserId, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientBalance {
            user,
            available,
            requested,
        }
    }

    /// Create a Conflict error
    pub fn conflict(entity: &str, id: impl ToString, reason: &str) -> Self {
        LedgerError::Conflict {
            entity: entity.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a NotConfigured error
    pub fn not_configured(what: &str) -> Self {
        LedgerError::NotConfigured {
            what: what.to_string(),
        }
    }

    /// Create a Forbidden error
    pub fn forbidden(user: UserId, action: &str) -> Self {
        LedgerError::Forbidden {
            user,
            action: action.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user: UserId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            user,
        }
    }

    /// Whether the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }
}
