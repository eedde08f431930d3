//! User-related types for the gold ledger
//!
//! A user owns a gold balance in grams. The balance is only ever changed by
//! the settlement engine; profile updates touch name and phone only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User identifier
pub type UserId = u64;

/// Role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Regular customer: buys and sells gold
    User,
    /// Sets prices, reviews pending transactions
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "USER"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Invalid user role: '{}'", other)),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user id
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Login identity, stored trimmed and lower-cased
    pub email: String,

    /// Contact phone number
    pub phone: String,

    /// USER or ADMIN
    pub role: UserRole,

    /// Gold held, in grams
    ///
    /// Never negative. SELL requests debit this eagerly at creation time.
    #[serde(with = "rust_decimal::serde::str")]
    pub gold_balance: Decimal,

    /// When the user registered
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a zero balance
    pub fn new(id: UserId, name: &str, email: &str, phone: &str, role: UserRole) -> Self {
        User {
            id,
            name: name.trim().to_string(),
            email: normalize_email(email),
            phone: phone.trim().to_string(),
            role,
            gold_balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Whether this user may act on the admin surface
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Canonical form of an email used for lookups and uniqueness
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    /// New display name
    pub name: Option<String>,
    /// New phone number
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_user_has_zero_balance_and_normalized_email() {
        let user = User::new(1, " Alice ", "  Alice@Example.COM ", "0171", UserRole::User);

        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.gold_balance, Decimal::ZERO);
        assert!(!user.is_admin());
    }

    #[rstest]
    #[case("user", UserRole::User)]
    #[case("ADMIN", UserRole::Admin)]
    #[case(" Admin ", UserRole::Admin)]
    fn test_role_from_str(#[case] input: &str, #[case] expected: UserRole) {
        assert_eq!(input.parse::<UserRole>().unwrap(), expected);
    }

    #[test]
    fn test_role_from_str_rejects_unknown() {
        assert!("root".parse::<UserRole>().is_err());
    }
}
