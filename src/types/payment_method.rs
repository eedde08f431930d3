//! Payment methods and their admin-maintained instructions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported payment channels
///
/// The set is fixed at build time; only the instructions attached to each
/// method are editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// bKash mobile wallet
    Bkash,
    /// Nagad mobile wallet
    Nagad,
    /// Rocket mobile wallet
    Rocket,
    /// Bank transfer
    BankTransfer,
}

impl PaymentMethod {
    /// Every supported method, in display order
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Bkash,
        PaymentMethod::Nagad,
        PaymentMethod::Rocket,
        PaymentMethod::BankTransfer,
    ];

    /// Stable key used in CSV files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Bkash => "bkash",
            PaymentMethod::Nagad => "nagad",
            PaymentMethod::Rocket => "rocket",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "bkash" => Ok(PaymentMethod::Bkash),
            "nagad" => Ok(PaymentMethod::Nagad),
            "rocket" => Ok(PaymentMethod::Rocket),
            "bank" | "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(format!("Invalid payment method: '{}'", s)),
        }
    }
}

/// Instructions shown to buyers for one payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodInfo {
    /// The method these instructions belong to
    pub method: PaymentMethod,

    /// Free text, e.g. the wallet number to send money to
    pub details: String,
}
