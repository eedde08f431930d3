//! Application configuration loaded from a TOML file
//!
//! Every section is optional. A missing file yields the built-in defaults,
//! which seed one admin, an initial price of 9500 BDT per gram and the four
//! payment channels.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::core::engine::{SettlementPolicy, DEFAULT_GRAM_SCALE};
use crate::types::{LedgerError, PaymentMethod, PaymentMethodInfo};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the CSV snapshot
    pub data_dir: PathBuf,
    pub seed: SeedConfig,
    pub ledger: LedgerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            seed: SeedConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Records created on first start
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub admin_name: String,
    pub admin_email: String,
    pub admin_phone: String,
    /// Price per gram in BDT set when no price exists yet
    pub initial_price: Decimal,
    pub payment_methods: Vec<PaymentMethodInfo>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_name: "System Admin".to_string(),
            admin_email: "admin@auro.com".to_string(),
            admin_phone: "01700000000".to_string(),
            initial_price: Decimal::new(9500, 0),
            payment_methods: default_payment_methods(),
        }
    }
}

/// Settlement rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Fractional digits kept when converting BDT to grams
    pub gram_scale: u32,
    /// Reject BUY requests without a payment proof
    pub require_buy_proof: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            gram_scale: DEFAULT_GRAM_SCALE,
            require_buy_proof: false,
        }
    }
}

impl LedgerConfig {
    pub fn policy(&self) -> SettlementPolicy {
        SettlementPolicy {
            gram_scale: self.gram_scale,
            require_buy_proof: self.require_buy_proof,
        }
    }
}

fn default_payment_methods() -> Vec<PaymentMethodInfo> {
    let details = |method| match method {
        PaymentMethod::Bkash => "Send Money to Personal: 01700000000\nReference: Your Phone Number",
        PaymentMethod::Nagad => "Send Money to Merchant: 01800000000\nCounter: 1",
        PaymentMethod::Rocket => "Send Money to: 01900000000-8",
        PaymentMethod::BankTransfer => "City Bank\nA/C: 123456789\nAuro Gold Ltd.",
    };

    PaymentMethod::ALL
        .iter()
        .map(|&method| PaymentMethodInfo {
            method,
            details: details(method).to_string(),
        })
        .collect()
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns `LedgerError::Config` if the file cannot be read, is not valid
/// TOML or carries values out of range.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, LedgerError> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);

    let contents = fs::read_to_string(path_ref).map_err(|e| LedgerError::Config {
        message: format!("Failed to read config file {:?}: {}", path_ref, e),
    })?;
    let config: AppConfig = toml::from_str(&contents)?;

    config.validate()?;
    Ok(config)
}

/// Load configuration if the file exists, otherwise fall back to defaults
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig, LedgerError> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        debug!("No config file at {:?}, using defaults", path.as_ref());
        Ok(AppConfig::default())
    }
}

impl AppConfig {
    fn validate(&self) -> Result<(), LedgerError> {
        if self.seed.initial_price <= Decimal::ZERO {
            return Err(LedgerError::Config {
                message: "seed.initial_price must be greater than zero".to_string(),
            });
        }
        // Decimal cannot hold more than 28 fractional digits
        if self.ledger.gram_scale > 28 {
            return Err(LedgerError::Config {
                message: format!("ledger.gram_scale {} exceeds 28", self.ledger.gram_scale),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults_seed_all_payment_methods() {
        let config = AppConfig::default();

        assert_eq!(config.seed.admin_email, "admin@auro.com");
        assert_eq!(config.seed.initial_price, Decimal::new(9500, 0));
        let methods: Vec<PaymentMethod> = config
            .seed
            .payment_methods
            .iter()
            .map(|info| info.method)
            .collect();
        assert_eq!(methods, PaymentMethod::ALL.to_vec());
        assert_eq!(config.ledger.policy(), SettlementPolicy::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let file = write_config(
            r#"
            data_dir = "/var/lib/gold"

            [ledger]
            require_buy_proof = true
            "#,
        );

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/gold"));
        assert!(config.ledger.require_buy_proof);
        assert_eq!(config.ledger.gram_scale, DEFAULT_GRAM_SCALE);
        assert_eq!(config.seed, SeedConfig::default());
    }

    #[test]
    fn test_parse_seed_section() {
        let file = write_config(
            r#"
            [seed]
            admin_email = "ops@example.com"
            initial_price = "10250.50"

            [[seed.payment_methods]]
            method = "bkash"
            details = "Send Money to 01711111111"
            "#,
        );

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.seed.admin_email, "ops@example.com");
        assert_eq!(config.seed.admin_name, "System Admin");
        assert_eq!(config.seed.initial_price, Decimal::new(1025050, 2));
        assert_eq!(config.seed.payment_methods.len(), 1);
        assert_eq!(config.seed.payment_methods[0].method, PaymentMethod::Bkash);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let file = write_config("data_dir = [unterminated");

        assert!(matches!(
            load_config(file.path()),
            Err(LedgerError::Config { .. })
        ));
    }

    #[test]
    fn test_non_positive_initial_price_rejected() {
        let file = write_config("[seed]\ninitial_price = \"0\"\n");

        assert!(matches!(
            load_config(file.path()),
            Err(LedgerError::Config { .. })
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_missing_file_is_error_when_loaded_directly() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            load_config(dir.path().join("absent.toml")),
            Err(LedgerError::Config { .. })
        ));
    }
}
