use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::strategy::BatchConfig;
use crate::types::{PaymentMethod, TransactionId};

/// Gold wallet ledger: buy and sell digital gold at an admin-set price
#[derive(Parser, Debug)]
#[command(name = "gold-ledger")]
#[command(about = "Gold wallet ledger with admin-reviewed settlement", long_about = None)]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(
        long = "config",
        value_name = "FILE",
        default_value = "gold-ledger.toml",
        global = true,
        help = "Path to the TOML config file (defaults are used if it does not exist)"
    )]
    pub config: PathBuf,

    /// Overrides `data_dir` from the config
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Wallet operations
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a new user
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },

    /// Look a user up by email
    Login { email: String },

    /// Update a user's name and/or phone
    Profile {
        email: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Show the current gold price
    Price,

    /// Set a new gold price per gram (admin)
    SetPrice {
        price: Decimal,
        /// Acting admin's email (defaults to the seeded admin)
        #[arg(long = "as", value_name = "EMAIL")]
        admin: Option<String>,
    },

    /// Show every price ever set, newest first
    PriceHistory,

    /// List payment methods and their instructions
    Methods,

    /// Replace a payment method's instructions (admin)
    SetMethod {
        method: PaymentMethod,
        details: String,
        #[arg(long = "as", value_name = "EMAIL")]
        admin: Option<String>,
    },

    /// Request to buy gold for an amount of BDT
    Buy {
        email: String,
        amount: Decimal,
        #[arg(long)]
        method: PaymentMethod,
        /// Payment proof reference, e.g. the wallet transaction id
        #[arg(long)]
        proof: Option<String>,
    },

    /// Request to sell gold for an amount of BDT
    Sell {
        email: String,
        amount: Decimal,
        #[arg(long)]
        method: PaymentMethod,
        /// Where the payout should be sent
        #[arg(long)]
        payout: String,
    },

    /// List transactions awaiting review
    Pending,

    /// Approve a pending transaction (admin)
    Approve {
        txn: TransactionId,
        #[arg(long = "as", value_name = "EMAIL")]
        admin: Option<String>,
    },

    /// Reject a pending transaction (admin)
    Reject {
        txn: TransactionId,
        #[arg(long = "as", value_name = "EMAIL")]
        admin: Option<String>,
    },

    /// Transaction history, for one user or everyone
    History { email: Option<String> },

    /// List all users and balances
    Users,

    /// Replay a CSV file of operations and print final balances
    Replay {
        #[arg(value_name = "INPUT", help = "Path to the operations CSV file")]
        input_file: PathBuf,

        #[arg(
            long = "strategy",
            value_name = "STRATEGY",
            default_value = "async",
            help = "Replay strategy: 'sync' for sequential or 'async' for concurrent batches"
        )]
        strategy: StrategyType,

        #[arg(
            long = "batch-size",
            value_name = "SIZE",
            help = "Number of operations per batch (default: 1000)"
        )]
        batch_size: Option<usize>,

        #[arg(
            long = "max-concurrent",
            value_name = "COUNT",
            help = "Worker threads for the async strategy (default: CPU cores)"
        )]
        max_concurrent_batches: Option<usize>,
    },
}

/// Available replay strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl Command {
    /// Whether the command changes ledger state and needs a save
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Register { .. }
                | Command::Profile { .. }
                | Command::SetPrice { .. }
                | Command::SetMethod { .. }
                | Command::Buy { .. }
                | Command::Sell { .. }
                | Command::Approve { .. }
                | Command::Reject { .. }
                | Command::Replay { .. }
        )
    }
}

/// Build a BatchConfig from optional CLI values
///
/// Missing values fall back to the defaults.
pub fn to_batch_config(batch_size: Option<usize>, max_concurrent_batches: Option<usize>) -> BatchConfig {
    if batch_size.is_some() || max_concurrent_batches.is_some() {
        let default = BatchConfig::default();
        BatchConfig::new(
            batch_size.unwrap_or(default.batch_size),
            max_concurrent_batches.unwrap_or(default.max_concurrent_batches),
        )
    } else {
        BatchConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[rstest]
    #[case::default_strategy(&["prog", "replay", "ops.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["prog", "replay", "--strategy", "sync", "ops.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["prog", "replay", "ops.csv", "--strategy", "async"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        match parse(args).command {
            Command::Replay { strategy, .. } => assert_eq!(strategy, expected),
            other => panic!("Expected replay, got {:?}", other),
        }
    }

    #[rstest]
    #[case::no_options(None, None, 1000, num_cpus::get())]
    #[case::batch_size(Some(2000), None, 2000, num_cpus::get())]
    #[case::max_concurrent(None, Some(8), 1000, 8)]
    #[case::zero_falls_back(Some(0), Some(0), 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] batch_size: Option<usize>,
        #[case] max_concurrent: Option<usize>,
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = to_batch_config(batch_size, max_concurrent);

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["prog", "users", "--data-dir", "/tmp/gold", "--config", "x.toml"]);

        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/gold")));
        assert_eq!(args.config, PathBuf::from("x.toml"));
        assert_eq!(args.command, Command::Users);
    }

    #[test]
    fn test_buy_parses_amount_and_method() {
        let args = parse(&[
            "prog", "buy", "a@example.com", "1000.50", "--method", "bank", "--proof", "TRX-1",
        ]);

        assert_eq!(
            args.command,
            Command::Buy {
                email: "a@example.com".to_string(),
                amount: Decimal::new(100050, 2),
                method: PaymentMethod::BankTransfer,
                proof: Some("TRX-1".to_string()),
            }
        );
    }

    #[test]
    fn test_approve_with_acting_admin() {
        let args = parse(&["prog", "approve", "7", "--as", "ops@example.com"]);

        assert_eq!(
            args.command,
            Command::Approve {
                txn: 7,
                admin: Some("ops@example.com".to_string()),
            }
        );
    }

    #[rstest]
    #[case::register(Command::Register { name: "A".into(), email: "a@x".into(), phone: "".into() }, true)]
    #[case::price(Command::Price, false)]
    #[case::history(Command::History { email: None }, false)]
    #[case::approve(Command::Approve { txn: 1, admin: None }, true)]
    fn test_is_mutating(#[case] command: Command, #[case] expected: bool) {
        assert_eq!(command.is_mutating(), expected);
    }

    #[rstest]
    #[case::missing_subcommand(&["prog"])]
    #[case::invalid_strategy(&["prog", "replay", "--strategy", "invalid", "ops.csv"])]
    #[case::invalid_method(&["prog", "buy", "a@x", "100", "--method", "paypal"])]
    #[case::invalid_amount(&["prog", "set-price", "lots"])]
    #[case::sell_without_payout(&["prog", "sell", "a@x", "100", "--method", "nagad"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
