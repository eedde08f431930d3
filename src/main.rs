//! Gold Ledger CLI
//!
//! # Usage
//!
//! ```bash
//! gold-ledger register --name Alice --email alice@example.com --phone 01711111111
//! gold-ledger buy alice@example.com 5000 --method bkash --proof TRX-1
//! gold-ledger pending
//! gold-ledger approve 1
//! gold-ledger set-price 9800
//! gold-ledger replay operations.csv --strategy async > balances.csv
//! ```
//!
//! Results are printed to stdout as CSV; logs go to stderr and are filtered
//! with `RUST_LOG` (default `info`). State is kept in the configured data
//! directory between runs.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (unknown user, forbidden action, unreadable file, etc.)

use gold_ledger::cli;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let mut output = std::io::stdout();
    if let Err(e) = cli::run(args, &mut output) {
        error!(retryable = e.is_retryable(), "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
