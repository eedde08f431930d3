// CLI module
// Command-line parsing and command dispatch

mod args;
mod commands;

pub use args::{to_batch_config, CliArgs, Command, StrategyType};
pub use commands::{execute, open_wallet, resolve_config, run};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// On invalid arguments or `--help`, clap prints the message and exits the
/// process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
