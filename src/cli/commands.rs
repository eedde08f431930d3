//! Command dispatch
//!
//! Each run loads the snapshot from the data directory (bootstrapping seed
//! records on first use), executes one command and saves the snapshot back
//! if the command changed anything.

use std::io::Write;
use std::sync::Arc;

use tracing::info;

use super::args::{to_batch_config, CliArgs, Command, StrategyType};
use crate::config::{load_or_default, AppConfig};
use crate::core::Wallet;
use crate::io::{
    load_snapshot, save_snapshot, write_payment_methods_csv, write_prices_csv,
    write_transactions_csv, write_users_csv,
};
use crate::strategy::create_strategy;
use crate::types::{
    LedgerError, NewTransaction, ProfileUpdate, ReviewAction, TransactionScope, User,
};

/// Resolve configuration from the parsed arguments
pub fn resolve_config(args: &CliArgs) -> Result<AppConfig, LedgerError> {
    let mut config = load_or_default(&args.config)?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

/// Restore the wallet from `config.data_dir`, or start a fresh one
pub fn open_wallet(config: &AppConfig) -> Result<Wallet, LedgerError> {
    let policy = config.ledger.policy();
    match load_snapshot(&config.data_dir)? {
        Some(snapshot) => Wallet::from_snapshot(snapshot, policy, &config.seed),
        None => Wallet::in_memory(policy, &config.seed),
    }
}

/// Execute the parsed command, writing CSV results to `output`
pub fn run(args: CliArgs, output: &mut dyn Write) -> Result<(), LedgerError> {
    let config = resolve_config(&args)?;
    let wallet = Arc::new(open_wallet(&config)?);

    execute(&wallet, args.command.clone(), output)?;

    if args.command.is_mutating() {
        save_snapshot(&config.data_dir, &wallet.snapshot())?;
        info!(dir = %config.data_dir.display(), "Ledger saved");
    }
    Ok(())
}

/// Execute one command against a wallet
pub fn execute(wallet: &Arc<Wallet>, command: Command, output: &mut dyn Write) -> Result<(), LedgerError> {
    let scale = wallet.policy().gram_scale;

    match command {
        Command::Register { name, email, phone } => {
            let user = wallet.register(&name, &email, &phone)?;
            write_users_csv(&[user], scale, output)
        }
        Command::Login { email } => {
            let user = wallet.login(&email)?;
            write_users_csv(&[user], scale, output)
        }
        Command::Profile { email, name, phone } => {
            let user = wallet.login(&email)?;
            let user = wallet.update_profile(user.id, ProfileUpdate { name, phone })?;
            write_users_csv(&[user], scale, output)
        }
        Command::Price => write_prices_csv(&[wallet.current_price()?], output),
        Command::SetPrice { price, admin } => {
            let admin = acting_admin(wallet, admin.as_deref())?;
            let record = wallet.set_price(admin.id, price)?;
            write_prices_csv(&[record], output)
        }
        Command::PriceHistory => write_prices_csv(&wallet.price_history(), output),
        Command::Methods => write_payment_methods_csv(&wallet.list_payment_methods(), output),
        Command::SetMethod {
            method,
            details,
            admin,
        } => {
            let admin = acting_admin(wallet, admin.as_deref())?;
            let info = wallet.update_payment_method(admin.id, method, &details)?;
            write_payment_methods_csv(&[info], output)
        }
        Command::Buy {
            email,
            amount,
            method,
            proof,
        } => {
            let user = wallet.login(&email)?;
            let txn = wallet.create_transaction(NewTransaction::buy(user.id, amount, method, proof))?;
            write_transactions_csv(&[txn], output)
        }
        Command::Sell {
            email,
            amount,
            method,
            payout,
        } => {
            let user = wallet.login(&email)?;
            let txn = wallet.create_transaction(NewTransaction::sell(user.id, amount, method, payout))?;
            write_transactions_csv(&[txn], output)
        }
        Command::Pending => write_transactions_csv(&wallet.pending_transactions(), output),
        Command::Approve { txn, admin } => {
            let admin = acting_admin(wallet, admin.as_deref())?;
            let txn = wallet.process_transaction(admin.id, txn, ReviewAction::Approve)?;
            write_transactions_csv(&[txn], output)
        }
        Command::Reject { txn, admin } => {
            let admin = acting_admin(wallet, admin.as_deref())?;
            let txn = wallet.process_transaction(admin.id, txn, ReviewAction::Reject)?;
            write_transactions_csv(&[txn], output)
        }
        Command::History { email } => {
            let scope = match email {
                Some(email) => TransactionScope::User(wallet.login(&email)?.id),
                None => TransactionScope::All,
            };
            write_transactions_csv(&wallet.list_transactions(scope), output)
        }
        Command::Users => write_users_csv(&wallet.list_users(), scale, output),
        Command::Replay {
            input_file,
            strategy,
            batch_size,
            max_concurrent_batches,
        } => {
            let config = match strategy {
                StrategyType::Async => Some(to_batch_config(batch_size, max_concurrent_batches)),
                StrategyType::Sync => None,
            };
            create_strategy(strategy, config).process(Arc::clone(wallet), &input_file, output)?;
            Ok(())
        }
    }
}

/// The admin named by `--as`, or the seeded system admin
fn acting_admin(wallet: &Wallet, email: Option<&str>) -> Result<User, LedgerError> {
    match email {
        Some(email) => wallet.login(email),
        None => wallet.system_admin(),
    }
}
