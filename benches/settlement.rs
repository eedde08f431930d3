//! Benchmark suite for replay strategies and settlement
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Replay inputs are generated into temporary files: every user registers,
//! buys, gets approved, sells half and has the sale approved.

use divan::Bencher;
use gold_ledger::cli::StrategyType;
use gold_ledger::config::SeedConfig;
use gold_ledger::strategy::{create_strategy, BatchConfig};
use gold_ledger::types::{NewTransaction, PaymentMethod, ReviewAction};
use gold_ledger::{SettlementPolicy, Wallet};
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

fn wallet() -> Arc<Wallet> {
    Arc::new(Wallet::in_memory(SettlementPolicy::default(), &SeedConfig::default()).expect("bootstrap failed"))
}

fn replay_input(users: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "op,email,name,phone,amount,method,tx,details").unwrap();
    for i in 0..users {
        let email = format!("user{}@example.com", i);
        writeln!(file, "register,{},User {},017{:08},,,,", email, i, i).unwrap();
        writeln!(file, "buy,{},,,19000,bkash,b1,TRX-{}", email, i).unwrap();
        writeln!(file, "approve,{},,,,,b1,", email).unwrap();
        writeln!(file, "sell,{},,,9500,nagad,s1,018{:08}", email, i).unwrap();
        writeln!(file, "approve,{},,,,,s1,", email).unwrap();
    }
    file.flush().unwrap();
    file
}

#[divan::bench(args = [100, 1_000, 10_000])]
fn sync_replay(bencher: Bencher, users: usize) {
    let input = replay_input(users);
    let strategy = create_strategy(StrategyType::Sync, None);

    bencher.with_inputs(wallet).bench_values(|wallet| {
        let mut output = Vec::new();
        strategy
            .process(wallet, input.path(), &mut output)
            .expect("Replay failed");
    });
}

#[divan::bench(args = [100, 1_000, 10_000])]
fn async_replay(bencher: Bencher, users: usize) {
    let input = replay_input(users);
    let strategy = create_strategy(StrategyType::Async, Some(BatchConfig::default()));

    bencher.with_inputs(wallet).bench_values(|wallet| {
        let mut output = Vec::new();
        strategy
            .process(wallet, input.path(), &mut output)
            .expect("Replay failed");
    });
}

/// Create and approve one BUY on a wallet with a single user
#[divan::bench]
fn buy_and_approve(bencher: Bencher) {
    let wallet = wallet();
    let user = wallet
        .register("Bench", "bench@example.com", "01700000000")
        .expect("register failed");
    let admin = wallet.system_admin().expect("no admin");

    bencher.bench_local(|| {
        let txn = wallet
            .create_transaction(NewTransaction::buy(
                user.id,
                Decimal::new(1000, 0),
                PaymentMethod::Bkash,
                Some("TRX".to_string()),
            ))
            .expect("create failed");
        wallet
            .process_transaction(admin.id, txn.id, ReviewAction::Approve)
            .expect("approve failed");
    });
}
