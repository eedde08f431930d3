//! End-to-end integration tests
//!
//! These tests replay predefined CSV fixtures against a fresh wallet and
//! compare the printed balances with the expected output. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Replays every operation through the wallet
//! 3. Writes the final balances to a temporary file
//! 4. Compares them with expected.csv
//!
//! Fixtures live in tests/fixtures/ and cover:
//! - Buy requests settled by an admin
//! - Sell reservations, refunds on reject
//! - Insufficient balance and unknown users
//! - Price changes between requests, non-admin price updates
//! - Double reviews, duplicate labels and duplicate registrations
//! - Malformed rows
//!
//! Every fixture is replayed with both the sync and the async strategy.

#[cfg(test)]
mod tests {
    use gold_ledger::cli::{self, CliArgs, StrategyType};
    use gold_ledger::config::SeedConfig;
    use gold_ledger::strategy::{create_strategy, BatchConfig};
    use gold_ledger::{SettlementPolicy, Wallet};
    use clap::Parser;
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn fresh_wallet() -> Arc<Wallet> {
        Arc::new(
            Wallet::in_memory(SettlementPolicy::default(), &SeedConfig::default())
                .expect("Failed to bootstrap wallet"),
        )
    }

    /// Replay `tests/fixtures/{fixture_name}/input.csv` and compare the
    /// balances with `expected.csv`
    ///
    /// A small batch size forces the async strategy to carry users across
    /// batch boundaries.
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let config = match strategy_type {
            StrategyType::Async => Some(BatchConfig::new(3, 4)),
            StrategyType::Sync => None,
        };
        let strategy = create_strategy(strategy_type.clone(), config);

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .process(fresh_wallet(), Path::new(&input_path), &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay operations: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("buy_approve")]
    #[case("sell_reject")]
    #[case("insufficient_balance")]
    #[case("price_change")]
    #[case("double_review")]
    #[case("malformed_rows")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    fn run_cli(data_dir: &Path, command: &[&str]) -> String {
        let mut argv = vec![
            "gold-ledger".to_string(),
            "--config".to_string(),
            data_dir.join("missing.toml").display().to_string(),
            "--data-dir".to_string(),
            data_dir.display().to_string(),
        ];
        argv.extend(command.iter().map(|s| s.to_string()));

        let mut output = Vec::new();
        cli::run(CliArgs::try_parse_from(argv).unwrap(), &mut output)
            .unwrap_or_else(|e| panic!("Command {:?} failed: {}", command, e));
        String::from_utf8(output).unwrap()
    }

    /// Transaction id from the first data row of a transactions CSV
    fn first_txn_id(csv: &str) -> String {
        csv.lines()
            .nth(1)
            .and_then(|row| row.split(',').next())
            .expect("no transaction row")
            .to_string()
    }

    #[test]
    fn test_cli_session_persists_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("ledger");

        run_cli(&data, &["register", "--name", "Alice", "--email", "alice@example.com"]);
        let buy = run_cli(&data, &["buy", "alice@example.com", "19000", "--method", "bkash", "--proof", "TRX-1"]);
        run_cli(&data, &["approve", &first_txn_id(&buy)]);

        let sell = run_cli(&data, &["sell", "alice@example.com", "9500", "--method", "nagad", "--payout", "01811111111"]);
        let pending = run_cli(&data, &["pending"]);
        assert_eq!(pending.lines().count(), 2);
        run_cli(&data, &["reject", &first_txn_id(&sell)]);

        let users = run_cli(&data, &["users"]);
        let alice = users
            .lines()
            .find(|line| line.contains("alice@example.com"))
            .unwrap();
        assert!(alice.contains(",USER,2.000000,"));

        let history = run_cli(&data, &["history", "alice@example.com"]);
        assert_eq!(history.lines().count(), 3);
        assert!(history.contains("FAILED"));
        assert!(history.contains("SUCCESS"));
    }

    #[test]
    fn test_cli_replay_updates_persisted_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("ledger");

        let balances = run_cli(
            &data,
            &["replay", "tests/fixtures/buy_approve/input.csv", "--strategy", "sync"],
        );
        assert_eq!(
            balances,
            fs::read_to_string("tests/fixtures/buy_approve/expected.csv").unwrap()
        );

        let history = run_cli(&data, &["history", "bob@example.com"]);
        assert_eq!(history.lines().count(), 2);
    }
}
