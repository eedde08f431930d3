//! Synchronous replay strategy
//!
//! Streams operations with `SyncReader` and applies them one at a time in
//! file order. Memory use is independent of the file size.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{BatchProcessor, Wallet};
use crate::io::csv_format::write_balances_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, ReplaySummary};
use crate::types::LedgerError;

/// Sequential, single-threaded replay
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        wallet: Arc<Wallet>,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError> {
        let processor = BatchProcessor::new(Arc::clone(&wallet));
        let reader = SyncReader::new(input_path)?;
        let mut summary = ReplaySummary::default();

        for row in reader {
            match row {
                Ok(operation) => summary.record(&processor.apply_all(vec![operation])),
                Err(e) => {
                    summary.malformed += 1;
                    warn!("Skipping malformed row: {}", e);
                }
            }
        }

        info!(
            applied = summary.applied,
            failed = summary.failed,
            malformed = summary.malformed,
            "Replay finished"
        );

        write_balances_csv(&wallet.list_users(), wallet.policy().gram_scale, output)?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;
    use crate::core::SettlementPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "op,email,name,phone,amount,method,tx,details\n{}", rows).unwrap();
        file.flush().unwrap();
        file
    }

    fn wallet() -> Arc<Wallet> {
        Arc::new(Wallet::in_memory(SettlementPolicy::default(), &SeedConfig::default()).unwrap())
    }

    #[test]
    fn test_sync_strategy_buy_and_approve() {
        let file = create_temp_csv(
            "register,alice@example.com,Alice,017,,,,\n\
             buy,alice@example.com,,,1000,bkash,t1,TRX-1\n\
             approve,alice@example.com,,,,,t1,\n",
        );
        let mut output = Vec::new();

        let summary = SyncProcessingStrategy
            .process(wallet(), file.path(), &mut output)
            .unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                applied: 3,
                failed: 0,
                malformed: 0
            }
        );
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "user,email,name,role,gold_balance\n\
             1,admin@auro.com,System Admin,ADMIN,0.000000\n\
             2,alice@example.com,Alice,USER,0.105263\n"
        );
    }

    #[test]
    fn test_sync_strategy_counts_failures_and_malformed_rows() {
        let file = create_temp_csv(
            "register,alice@example.com,Alice,017,,,,\n\
             sell,alice@example.com,,,5000,nagad,s1,01811111111\n\
             teleport,alice@example.com,,,,,,\n",
        );
        let mut output: Vec<u8> = Vec::new();

        let summary = SyncProcessingStrategy
            .process(wallet(), file.path(), &mut output)
            .unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.malformed, 1);
    }

    #[test]
    fn test_sync_strategy_handles_missing_file() {
        let mut output: Vec<u8> = Vec::new();

        let result = SyncProcessingStrategy.process(wallet(), Path::new("nonexistent.csv"), &mut output);

        assert!(matches!(result, Err(LedgerError::Io { .. })));
        assert!(output.is_empty());
    }

    #[test]
    fn test_sync_strategy_updates_shared_wallet() {
        let wallet = wallet();
        let file = create_temp_csv("register,bob@example.com,Bob,018,,,,\n");

        SyncProcessingStrategy
            .process(Arc::clone(&wallet), file.path(), &mut Vec::<u8>::new())
            .unwrap();

        assert!(wallet.find_user("bob@example.com").is_some());
    }
}
