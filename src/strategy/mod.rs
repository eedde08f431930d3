//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing both CSV parsing and applying operations to a wallet. This
//! allows different implementations (sequential, async batch) to be selected
//! at runtime.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::cli::StrategyType;
use crate::core::{ProcessingResult, Wallet};
use crate::types::LedgerError;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Counts reported at the end of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Operations that took effect
    pub applied: usize,
    /// Operations the wallet rejected
    pub failed: usize,
    /// Rows that could not be parsed
    pub malformed: usize,
}

impl ReplaySummary {
    fn record(&mut self, results: &[ProcessingResult]) {
        for outcome in results {
            match &outcome.result {
                Ok(()) => self.applied += 1,
                Err(e) => {
                    self.failed += 1;
                    tracing::warn!(
                        op = outcome.operation.kind(),
                        email = outcome.operation.email(),
                        "Operation failed: {}",
                        e
                    );
                }
            }
        }
    }
}

/// Replay strategy trait
pub trait ProcessingStrategy: Send + Sync {
    /// Replay operations from `input_path` against `wallet` and write final
    /// balances to `output`
    ///
    /// # Returns
    ///
    /// * `Ok(ReplaySummary)` - The replay ran to the end; individual failures
    ///   are counted, not fatal
    /// * `Err(LedgerError)` - The input could not be opened or the output
    ///   could not be written
    fn process(
        &self,
        wallet: Arc<Wallet>,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, LedgerError>;
}

/// Create a replay strategy
///
/// # Arguments
///
/// * `strategy_type` - Sync or Async
/// * `config` - Batch configuration for the async strategy (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(config.unwrap_or_default())),
    }
}
