//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over replay operations from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Individual row errors are yielded as `LedgerError::Parse` with the line
//!   number, and iteration continues with the next row

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::io::csv_format::{convert_csv_operation, CsvOperation};
use crate::types::{LedgerError, Operation};

/// Synchronous CSV reader
///
/// # Examples
///
/// ```no_run
/// use gold_ledger::io::sync_reader::SyncReader;
/// use std::path::Path;
///
/// let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
/// let operations: Vec<_> = reader.filter_map(Result::ok).collect();
/// println!("Parsed {} operations", operations.len());
/// ```
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a replay file
    ///
    /// The reader trims whitespace from all fields and accepts rows with
    /// fewer columns than the header.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| LedgerError::Io {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Operation, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvOperation>();
        let next = deserializer.next()?;
        self.line_num += 1;

        let line = self.line_num;
        Some(match next {
            Ok(row) => convert_csv_operation(row).map_err(|message| LedgerError::Parse {
                line: Some(line),
                message,
            }),
            Err(e) => Err(LedgerError::Parse {
                line: Some(line),
                message: e.to_string(),
            }),
        })
    }
}
