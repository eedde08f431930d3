//! Asynchronous CSV reader with batch interface
//!
//! The AsyncReader uses csv-async for streaming CSV parsing and hands out
//! operations in batches for the async replay strategy.
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (CsvOperation, convert_csv_operation)
//! ```

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

use crate::io::csv_format::{convert_csv_operation, CsvOperation};
use crate::types::Operation;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
    malformed: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
            malformed: 0,
        }
    }

    /// Read up to `batch_size` operations
    ///
    /// Malformed rows are logged, counted and skipped. Returns an empty
    /// vector once the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CsvOperation>();

        while batch.len() < batch_size {
            let next = match rows.next().await {
                Some(next) => next,
                None => break,
            };
            self.line_num += 1;

            match next.map_err(|e| e.to_string()).and_then(convert_csv_operation) {
                Ok(operation) => batch.push(operation),
                Err(message) => {
                    self.malformed += 1;
                    warn!(line = self.line_num, "Skipping malformed row: {}", message);
                }
            }
        }

        batch
    }

    /// Rows skipped so far because they could not be parsed
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}
