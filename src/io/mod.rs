//! I/O module
//!
//! Handles CSV parsing, output and persistence.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, output serialization)
//! - `sync_reader` - Synchronous replay reader with iterator interface
//! - `async_reader` - Asynchronous replay reader with batch reading interface
//! - `snapshot` - Saving and loading the ledger as CSV files

pub mod async_reader;
pub mod csv_format;
pub mod snapshot;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_csv_operation, format_grams, write_balances_csv, write_payment_methods_csv,
    write_prices_csv, write_transactions_csv, write_users_csv, CsvOperation,
};
pub use snapshot::{load_snapshot, save_snapshot};
pub use sync_reader::SyncReader;
