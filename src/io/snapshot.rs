//! CSV snapshot persistence
//!
//! A data directory holds numbered generations, one CSV file per collection,
//! and a `CURRENT` pointer naming the generation to load:
//!
//! ```text
//! data/
//!   CURRENT            -> "gen-000003"
//!   gen-000003/
//!     users.csv
//!     prices.csv
//!     payment_methods.csv
//!     transactions.csv
//! ```
//!
//! Saving writes a complete new generation, then replaces `CURRENT` with a
//! single rename. Until that rename lands, loads keep seeing the previous
//! generation in full, so an interrupted save never mixes old and new files.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::LedgerSnapshot;
use crate::types::LedgerError;

const USERS_FILE: &str = "users.csv";
const PRICES_FILE: &str = "prices.csv";
const PAYMENT_METHODS_FILE: &str = "payment_methods.csv";
const TRANSACTIONS_FILE: &str = "transactions.csv";

const POINTER_FILE: &str = "CURRENT";
const GENERATION_PREFIX: &str = "gen-";

/// Save a snapshot into `dir`, creating the directory if needed
///
/// The save is all-or-nothing: on error the previously saved snapshot is
/// still the one `load_snapshot` returns.
pub fn save_snapshot(dir: &Path, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
    fs::create_dir_all(dir)?;

    let next = generations(dir)?.into_iter().max().unwrap_or(0) + 1;
    let name = generation_name(next);
    let generation = dir.join(&name);

    // Leftover from a save that died before its commit
    if generation.exists() {
        fs::remove_dir_all(&generation)?;
    }
    fs::create_dir(&generation)?;

    write_records(&generation.join(USERS_FILE), &snapshot.users)?;
    write_records(&generation.join(PRICES_FILE), &snapshot.prices)?;
    write_records(&generation.join(PAYMENT_METHODS_FILE), &snapshot.payment_methods)?;
    write_records(&generation.join(TRANSACTIONS_FILE), &snapshot.transactions)?;

    commit(dir, &name)?;
    prune(dir, next);

    debug!(
        dir = %dir.display(),
        generation = %name,
        users = snapshot.users.len(),
        transactions = snapshot.transactions.len(),
        "Snapshot saved"
    );
    Ok(())
}

/// Load the snapshot stored in `dir`
///
/// # Returns
///
/// * `Ok(None)` - No snapshot has been saved there yet
/// * `Ok(Some(snapshot))` - The collections of the committed generation
/// * `Err(LedgerError::Parse)` - The pointer or a file is not a valid snapshot
pub fn load_snapshot(dir: &Path) -> Result<Option<LedgerSnapshot>, LedgerError> {
    let generation = match current_generation(dir)? {
        Some(generation) => generation,
        None => {
            debug!(dir = %dir.display(), "No snapshot found");
            return Ok(None);
        }
    };

    let snapshot = LedgerSnapshot {
        users: read_records(&generation.join(USERS_FILE))?,
        prices: read_records(&generation.join(PRICES_FILE))?,
        payment_methods: read_records(&generation.join(PAYMENT_METHODS_FILE))?,
        transactions: read_records(&generation.join(TRANSACTIONS_FILE))?,
    };

    debug!(
        dir = %dir.display(),
        generation = %generation.display(),
        users = snapshot.users.len(),
        transactions = snapshot.transactions.len(),
        "Snapshot loaded"
    );
    Ok(Some(snapshot))
}

/// Directory of the committed generation, `None` if nothing was committed
fn current_generation(dir: &Path) -> Result<Option<PathBuf>, LedgerError> {
    let pointer = dir.join(POINTER_FILE);
    if !pointer.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&pointer)?;
    let name = contents.trim();
    if parse_generation(name).is_none() {
        return Err(LedgerError::Parse {
            line: None,
            message: format!("{}: invalid generation '{}'", pointer.display(), name),
        });
    }

    let generation = dir.join(name);
    if !generation.is_dir() {
        return Err(LedgerError::Parse {
            line: None,
            message: format!("{}: generation '{}' is missing", pointer.display(), name),
        });
    }
    Ok(Some(generation))
}

/// Point `CURRENT` at `name` with one atomic rename
fn commit(dir: &Path, name: &str) -> Result<(), LedgerError> {
    let pointer = dir.join(POINTER_FILE);
    let staged = dir.join(format!("{}.tmp", POINTER_FILE));

    fs::write(&staged, name)?;
    File::open(&staged)?.sync_all()?;
    fs::rename(&staged, &pointer)?;
    Ok(())
}

/// Remove every generation except `keep`
///
/// Runs after the commit, so a failure only leaves stale directories behind.
fn prune(dir: &Path, keep: u64) {
    let stale = match generations(dir) {
        Ok(found) => found.into_iter().filter(|&number| number != keep),
        Err(e) => {
            warn!(dir = %dir.display(), "Could not list old snapshot generations: {}", e);
            return;
        }
    };

    for number in stale {
        let path = dir.join(generation_name(number));
        if let Err(e) = fs::remove_dir_all(&path) {
            warn!(path = %path.display(), "Could not remove old snapshot generation: {}", e);
        }
    }
}

/// Numbers of every generation directory in `dir`
fn generations(dir: &Path) -> Result<Vec<u64>, LedgerError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(number) = parse_generation(&entry.file_name().to_string_lossy()) {
            found.push(number);
        }
    }
    Ok(found)
}

fn generation_name(number: u64) -> String {
    format!("{}{:06}", GENERATION_PREFIX, number)
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), LedgerError> {
    let mut writer = Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    let file = writer.into_inner().map_err(|e| LedgerError::Io {
        message: format!("Failed to finish {}: {}", path.display(), e.error()),
    })?;
    file.sync_all()?;
    Ok(())
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record = result.map_err(|e| LedgerError::Parse {
            line: e.position().map(|pos| pos.line()),
            message: format!("{}: {}", path.display(), e),
        })?;
        records.push(record);
    }
    Ok(records)
}
