//! Ledger record persistence (JSON on disk)
//!
//! Invariant: a record is only accepted on load if its checksum matches
//! its content.

use std::fs;
use std::path::Path;

use crate::types::{LedgerRecord, StoreError};

/// Save record as pretty JSON, creating parent directories.
/// Writes to a sibling temp file first so a crash never leaves half a record.
pub fn save_record(record: &LedgerRecord, path: &Path) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(record)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load and verify a record
pub fn load_record(path: &Path) -> Result<LedgerRecord, StoreError> {
    let json = fs::read_to_string(path)?;
    let record: LedgerRecord = serde_json::from_str(&json)?;

    if !record.is_intact() {
        return Err(StoreError::ChecksumMismatch {
            expected: record.checksum.clone(),
            actual: LedgerRecord::compute_checksum(record.balance_points, &record.visited_ids),
        });
    }
    Ok(record)
}

/// Load a record if the file exists, None for a fresh start
pub fn load_record_if_exists(path: &Path) -> Result<Option<LedgerRecord>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    load_record(path).map(Some)
}
