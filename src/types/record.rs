//! Flat persisted form of a ledger

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// `{balance_points, visited_ids}` plus integrity metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub balance_points: u32,
    pub visited_ids: BTreeSet<u32>,
    pub saved_at: DateTime<Utc>,
    /// Hex SHA-256 over balance and visited ids
    pub checksum: String,
}

impl LedgerRecord {
    /// Build a record stamped with the current time and a fresh checksum
    pub fn new(balance_points: u32, visited_ids: BTreeSet<u32>) -> Self {
        let checksum = Self::compute_checksum(balance_points, &visited_ids);
        Self {
            balance_points,
            visited_ids,
            saved_at: Utc::now(),
            checksum,
        }
    }

    /// Hash of the content fields; `saved_at` is not covered
    pub fn compute_checksum(balance_points: u32, visited_ids: &BTreeSet<u32>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(balance_points.to_be_bytes());
        for id in visited_ids {
            hasher.update(id.to_be_bytes());
        }
        let digest: [u8; 32] = hasher.finalize().into();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Does the stored checksum match the content?
    pub fn is_intact(&self) -> bool {
        self.checksum == Self::compute_checksum(self.balance_points, &self.visited_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_detects_tampering() {
        let mut record = LedgerRecord::new(485, BTreeSet::from([1, 3]));
        assert!(record.is_intact());
        assert_eq!(record.checksum.len(), 64);

        record.balance_points = 99_999;
        assert!(!record.is_intact());
    }

    #[test]
    fn test_checksum_ignores_timestamp() {
        let a = LedgerRecord::new(10, BTreeSet::from([2]));
        let b = LedgerRecord::new(10, BTreeSet::from([2]));
        assert_eq!(a.checksum, b.checksum);
    }
}
