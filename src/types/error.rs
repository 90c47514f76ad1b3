//! Error taxonomy
//!
//! Recoverable, user-facing conditions (already visited, not enough points,
//! ritual busy, unknown id) are kept apart from defects: a ledger failure at
//! ritual completion is an `InvariantViolation` and is never shown as a
//! normal "try again" notice.

use thiserror::Error;

use crate::types::RitualKind;

/// Failures of the two ledger mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("restaurant {restaurant_id} was already credited")]
    AlreadyVisited { restaurant_id: u32 },
    #[error("insufficient balance: need {required} points, have {available}")]
    InsufficientBalance { required: u32, available: u32 },
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("crediting {amount} points would overflow balance {balance}")]
    BalanceOverflow { balance: u32, amount: u32 },
}

/// Failures loading or saving a ledger record
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("checksum mismatch: record says {expected}, content hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Errors surfaced by the session controller
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("already checked in at {name}")]
    AlreadyVisited { restaurant_id: u32, name: String },
    #[error("not enough points for {name}: need {required}, have {available}")]
    InsufficientBalance {
        reward_id: u32,
        name: String,
        required: u32,
        available: u32,
    },
    #[error("a {kind} ritual for #{subject_id} is already running")]
    RitualInProgress { kind: RitualKind, subject_id: u32 },
    #[error("no restaurant with id {0}")]
    UnknownRestaurant(u32),
    #[error("no reward with id {0}")]
    UnknownReward(u32),
    #[error("ledger rejected completed {kind} for #{subject_id}: {source}")]
    InvariantViolation {
        kind: RitualKind,
        subject_id: u32,
        #[source]
        source: LedgerError,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Stable code string (for logs and API bodies)
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyVisited { .. } => "E101_ALREADY_VISITED",
            Self::InsufficientBalance { .. } => "E102_INSUFFICIENT_BALANCE",
            Self::RitualInProgress { .. } => "E103_RITUAL_IN_PROGRESS",
            Self::UnknownRestaurant(_) => "E104_UNKNOWN_RESTAURANT",
            Self::UnknownReward(_) => "E105_UNKNOWN_REWARD",
            Self::InvariantViolation { .. } => "E901_INVARIANT_VIOLATION",
            Self::Store(_) => "E902_STORE_FAILURE",
        }
    }

    /// True for conditions the user can act on; false for defects
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AlreadyVisited { .. }
                | Self::InsufficientBalance { .. }
                | Self::RitualInProgress { .. }
                | Self::UnknownRestaurant(_)
                | Self::UnknownReward(_)
        )
    }
}

/// Unrecognised rarity name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rarity tier: {0}")]
pub struct ParseRarityError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_recoverable() {
        let errs = [
            SessionError::AlreadyVisited { restaurant_id: 4, name: "Daughter Thai".into() },
            SessionError::RitualInProgress { kind: RitualKind::CheckIn, subject_id: 2 },
            SessionError::UnknownReward(9),
        ];
        for err in errs {
            assert!(err.is_recoverable(), "{} should be recoverable", err.code());
        }
    }

    #[test]
    fn test_invariant_violation_is_a_defect() {
        let err = SessionError::InvariantViolation {
            kind: RitualKind::Redemption,
            subject_id: 3,
            source: LedgerError::InsufficientBalance { required: 1500, available: 10 },
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.code(), "E901_INVARIANT_VIOLATION");
        assert!(err.to_string().contains("need 1500"));
    }
}
