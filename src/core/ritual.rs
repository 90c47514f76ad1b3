//! Confirmation Ritual: fixed-duration countdown with exactly one outcome
//!
//! State transitions:
//! - RUNNING → COMPLETED: the tick that takes remaining to 0
//! - RUNNING → CANCELLED: cancel() before that tick
//! - COMPLETED / CANCELLED: terminal, ticks and cancels are ignored
//!
//! Time is not read here. Whoever owns the ritual delivers ticks (a real
//! interval, a paused test clock, or a loop in a test).

use crate::RITUAL_DURATION_SECS;
use crate::types::{RitualKind, RitualProgress, RitualStatus};

/// Ritual state machine
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationRitual {
    /// Session-unique number, lets a clock driver tell rituals apart
    seq: u64,
    kind: RitualKind,
    subject_id: u32,
    total_secs: u32,
    remaining_secs: u32,
    status: RitualStatus,
}

impl ConfirmationRitual {
    /// Start a ritual, running with the full duration remaining
    pub fn start(seq: u64, kind: RitualKind, subject_id: u32) -> Self {
        Self {
            seq,
            kind,
            subject_id,
            total_secs: RITUAL_DURATION_SECS,
            remaining_secs: RITUAL_DURATION_SECS,
            status: RitualStatus::Running,
        }
    }

    /// Deliver one elapsed second.
    ///
    /// Returns None when the ritual is no longer running, so a late tick
    /// can never touch a resolved ritual.
    pub fn tick(&mut self) -> Option<RitualProgress> {
        if self.status.is_terminal() {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.status = RitualStatus::Completed;
        }
        Some(self.progress_output())
    }

    /// Dismiss a running ritual. Returns false if it had already resolved.
    pub fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = RitualStatus::Cancelled;
        true
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn kind(&self) -> RitualKind {
        self.kind
    }

    pub fn subject_id(&self) -> u32 {
        self.subject_id
    }

    pub fn status(&self) -> RitualStatus {
        self.status
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn is_running(&self) -> bool {
        self.status == RitualStatus::Running
    }

    /// elapsed / total in 0.0 - 1.0
    pub fn progress(&self) -> f64 {
        (self.total_secs - self.remaining_secs) as f64 / self.total_secs as f64
    }

    /// Current state as a presentation snapshot
    pub fn progress_output(&self) -> RitualProgress {
        RitualProgress {
            seq: self.seq,
            kind: self.kind,
            subject_id: self.subject_id,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            progress: self.progress(),
            status: self.status,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_running_with_full_duration() {
        let ritual = ConfirmationRitual::start(1, RitualKind::CheckIn, 4);
        assert_eq!(ritual.status(), RitualStatus::Running);
        assert_eq!(ritual.remaining_secs(), 30);
        assert_eq!(ritual.progress(), 0.0);
    }

    #[test]
    fn test_countdown_strictly_decreases_to_completion() {
        let mut ritual = ConfirmationRitual::start(1, RitualKind::CheckIn, 4);
        let mut last_remaining = ritual.remaining_secs();
        let mut last_progress = ritual.progress();

        for i in 1..=30 {
            let out = ritual.tick().expect("running ritual must tick");
            assert_eq!(out.remaining_secs, last_remaining - 1);
            assert!(out.progress > last_progress);
            if i < 30 {
                assert_eq!(out.status, RitualStatus::Running);
            }
            last_remaining = out.remaining_secs;
            last_progress = out.progress;
        }

        assert_eq!(ritual.remaining_secs(), 0);
        assert_eq!(ritual.status(), RitualStatus::Completed);
        assert_eq!(ritual.progress(), 1.0);
    }

    #[test]
    fn test_completion_happens_on_the_zero_tick() {
        let mut ritual = ConfirmationRitual::start(1, RitualKind::Redemption, 2);
        for _ in 0..29 {
            ritual.tick();
        }
        assert_eq!(ritual.remaining_secs(), 1);
        assert!(ritual.is_running());

        let out = ritual.tick().unwrap();
        assert_eq!(out.remaining_secs, 0);
        assert_eq!(out.status, RitualStatus::Completed);
    }

    #[test]
    fn test_no_ticks_after_completion() {
        let mut ritual = ConfirmationRitual::start(1, RitualKind::CheckIn, 1);
        for _ in 0..30 {
            ritual.tick();
        }
        for _ in 0..5 {
            assert!(ritual.tick().is_none());
        }
        assert_eq!(ritual.remaining_secs(), 0);
        assert!(!ritual.cancel(), "completed ritual cannot be cancelled");
        assert_eq!(ritual.status(), RitualStatus::Completed);
    }

    #[test]
    fn test_cancel_stops_ticking() {
        let mut ritual = ConfirmationRitual::start(1, RitualKind::CheckIn, 5);
        for _ in 0..10 {
            ritual.tick();
        }
        assert!(ritual.cancel());
        assert_eq!(ritual.status(), RitualStatus::Cancelled);

        assert!(ritual.tick().is_none());
        assert_eq!(ritual.remaining_secs(), 20);
        assert!(!ritual.cancel(), "second cancel is a no-op");
    }

    #[test]
    fn test_cancel_immediately() {
        let mut ritual = ConfirmationRitual::start(1, RitualKind::Redemption, 1);
        assert!(ritual.cancel());
        assert!(ritual.tick().is_none());
        assert_eq!(ritual.progress(), 0.0);
    }
}
