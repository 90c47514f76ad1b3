//! Confirmation ritual state definitions

use serde::{Deserialize, Serialize};

/// What a ritual confirms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RitualKind {
    /// First visit to a restaurant, subject is a restaurant id
    CheckIn,
    /// Spending points, subject is a reward id
    Redemption,
}

impl std::fmt::Display for RitualKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RitualKind::CheckIn => "check-in",
            RitualKind::Redemption => "redemption",
        };
        write!(f, "{}", name)
    }
}

/// The three possible states of a ritual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RitualStatus {
    /// Counting down
    Running,
    /// Countdown reached zero, effect must be applied once
    Completed,
    /// Dismissed before completion, no effect
    Cancelled,
}

impl RitualStatus {
    /// Completed and Cancelled accept no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RitualStatus::Running)
    }
}

impl std::fmt::Display for RitualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RitualStatus::Running => "RUNNING",
            RitualStatus::Completed => "COMPLETED",
            RitualStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", name)
    }
}

/// Snapshot of a ritual after a tick or transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RitualProgress {
    pub seq: u64,
    pub kind: RitualKind,
    pub subject_id: u32,
    pub remaining_secs: u32,
    pub total_secs: u32,
    /// elapsed / total, 0.0 - 1.0
    pub progress: f64,
    pub status: RitualStatus,
}

impl RitualProgress {
    /// Format for terminal display, e.g. `[#####.....] 15s`
    pub fn to_bar_string(&self, width: usize) -> String {
        let filled = ((self.progress * width as f64).round() as usize).min(width);
        format!(
            "[{}{}] {:>2}s",
            "#".repeat(filled),
            ".".repeat(width - filled),
            self.remaining_secs
        )
    }
}
