//! Notifications pushed to subscribers (CLI, WebSocket clients)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{RitualKind, RitualProgress};

/// Everything the controller reports to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    RitualStarted {
        progress: RitualProgress,
        subject_name: String,
    },
    RitualTick {
        progress: RitualProgress,
    },
    CheckInCompleted {
        restaurant_id: u32,
        restaurant_name: String,
        points_earned: u32,
        balance: u32,
        at: DateTime<Utc>,
    },
    RedemptionCompleted {
        reward_id: u32,
        reward_name: String,
        points_spent: u32,
        balance: u32,
        at: DateTime<Utc>,
    },
    RitualCancelled {
        kind: RitualKind,
        subject_id: u32,
        remaining_secs: u32,
    },
    /// A start request was refused ("already done", "insufficient points", ...)
    Rejected {
        code: String,
        message: String,
    },
}

impl SessionEvent {
    /// One-line human message, None for tick noise
    pub fn message(&self) -> Option<String> {
        match self {
            SessionEvent::RitualStarted { progress, subject_name } => Some(format!(
                "Scanning for {} {} ({}s)...",
                progress.kind, subject_name, progress.total_secs
            )),
            SessionEvent::RitualTick { .. } => None,
            SessionEvent::CheckInCompleted { restaurant_name, points_earned, .. } => Some(format!(
                "🎉 Checked in at {}! +{} points earned!",
                restaurant_name, points_earned
            )),
            SessionEvent::RedemptionCompleted { reward_name, points_spent, .. } => Some(format!(
                "🎉 Reward redeemed! {} is now available to use! (-{} points)",
                reward_name, points_spent
            )),
            SessionEvent::RitualCancelled { kind, .. } => Some(format!("{} cancelled", kind)),
            SessionEvent::Rejected { message, .. } => Some(message.clone()),
        }
    }
}

/// Summary counters for the progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub balance: u32,
    pub visited_count: usize,
    pub total_restaurants: usize,
}
