//! Reward catalog entries

use serde::{Deserialize, Serialize};

/// A reward that can be bought with points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub id: u32,
    pub name: String,
    pub description: String,
    /// Price in points (always positive)
    pub cost_points: u32,
    pub icon: String,
}
