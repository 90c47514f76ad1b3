//! Restaurant catalog entries

use serde::{Deserialize, Serialize};

use crate::types::ParseRarityError;

/// How hard a restaurant is to find, drives display and point value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RarityTier {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl RarityTier {
    /// All tiers, lowest first
    pub const ALL: [RarityTier; 4] = [
        RarityTier::Common,
        RarityTier::Rare,
        RarityTier::Epic,
        RarityTier::Legendary,
    ];

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            RarityTier::Common => "\x1b[90m",    // Gray
            RarityTier::Rare => "\x1b[34m",      // Blue
            RarityTier::Epic => "\x1b[35m",      // Purple
            RarityTier::Legendary => "\x1b[33m", // Orange/Yellow
        }
    }

    /// Get emoji for tier
    pub fn emoji(&self) -> &'static str {
        match self {
            RarityTier::Common => "⚪",
            RarityTier::Rare => "💎",
            RarityTier::Epic => "🔮",
            RarityTier::Legendary => "👑",
        }
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RarityTier::Common => "Common",
            RarityTier::Rare => "Rare",
            RarityTier::Epic => "Epic",
            RarityTier::Legendary => "Legendary",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for RarityTier {
    type Err = ParseRarityError;

    /// Case-insensitive, so "rare" and "RARE" both parse
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RarityTier::ALL
            .into_iter()
            .find(|tier| tier.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseRarityError(s.to_string()))
    }
}

/// Latitude / longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A restaurant in the static catalog. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantEntry {
    /// Unique, stable id
    pub id: u32,
    pub name: String,
    pub cuisine: String,
    pub neighborhood: String,
    /// 0.0 - 5.0
    pub rating: f32,
    pub distance_miles: f32,
    /// Points credited on first check-in (always positive)
    pub point_value: u32,
    pub rarity: RarityTier,
    pub location: GeoPoint,
    pub address: String,
    pub description: String,
    pub icon: String,
}
