//! Eatventure: loyalty core for a dining-discovery game
//!
//! Catalog → LoyaltyLedger → ConfirmationRitual → SessionController,
//! with a terminal CLI and an HTTP/WebSocket API as front ends.

pub mod core;
pub mod types;

// =============================================================================
// RITUAL
// =============================================================================

/// Length of every scan ritual (seconds, one tick each)
pub const RITUAL_DURATION_SECS: u32 = 30;

/// Wall-clock time between ticks when driven by a real clock (milliseconds)
pub const DEFAULT_TICK_MS: u64 = 1000;

// =============================================================================
// SEEDED SESSION
// =============================================================================

/// Starting balance of a new session
pub const DEFAULT_INITIAL_BALANCE: u32 = 485;

/// Restaurants already visited in a new session
pub const DEFAULT_VISITED: [u32; 2] = [1, 3];

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
