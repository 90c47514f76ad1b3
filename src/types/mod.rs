//! Core types for Eatventure

mod restaurant;
mod reward;
mod ritual;
mod event;
mod error;
mod record;

pub use restaurant::{RarityTier, GeoPoint, RestaurantEntry};
pub use reward::RewardEntry;
pub use ritual::{RitualKind, RitualStatus, RitualProgress};
pub use event::{SessionEvent, SessionStats};
pub use error::{LedgerError, StoreError, SessionError, ParseRarityError};
pub use record::LedgerRecord;
