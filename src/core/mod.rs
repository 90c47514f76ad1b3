//! Core modules for Eatventure

pub mod catalog;
pub mod ledger;
pub mod ritual;
pub mod session;
pub mod store;
pub mod clock;
pub mod command;
pub mod api;

pub use catalog::Catalog;
pub use ledger::LoyaltyLedger;
pub use ritual::ConfirmationRitual;
pub use session::{SessionController, SessionConfig, EVENT_CHANNEL_CAPACITY};
pub use store::{save_record, load_record, load_record_if_exists};
pub use clock::{drive_ritual, share, SharedSession};
pub use command::{parse_command, Command, ListFilter};
pub use api::{create_router, run_server, ApiConfig};
