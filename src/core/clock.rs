//! Real-time driver for a shared session's ritual
//!
//! Delivers one tick per `period` to a specific ritual until it resolves.
//! The session lock is only held for the duration of a single tick, so a
//! cancel request can always get in between two ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::SessionController;
use crate::types::{RitualProgress, RitualStatus, SessionError};

/// A session shared between request handlers and clock drivers
pub type SharedSession = Arc<Mutex<SessionController>>;

/// Wrap a controller for sharing
pub fn share(session: SessionController) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Tick ritual `seq` every `period` until it completes or is no longer active.
///
/// Returns the completing progress, or None if the ritual was cancelled
/// (or replaced) before completion.
pub async fn drive_ritual(
    session: SharedSession,
    seq: u64,
    period: Duration,
) -> Result<Option<RitualProgress>, SessionError> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick of a tokio interval fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let mut guard = session.lock().await;
        match guard.tick_ritual(seq)? {
            Some(progress) if progress.status == RitualStatus::Running => continue,
            Some(progress) => return Ok(Some(progress)),
            None => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Catalog, SessionConfig};

    fn shared() -> SharedSession {
        share(SessionController::new(Catalog::oakland(), SessionConfig::default()).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_drives_to_completion_in_thirty_periods() {
        let session = shared();
        let seq = session.lock().await.start_check_in(4).unwrap().seq;

        let start = tokio::time::Instant::now();
        let done = drive_ritual(session.clone(), seq, Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(done.status, RitualStatus::Completed);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(30) && elapsed < Duration::from_secs(31));
        assert_eq!(session.lock().await.balance(), 545);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_ticks_stops_driver() {
        let session = shared();
        let seq = session.lock().await.start_check_in(4).unwrap().seq;

        let driver = tokio::spawn(drive_ritual(session.clone(), seq, Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let cancelled = session.lock().await.cancel_active_ritual().unwrap();
        assert_eq!(cancelled.remaining_secs, 20);

        let outcome = driver.await.unwrap().unwrap();
        assert!(outcome.is_none());

        let guard = session.lock().await;
        assert_eq!(guard.balance(), 485);
        assert!(!guard.ledger().has_visited(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_seq_returns_none() {
        let session = shared();
        let outcome = drive_ritual(session, 7, Duration::from_secs(1)).await.unwrap();
        assert!(outcome.is_none());
    }
}
