//! Integration tests for the loyalty session
//!
//! Full path: Catalog → SessionController → ConfirmationRitual → LoyaltyLedger

use eatventure::core::{Catalog, SessionConfig, SessionController};
use eatventure::types::{RitualStatus, SessionError, SessionEvent};
use eatventure::RITUAL_DURATION_SECS;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn seeded_session() -> SessionController {
    SessionController::new(Catalog::oakland(), SessionConfig::default()).unwrap()
}

fn tick_through(session: &mut SessionController) {
    for _ in 0..RITUAL_DURATION_SECS {
        session.tick().unwrap();
    }
}

/// Balance 485, visited {1,3}: check in at Daughter Thai, then try again
#[test]
fn test_check_in_scenario() {
    let mut session = seeded_session();
    assert_eq!(session.balance(), 485);

    session.start_check_in(4).unwrap();
    tick_through(&mut session);

    assert_eq!(session.balance(), 545);
    assert_eq!(session.ledger().visited(), &BTreeSet::from([1, 3, 4]));

    let err = session.start_check_in(4).unwrap_err();
    assert!(matches!(err, SessionError::AlreadyVisited { restaurant_id: 4, .. }));
    assert!(err.is_recoverable());
    assert_eq!(session.balance(), 545);
}

/// Balance 545: redeem the 200-point coupon, then fail on the 1500-point meal
#[test]
fn test_redemption_scenario() {
    let mut session = SessionController::new(
        Catalog::oakland(),
        SessionConfig {
            initial_balance: 545,
            initial_visited: vec![1, 3, 4],
            store_path: None,
        },
    )
    .unwrap();

    let coupon = session.catalog().reward(2).unwrap().clone();
    assert_eq!(coupon.cost_points, 200);

    session.start_redemption(coupon.id).unwrap();
    tick_through(&mut session);
    assert_eq!(session.balance(), 345);

    let err = session.start_redemption(3).unwrap_err();
    assert!(matches!(
        err,
        SessionError::InsufficientBalance { required: 1500, available: 345, .. }
    ));
    assert!(session.active_ritual().is_none(), "no ritual on rejection");
    assert_eq!(session.balance(), 345);
}

/// Visit every restaurant, then spend down to an unaffordable reward
#[test]
fn test_full_tour() {
    let mut session = SessionController::new(
        Catalog::oakland(),
        SessionConfig {
            initial_balance: 0,
            initial_visited: vec![],
            store_path: None,
        },
    )
    .unwrap();

    let ids: Vec<u32> = session.catalog().restaurants().iter().map(|r| r.id).collect();
    let total: u32 = session.catalog().restaurants().iter().map(|r| r.point_value).sum();
    for id in ids {
        session.start_check_in(id).unwrap();
        tick_through(&mut session);
    }
    assert_eq!(session.balance(), total);
    assert_eq!(session.stats().visited_count, 5);

    // 245 points: one appetizer fits, a second one does not
    session.start_redemption(1).unwrap();
    tick_through(&mut session);
    assert_eq!(session.balance(), total - 100);
    session.start_redemption(1).unwrap();
    tick_through(&mut session);
    assert_eq!(session.balance(), total - 200);
    assert!(session.start_redemption(1).is_err());
}

/// Cancelled ritual: no mutation, result notification is a cancel notice
#[test]
fn test_cancel_mid_ritual() {
    let mut session = seeded_session();
    let mut rx = session.subscribe();

    session.start_redemption(2).unwrap();
    for _ in 0..(RITUAL_DURATION_SECS - 1) {
        session.tick().unwrap();
    }
    let cancelled = session.cancel_active_ritual().unwrap();
    assert_eq!(cancelled.status, RitualStatus::Cancelled);
    assert_eq!(cancelled.remaining_secs, 1);

    // The tick that would have completed it never applies
    assert_eq!(session.tick().unwrap(), None);
    assert_eq!(session.balance(), 485);

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert!(matches!(last, Some(SessionEvent::RitualCancelled { remaining_secs: 1, .. })));
}

/// Exactly one completion event per completed ritual
#[test]
fn test_single_completion_event() {
    let mut session = seeded_session();
    let mut rx = session.subscribe();

    session.start_check_in(5).unwrap();
    for _ in 0..(RITUAL_DURATION_SECS * 2) {
        session.tick().unwrap();
    }

    let mut completions = 0;
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::CheckInCompleted { points_earned, .. } = event {
            assert_eq!(points_earned, 35);
            completions += 1;
        }
    }
    assert_eq!(completions, 1);
    assert_eq!(session.balance(), 520);
}
