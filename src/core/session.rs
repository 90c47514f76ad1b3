//! Session Controller: owns the ledger and at most one ritual
//!
//! Protocol:
//! - start_*: eligibility is checked now, nothing is mutated
//! - tick: advances the ritual, the completing tick applies the effect
//! - cancel_active_ritual: drops the ritual, nothing was mutated so nothing to undo
//!
//! Because only one ritual can be active, no other action can invalidate
//! the eligibility check between start and completion.

use std::path::PathBuf;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::core::{load_record_if_exists, save_record, Catalog, ConfirmationRitual, LoyaltyLedger};
use crate::types::{
    LedgerError, RitualKind, RitualProgress, RitualStatus, SessionError, SessionEvent,
    SessionStats,
};
use crate::{DEFAULT_INITIAL_BALANCE, DEFAULT_VISITED};

/// Buffered events per subscriber before the oldest are dropped
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// How a session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub initial_balance: u32,
    pub initial_visited: Vec<u32>,
    /// Ledger record file. An existing record wins over the initial values.
    pub store_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            initial_visited: DEFAULT_VISITED.to_vec(),
            store_path: None,
        }
    }
}

/// The running ritual plus the effect it will apply, captured at start
#[derive(Debug)]
struct ActiveRitual {
    ritual: ConfirmationRitual,
    subject_name: String,
    /// point_value for a check-in, cost_points for a redemption
    amount: u32,
}

/// Orchestrates check-ins and redemptions for one user session
#[derive(Debug)]
pub struct SessionController {
    catalog: Catalog,
    ledger: LoyaltyLedger,
    active: Option<ActiveRitual>,
    next_seq: u64,
    store_path: Option<PathBuf>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Create a session, restoring the ledger from `store_path` when a record exists
    pub fn new(catalog: Catalog, config: SessionConfig) -> Result<Self, SessionError> {
        let restored = match &config.store_path {
            Some(path) => load_record_if_exists(path)?,
            None => None,
        };

        let ledger = match restored {
            Some(record) => {
                info!(
                    "restored ledger: {} points, {} visits",
                    record.balance_points,
                    record.visited_ids.len()
                );
                LoyaltyLedger::from_record(&record)
            }
            None => LoyaltyLedger::new(config.initial_balance, config.initial_visited.iter().copied()),
        };

        let mut controller = Self::from_ledger(catalog, ledger);
        controller.store_path = config.store_path;
        Ok(controller)
    }

    /// Create a session around an existing ledger, without persistence
    pub fn from_ledger(catalog: Catalog, ledger: LoyaltyLedger) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            catalog,
            ledger,
            active: None,
            next_seq: 1,
            store_path: None,
            events,
        }
    }

    /// Subscribe to ritual progress and result notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // START
    // =========================================================================

    /// Begin the scan ritual for a first visit
    pub fn start_check_in(&mut self, restaurant_id: u32) -> Result<RitualProgress, SessionError> {
        let result = self.check_in_eligibility(restaurant_id);
        self.begin_or_reject(RitualKind::CheckIn, restaurant_id, result)
    }

    /// Begin the scan ritual for spending points on a reward
    pub fn start_redemption(&mut self, reward_id: u32) -> Result<RitualProgress, SessionError> {
        let result = self.redemption_eligibility(reward_id);
        self.begin_or_reject(RitualKind::Redemption, reward_id, result)
    }

    /// Returns (subject name, points to credit)
    fn check_in_eligibility(&self, restaurant_id: u32) -> Result<(String, u32), SessionError> {
        self.ensure_idle()?;
        let restaurant = self
            .catalog
            .restaurant(restaurant_id)
            .ok_or(SessionError::UnknownRestaurant(restaurant_id))?;
        if self.ledger.has_visited(restaurant_id) {
            return Err(SessionError::AlreadyVisited {
                restaurant_id,
                name: restaurant.name.clone(),
            });
        }
        Ok((restaurant.name.clone(), restaurant.point_value))
    }

    /// Returns (subject name, points to debit)
    fn redemption_eligibility(&self, reward_id: u32) -> Result<(String, u32), SessionError> {
        self.ensure_idle()?;
        let reward = self
            .catalog
            .reward(reward_id)
            .ok_or(SessionError::UnknownReward(reward_id))?;
        if reward.cost_points > self.ledger.balance() {
            return Err(SessionError::InsufficientBalance {
                reward_id,
                name: reward.name.clone(),
                required: reward.cost_points,
                available: self.ledger.balance(),
            });
        }
        Ok((reward.name.clone(), reward.cost_points))
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match &self.active {
            Some(active) => Err(SessionError::RitualInProgress {
                kind: active.ritual.kind(),
                subject_id: active.ritual.subject_id(),
            }),
            None => Ok(()),
        }
    }

    fn begin_or_reject(
        &mut self,
        kind: RitualKind,
        subject_id: u32,
        eligibility: Result<(String, u32), SessionError>,
    ) -> Result<RitualProgress, SessionError> {
        let (subject_name, amount) = match eligibility {
            Ok(found) => found,
            Err(e) => {
                warn!("{} for #{} rejected: {} [{}]", kind, subject_id, e, e.code());
                self.emit(SessionEvent::Rejected {
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let ritual = ConfirmationRitual::start(self.next_seq, kind, subject_id);
        self.next_seq += 1;
        let progress = ritual.progress_output();

        info!("{} ritual #{} started for {} ({} pts)", kind, progress.seq, subject_name, amount);
        self.emit(SessionEvent::RitualStarted {
            progress,
            subject_name: subject_name.clone(),
        });
        self.active = Some(ActiveRitual {
            ritual,
            subject_name,
            amount,
        });
        Ok(progress)
    }

    // =========================================================================
    // TICK / CANCEL
    // =========================================================================

    /// Deliver one clock tick to whatever ritual is active
    pub fn tick(&mut self) -> Result<Option<RitualProgress>, SessionError> {
        match self.active_seq() {
            Some(seq) => self.tick_ritual(seq),
            None => Ok(None),
        }
    }

    /// Deliver one clock tick, but only if ritual `seq` is still the active one.
    ///
    /// A completing tick applies the ledger effect before returning. A
    /// ledger failure at that point is an `InvariantViolation`.
    pub fn tick_ritual(&mut self, seq: u64) -> Result<Option<RitualProgress>, SessionError> {
        let progress = match self.active.as_mut() {
            Some(active) if active.ritual.seq() == seq => active.ritual.tick(),
            _ => None,
        };
        let Some(progress) = progress else {
            return Ok(None);
        };

        debug!("ritual #{} tick: {}s left", seq, progress.remaining_secs);
        if progress.status == RitualStatus::Completed {
            if let Some(active) = self.active.take() {
                self.apply_completion(active, progress)?;
            }
        } else {
            self.emit(SessionEvent::RitualTick { progress });
        }
        Ok(Some(progress))
    }

    /// Cancel the running ritual. No-op (None) when nothing is running.
    pub fn cancel_active_ritual(&mut self) -> Option<RitualProgress> {
        let mut active = self.active.take()?;
        if !active.ritual.cancel() {
            return None;
        }
        let progress = active.ritual.progress_output();
        info!(
            "{} ritual #{} for {} cancelled with {}s left",
            progress.kind, progress.seq, active.subject_name, progress.remaining_secs
        );
        self.emit(SessionEvent::RitualCancelled {
            kind: progress.kind,
            subject_id: progress.subject_id,
            remaining_secs: progress.remaining_secs,
        });
        Some(progress)
    }

    /// The completing tick is only announced once the ledger accepted the effect
    fn apply_completion(
        &mut self,
        active: ActiveRitual,
        last_tick: RitualProgress,
    ) -> Result<(), SessionError> {
        let kind = active.ritual.kind();
        let subject_id = active.ritual.subject_id();

        let applied = match kind {
            RitualKind::CheckIn => self.ledger.credit(subject_id, active.amount),
            RitualKind::Redemption => self.ledger.debit(active.amount),
        };
        let balance = applied.map_err(|source| invariant_violation(kind, subject_id, source))?;
        self.persist();
        self.emit(SessionEvent::RitualTick { progress: last_tick });

        let event = match kind {
            RitualKind::CheckIn => SessionEvent::CheckInCompleted {
                restaurant_id: subject_id,
                restaurant_name: active.subject_name,
                points_earned: active.amount,
                balance,
                at: Utc::now(),
            },
            RitualKind::Redemption => SessionEvent::RedemptionCompleted {
                reward_id: subject_id,
                reward_name: active.subject_name,
                points_spent: active.amount,
                balance,
                at: Utc::now(),
            },
        };
        info!("{} for #{} completed, balance now {}", kind, subject_id, balance);
        self.emit(event);
        Ok(())
    }

    /// Write the ledger after a successful mutation. The in-memory ledger
    /// stays authoritative if the write fails.
    fn persist(&self) {
        let Some(path) = &self.store_path else {
            return;
        };
        if let Err(e) = save_record(&self.ledger.to_record(), path) {
            warn!("failed to save ledger to {}: {}", path.display(), e);
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read-only view of the ledger
    pub fn ledger(&self) -> &LoyaltyLedger {
        &self.ledger
    }

    pub fn balance(&self) -> u32 {
        self.ledger.balance()
    }

    pub fn active_ritual(&self) -> Option<&ConfirmationRitual> {
        self.active.as_ref().map(|a| &a.ritual)
    }

    pub fn active_seq(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.ritual.seq())
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            balance: self.ledger.balance(),
            visited_count: self.ledger.visited().len(),
            total_restaurants: self.catalog.restaurants().len(),
        }
    }
}

fn invariant_violation(kind: RitualKind, subject_id: u32, source: LedgerError) -> SessionError {
    let err = SessionError::InvariantViolation {
        kind,
        subject_id,
        source,
    };
    error!("DEFECT: {} [{}]", err, err.code());
    err
}

// =============================================================================
// TESTS
// =============================================================================
