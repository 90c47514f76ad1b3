//! Loyalty Ledger: point balance and visited-location set
//!
//! Only two mutations exist:
//! - credit(restaurant_id, amount): first visit only, balance goes up
//! - debit(amount): never below zero
//!
//! Both are all-or-nothing. A failed call leaves balance and visited set
//! exactly as they were.

use std::collections::BTreeSet;

use crate::types::{LedgerError, LedgerRecord};

/// Authoritative holder of points and visits for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoyaltyLedger {
    balance_points: u32,
    visited_ids: BTreeSet<u32>,
}

impl Default for LoyaltyLedger {
    fn default() -> Self {
        Self::new(0, [])
    }
}

impl LoyaltyLedger {
    /// Create a ledger with an initial balance and pre-seeded visits
    pub fn new(balance_points: u32, visited: impl IntoIterator<Item = u32>) -> Self {
        Self {
            balance_points,
            visited_ids: visited.into_iter().collect(),
        }
    }

    /// Restore from a persisted record
    pub fn from_record(record: &LedgerRecord) -> Self {
        Self::new(record.balance_points, record.visited_ids.iter().copied())
    }

    /// Flatten into a persistable record
    pub fn to_record(&self) -> LedgerRecord {
        LedgerRecord::new(self.balance_points, self.visited_ids.clone())
    }

    /// Credit a first visit. Re-crediting the same id fails for the life of the ledger.
    pub fn credit(&mut self, restaurant_id: u32, amount: u32) -> Result<u32, LedgerError> {
        if self.visited_ids.contains(&restaurant_id) {
            return Err(LedgerError::AlreadyVisited { restaurant_id });
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let balance = self
            .balance_points
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.balance_points,
                amount,
            })?;

        self.visited_ids.insert(restaurant_id);
        self.balance_points = balance;
        Ok(balance)
    }

    /// Spend points, returns the new balance
    pub fn debit(&mut self, amount: u32) -> Result<u32, LedgerError> {
        if amount > self.balance_points {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: self.balance_points,
            });
        }
        self.balance_points -= amount;
        Ok(self.balance_points)
    }

    pub fn has_visited(&self, restaurant_id: u32) -> bool {
        self.visited_ids.contains(&restaurant_id)
    }

    pub fn balance(&self) -> u32 {
        self.balance_points
    }

    /// Visited restaurant ids (ascending)
    pub fn visited(&self) -> &BTreeSet<u32> {
        &self.visited_ids
    }

    /// Points still missing to afford `cost` (0 if affordable)
    pub fn shortfall(&self, cost: u32) -> u32 {
        cost.saturating_sub(self.balance_points)
    }
}

// =============================================================================
// TESTS
// =============================================================================
