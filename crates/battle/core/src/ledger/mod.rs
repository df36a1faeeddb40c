//! Resource ledger for variants with spendable per-combatant resources.
//!
//! Balances are kept inside `[min, max]` at all times. Spending is two-step:
//! [`ResourceLedger::reserve`] hands out a move-only [`ClaimToken`] that must
//! be either committed or released. The scheduler releases every outstanding
//! reservation when a resolving phase ends, so a claim never outlives the
//! action that made it.

mod error;

pub use error::LedgerError;

use indexmap::IndexMap;

use crate::combatant::CombatantId;
use crate::policy::{OverflowMode, ResourceModel};

/// Balance of one combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerEntry {
    pub combatant: CombatantId,
    pub balance: i32,
    pub min: i32,
    pub max: i32,
}

impl LedgerEntry {
    /// Keeps `balance` inside `[min, max]`; the floor wins if the bounds cross.
    fn bound(&self, balance: i32) -> i32 {
        balance.min(self.max).max(self.min)
    }
}

/// Proof of a reservation. Consumed by `commit` or `release`.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be committed or released"]
pub struct ClaimToken {
    id: u64,
    combatant: CombatantId,
    amount: i32,
}

impl ClaimToken {
    pub fn combatant(&self) -> CombatantId {
        self.combatant
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Reservation {
    id: u64,
    combatant: CombatantId,
    amount: i32,
}

/// Final balance of a combatant after the carry-over rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettledBalance {
    pub combatant: CombatantId,
    pub balance: i32,
}

/// Per-battle resource ledger.
#[derive(Clone, Debug)]
pub struct ResourceLedger {
    model: ResourceModel,
    entries: IndexMap<CombatantId, LedgerEntry>,
    reservations: Vec<Reservation>,
    next_claim: u64,
}

impl ResourceLedger {
    pub fn new(model: ResourceModel) -> Self {
        Self {
            model,
            entries: IndexMap::new(),
            reservations: Vec::new(),
            next_claim: 0,
        }
    }

    pub fn model(&self) -> &ResourceModel {
        &self.model
    }

    /// Opens an entry at the model's initial balance. Re-opening is a no-op.
    pub fn open(&mut self, combatant: CombatantId) -> &LedgerEntry {
        let initial = self.model.initial;
        self.open_with(combatant, initial)
    }

    /// Opens an entry with a carried-in balance (clamped).
    pub fn open_with(&mut self, combatant: CombatantId, balance: i32) -> &LedgerEntry {
        let model = &self.model;
        self.entries.entry(combatant).or_insert_with(|| LedgerEntry {
            combatant,
            balance: model.clamp(balance),
            min: model.min,
            max: model.max,
        })
    }

    pub fn entry(&self, combatant: CombatantId) -> Option<&LedgerEntry> {
        self.entries.get(&combatant)
    }

    pub fn balance(&self, combatant: CombatantId) -> Option<i32> {
        self.entries.get(&combatant).map(|entry| entry.balance)
    }

    /// Sum of outstanding reservations for a combatant.
    pub fn reserved(&self, combatant: CombatantId) -> i32 {
        saturate(self.reserved_wide(combatant))
    }

    /// Balance minus outstanding reservations.
    pub fn available(&self, combatant: CombatantId) -> Option<i32> {
        self.balance(combatant)
            .map(|balance| saturate(i64::from(balance) - self.reserved_wide(combatant)))
    }

    /// Sets `amount` aside for a later commit.
    ///
    /// Fails with [`LedgerError::InsufficientResource`] when the balance left
    /// after every outstanding reservation and this one would drop below the
    /// floor.
    pub fn reserve(
        &mut self,
        combatant: CombatantId,
        amount: u32,
    ) -> Result<ClaimToken, LedgerError> {
        let entry = self
            .entries
            .get(&combatant)
            .ok_or(LedgerError::UnknownCombatant { combatant })?;
        let available = i64::from(entry.balance) - self.reserved_wide(combatant);
        let insufficient = LedgerError::InsufficientResource {
            combatant,
            requested: amount,
            available: saturate(available),
            floor: entry.min,
        };

        // A single reservation must fit the balance type.
        let Ok(amount_i32) = i32::try_from(amount) else {
            return Err(insufficient);
        };
        if available - i64::from(amount) < i64::from(entry.min) {
            return Err(insufficient);
        }

        let id = self.next_claim;
        self.next_claim += 1;
        let amount = amount_i32;
        self.reservations.push(Reservation {
            id,
            combatant,
            amount,
        });

        Ok(ClaimToken {
            id,
            combatant,
            amount,
        })
    }

    /// Applies a reservation. Returns the new balance.
    pub fn commit(&mut self, token: ClaimToken) -> Result<i32, LedgerError> {
        let reservation = self.take_reservation(token.id)?;
        let entry = self
            .entries
            .get_mut(&reservation.combatant)
            .ok_or(LedgerError::UnknownCombatant {
                combatant: reservation.combatant,
            })?;
        let spent = i64::from(entry.balance) - i64::from(reservation.amount);
        entry.balance = entry.bound(saturate(spent));
        Ok(entry.balance)
    }

    /// Drops a reservation without touching the balance.
    pub fn release(&mut self, token: ClaimToken) -> Result<(), LedgerError> {
        self.take_reservation(token.id).map(|_| ())
    }

    /// Drops every outstanding reservation. Returns how many were dropped.
    pub fn release_outstanding(&mut self) -> usize {
        let count = self.reservations.len();
        self.reservations.clear();
        count
    }

    /// Adds to a balance (refunds, "default" actions).
    ///
    /// Going past `max` either fails or clamps, depending on `mode`.
    pub fn credit(
        &mut self,
        combatant: CombatantId,
        amount: u32,
        mode: OverflowMode,
    ) -> Result<i32, LedgerError> {
        let entry = self
            .entries
            .get_mut(&combatant)
            .ok_or(LedgerError::UnknownCombatant { combatant })?;
        let target = i64::from(entry.balance) + i64::from(amount);

        if target > i64::from(entry.max) && mode == OverflowMode::Reject {
            return Err(LedgerError::Overflow {
                combatant,
                amount,
                balance: entry.balance,
                max: entry.max,
            });
        }

        entry.balance = entry.bound(saturate(target));
        Ok(entry.balance)
    }

    /// Applies round regeneration to every entry.
    pub fn regenerate(&mut self, amount: i32) {
        for entry in self.entries.values_mut() {
            entry.balance = entry.bound(entry.balance.saturating_add(amount));
        }
    }

    /// Balance after `rounds` more round boundaries, assuming no spending.
    pub fn projected_balance(&self, combatant: CombatantId, rounds: u64) -> Option<i32> {
        let entry = self.entries.get(&combatant)?;
        let mut balance = entry.balance;
        for _ in 0..rounds {
            balance = entry.bound(balance.saturating_add(self.model.regen_per_round));
        }
        Some(balance)
    }

    /// Applies the carry-over rule to every balance and tears the ledger down.
    pub fn settle(self) -> Vec<SettledBalance> {
        let rule = self.model.carry_over;
        let initial = self.model.initial;
        self.entries
            .into_values()
            .map(|entry| SettledBalance {
                combatant: entry.combatant,
                balance: rule.settle(entry.balance, initial),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reserved_wide(&self, combatant: CombatantId) -> i64 {
        self.reservations
            .iter()
            .filter(|r| r.combatant == combatant)
            .map(|r| i64::from(r.amount))
            .sum()
    }

    fn take_reservation(&mut self, id: u64) -> Result<Reservation, LedgerError> {
        let index = self
            .reservations
            .iter()
            .position(|r| r.id == id)
            .ok_or(LedgerError::UnknownClaim { claim: id })?;
        Ok(self.reservations.remove(index))
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
