//! Generation passes.
//!
//! A pass builds one Normal entry per eligible combatant: every living
//! combatant without side locking, the holding side's combatants with it.
//! The same planning function backs both real regeneration and the
//! projections used by `forecast`, so a projection is exactly what the next
//! real pass will produce unless something changes in between.

use indexmap::IndexMap;

use super::{QueueEvent, Scheduler, SchedulerError, TARGET};
use crate::combatant::{CombatantId, Side};
use crate::config::SchedulerConfig;
use crate::policy::SideLock;
use crate::queue::{TurnEntry, TurnKind};
use crate::stats::jitter::context;
use crate::stats::{SpeedModel, compute_seed};

/// Position of the battle in its sequence of generation passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct PassCursor {
    pub round: u64,
    pub generation: u64,
    pub side: Option<Side>,
    /// Set when this pass opens a round that is not the battle's first.
    pub regen_due: bool,
}

impl PassCursor {
    pub const START: Self = Self {
        round: 0,
        generation: 0,
        side: None,
        regen_due: false,
    };

    /// Cursor of the pass that follows this one.
    pub fn next(self, lock: Option<&SideLock>) -> Self {
        let generation = self.generation + 1;
        let new_round = Self {
            round: self.round + 1,
            generation,
            side: None,
            regen_due: self.round > 0,
        };

        match (lock, self.side) {
            (None, _) => new_round,
            (Some(lock), None) => Self {
                side: Some(lock.leading),
                ..new_round
            },
            (Some(lock), Some(side)) => {
                let next = side.opponent();
                if next == lock.leading {
                    Self {
                        side: Some(next),
                        ..new_round
                    }
                } else {
                    Self {
                        round: self.round,
                        generation,
                        side: Some(next),
                        regen_due: false,
                    }
                }
            }
        }
    }
}

/// Outcome of planning one pass.
#[derive(Debug)]
pub(super) struct PassPlan {
    /// Entries in queue order.
    pub entries: Vec<TurnEntry>,
    /// Combatants sitting the pass out for resource debt.
    pub skipped: Vec<CombatantId>,
}

impl Scheduler {
    /// Builds the entries of one pass without touching any state.
    ///
    /// `sequence` is advanced once per entry. Ledger balances are projected
    /// forward by the number of round boundaries between the scheduler's
    /// cursor and `cursor`.
    pub(super) fn plan_pass(
        &self,
        cursor: PassCursor,
        sequence: &mut u64,
        pending_speed: &IndexMap<CombatantId, i32>,
    ) -> PassPlan {
        let rounds_ahead = cursor.round.saturating_sub(self.cursor.round);
        let debt_ledger = self
            .ledger
            .as_ref()
            .filter(|ledger| ledger.model().skip_while_in_debt);

        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for snapshot in self.roster.values() {
            if !snapshot.alive || cursor.side.is_some_and(|side| side != snapshot.side) {
                continue;
            }
            if let Some(ledger) = debt_ledger {
                let balance = ledger.projected_balance(snapshot.id, rounds_ahead);
                if balance.is_some_and(|balance| balance < 0) {
                    skipped.push(snapshot.id);
                    continue;
                }
            }

            let action_speed = pending_speed.get(&snapshot.id).copied().unwrap_or(0);
            let seed = compute_seed(
                self.config.battle_seed,
                cursor.generation,
                snapshot.id,
                context::GENERATION,
            );
            let jitter = self
                .jitter
                .jitter(SpeedModel::effective_agility(snapshot), seed);

            entries.push(TurnEntry {
                combatant: snapshot.id,
                side: snapshot.side,
                priority: SpeedModel::compute_priority(snapshot, action_speed, jitter),
                kind: TurnKind::Normal,
                sequence: *sequence,
                generation: cursor.generation,
                jitter,
                action_speed,
            });
            *sequence += 1;
        }

        entries.sort_by(TurnEntry::cmp_order);
        PassPlan { entries, skipped }
    }

    /// Fills the empty queue with the next pass that has at least one entry.
    ///
    /// Passes in which nobody is eligible (a side with no living members, or
    /// everyone skipping for debt) are stepped over. Fails with
    /// [`SchedulerError::EmptyQueue`] when nobody is alive or too many passes
    /// in a row come up empty.
    pub(super) fn regenerate(&mut self) -> Result<(), SchedulerError> {
        if !self.roster.values().any(|snapshot| snapshot.alive) {
            tracing::error!(target: TARGET, "no living combatant left to schedule");
            return Err(SchedulerError::EmptyQueue);
        }

        for _ in 0..SchedulerConfig::MAX_IDLE_PASSES {
            let cursor = self.cursor.next(self.policy.side_locking.as_ref());
            if cursor.regen_due {
                if let Some(ledger) = self.ledger.as_mut() {
                    let regen = ledger.model().regen_per_round;
                    ledger.regenerate(regen);
                }
            }
            self.cursor = cursor;

            let mut sequence = self.queue.peek_sequence();
            let plan = self.plan_pass(cursor, &mut sequence, &self.pending_speed);
            self.queue.advance_sequence_to(sequence);

            for entry in &plan.entries {
                self.pending_speed.shift_remove(&entry.combatant);
            }
            for combatant in &plan.skipped {
                tracing::debug!(
                    target: TARGET,
                    combatant = %combatant,
                    round = cursor.round,
                    "turn skipped for resource debt"
                );
                self.emit(QueueEvent::TurnSkipped {
                    combatant: *combatant,
                    round: cursor.round,
                });
            }

            if plan.entries.is_empty() {
                tracing::trace!(
                    target: TARGET,
                    round = cursor.round,
                    side = ?cursor.side,
                    "generation pass produced no entries"
                );
                continue;
            }

            let stale = self.queue.clear_ordered();
            if !stale.is_empty() {
                tracing::debug!(
                    target: TARGET,
                    dropped = stale.len(),
                    "stale entries dropped by regeneration"
                );
            }

            let count = plan.entries.len();
            for entry in plan.entries {
                self.queue.insert(entry);
            }
            tracing::debug!(
                target: TARGET,
                round = cursor.round,
                generation = cursor.generation,
                side = ?cursor.side,
                entries = count,
                "turn order generated"
            );
            self.emit(QueueEvent::Regenerated {
                round: cursor.round,
                generation: cursor.generation,
                side: cursor.side,
                entries: count,
            });
            return Ok(());
        }

        tracing::error!(
            target: TARGET,
            passes = SchedulerConfig::MAX_IDLE_PASSES,
            "generation kept producing empty passes"
        );
        Err(SchedulerError::EmptyQueue)
    }
}
