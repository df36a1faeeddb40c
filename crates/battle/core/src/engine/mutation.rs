//! Mid-battle mutations driven from outside the scheduler.
//!
//! All of these are only accepted while a combatant is deciding
//! ([`Phase::AwaitingAction`]), which is the only point where the battle is
//! suspended.

use super::{Phase, QueueEvent, Scheduler, SchedulerError, TARGET};
use crate::combatant::{CombatantId, CombatantSnapshot};
use crate::config::SchedulerConfig;
use crate::policy::InterruptPriority;
use crate::queue::{TurnEntry, TurnKind};
use crate::stats::jitter::context;
use crate::stats::{SpeedModel, compute_seed};

/// Why a combatant's entries were invalidated.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum RemovalReason {
    /// Still in the roster, no longer alive.
    Defeated,
    /// Left the battle; dropped from the roster.
    Fled,
    /// Taken out by the engine for any other reason.
    Removed,
}

impl Scheduler {
    /// Refreshes a combatant's snapshot.
    ///
    /// A changed speed profile recomputes the priority of every entry the
    /// combatant holds (keeping their jitter and action speed) and moves the
    /// ordered ones. A snapshot that turned dead invalidates like
    /// [`Self::remove_combatant`] with [`RemovalReason::Defeated`].
    pub fn update_combatant(
        &mut self,
        snapshot: CombatantSnapshot,
    ) -> Result<(), SchedulerError> {
        self.require_phase(Phase::AwaitingAction)?;
        let id = snapshot.id;
        let previous = self
            .roster
            .get(&id)
            .ok_or(SchedulerError::UnknownCombatant { combatant: id })?;

        let was_alive = previous.alive;
        let speed_changed = previous.speed_differs(&snapshot);
        let alive = snapshot.alive;
        self.roster.insert(id, snapshot);

        if was_alive && !alive {
            return self.invalidate(id, RemovalReason::Defeated);
        }
        if !was_alive && alive {
            tracing::debug!(
                target: TARGET,
                combatant = %id,
                "combatant revived; acts next pass"
            );
            return Ok(());
        }
        if !speed_changed || !alive {
            return Ok(());
        }

        let Some(snapshot) = self.roster.get(&id) else {
            return Ok(());
        };
        let reprioritize = |entry: &TurnEntry| {
            SpeedModel::compute_priority(snapshot, entry.action_speed, entry.jitter)
        };

        let mut changed = self.queue.reorder_after_mutation(id, reprioritize);
        if let Some(current) = self.current.as_mut().filter(|entry| entry.combatant == id) {
            let priority = reprioritize(&*current);
            changed |= priority != current.priority;
            current.priority = priority;
        }

        if !changed {
            return Ok(());
        }
        let priority = self
            .current
            .iter()
            .chain(self.queue.iter())
            .find(|entry| entry.combatant == id)
            .map(|entry| entry.priority);
        if let Some(priority) = priority {
            tracing::debug!(
                target: TARGET,
                combatant = %id,
                priority = %priority,
                "speed changed; entries reordered"
            );
            self.emit(QueueEvent::Reordered {
                combatant: id,
                priority,
            });
        }
        Ok(())
    }

    /// Invalidates every entry of a combatant.
    ///
    /// If the combatant is the current actor its action is cancelled without
    /// side effects and the battle advances to the next head.
    pub fn remove_combatant(
        &mut self,
        id: CombatantId,
        reason: RemovalReason,
    ) -> Result<(), SchedulerError> {
        self.require_phase(Phase::AwaitingAction)?;
        let snapshot = self
            .roster
            .get_mut(&id)
            .ok_or(SchedulerError::UnknownCombatant { combatant: id })?;

        match reason {
            RemovalReason::Defeated => snapshot.alive = false,
            RemovalReason::Fled => {
                self.last_fled = Some(snapshot.side);
                self.roster.shift_remove(&id);
            }
            RemovalReason::Removed => {
                if self.last_fled == Some(snapshot.side) {
                    self.last_fled = None;
                }
                self.roster.shift_remove(&id);
            }
        }
        self.invalidate(id, reason)
    }

    /// Adds a combatant mid-battle. It first acts at the next generation pass.
    pub fn add_combatant(&mut self, snapshot: CombatantSnapshot) -> Result<(), SchedulerError> {
        self.require_phase(Phase::AwaitingAction)?;
        let id = snapshot.id;
        if self.roster.contains_key(&id) {
            return Err(SchedulerError::DuplicateCombatant { combatant: id });
        }
        if self.roster.len() >= SchedulerConfig::MAX_COMBATANTS {
            return Err(SchedulerError::TooManyCombatants {
                count: self.roster.len() + 1,
                max: SchedulerConfig::MAX_COMBATANTS,
            });
        }

        if let Some(ledger) = self.ledger.as_mut() {
            ledger.open(id);
        }
        if !self.sides_in_play.contains(&snapshot.side) {
            self.sides_in_play.push(snapshot.side);
        }
        tracing::info!(target: TARGET, combatant = %id, side = %snapshot.side, "combatant joined");
        self.roster.insert(id, snapshot);
        Ok(())
    }

    /// Forces an out-of-order action, e.g. from a status effect.
    ///
    /// With [`InterruptPriority::Preempt`] the forced entry becomes the head
    /// immediately and the preempted entry acts right after it. With
    /// [`InterruptPriority::Deferred`] it waits behind already pinned entries.
    pub fn force_action(&mut self, id: CombatantId) -> Result<(), SchedulerError> {
        self.require_phase(Phase::AwaitingAction)?;
        let forced = self.forced_entry(id)?;
        let view = forced.view();

        match self.policy.interrupt_priority {
            InterruptPriority::Preempt => {
                if let Some(preempted) = self.current.take() {
                    self.queue.push_front(preempted);
                }
                self.current = Some(forced);
                tracing::debug!(
                    target: TARGET,
                    combatant = %id,
                    "interrupt preempts current actor"
                );
                self.emit(QueueEvent::Inserted {
                    entry: view,
                    position: 0,
                });
                self.emit(QueueEvent::HeadChanged { head: Some(view) });
            }
            InterruptPriority::Deferred => {
                let position = self.queue.pinned_len() + usize::from(self.current.is_some());
                self.queue.push_pinned(forced);
                tracing::debug!(target: TARGET, combatant = %id, position, "interrupt queued");
                self.emit(QueueEvent::Inserted {
                    entry: view,
                    position,
                });
            }
        }
        Ok(())
    }

    /// Pushes a combatant's Normal turn behind every Normal entry of the
    /// current pass.
    ///
    /// Works on the current actor (who then yields the head) or on a queued
    /// entry. Delaying a turn that is already delayed, or a forced or extra
    /// turn, is rejected.
    pub fn delay_turn(&mut self, id: CombatantId) -> Result<(), SchedulerError> {
        self.require_phase(Phase::AwaitingAction)?;
        if !self.roster.contains_key(&id) {
            return Err(SchedulerError::UnknownCombatant { combatant: id });
        }

        let is_current = self
            .current
            .as_ref()
            .is_some_and(|entry| entry.combatant == id);

        if is_current {
            let entry = self
                .current
                .take_if(|entry| entry.kind == TurnKind::Normal)
                .ok_or(SchedulerError::CannotDelay { combatant: id })?;
            let delayed = entry.derive(TurnKind::Delayed, self.queue.next_sequence());
            let view = delayed.view();
            let position = self.queue.insert(delayed);
            tracing::debug!(target: TARGET, combatant = %id, "current actor delays turn");
            self.emit(QueueEvent::Inserted {
                entry: view,
                position,
            });
            return self.advance();
        }

        let entry = self
            .queue
            .take_first(|entry| entry.combatant == id && entry.kind == TurnKind::Normal)
            .ok_or(SchedulerError::CannotDelay { combatant: id })?;
        let delayed = entry.derive(TurnKind::Delayed, self.queue.next_sequence());
        let view = delayed.view();
        let position = self.queue.insert(delayed) + usize::from(self.current.is_some());
        tracing::debug!(target: TARGET, combatant = %id, position, "queued turn delayed");
        self.emit(QueueEvent::Inserted {
            entry: view,
            position,
        });
        Ok(())
    }

    /// Builds a Forced entry for a living combatant.
    pub(super) fn forced_entry(&mut self, id: CombatantId) -> Result<TurnEntry, SchedulerError> {
        let snapshot = self
            .roster
            .get(&id)
            .ok_or(SchedulerError::UnknownCombatant { combatant: id })?;
        if !snapshot.alive {
            return Err(SchedulerError::CombatantDefeated { combatant: id });
        }

        let sequence = self.queue.next_sequence();
        let seed = compute_seed(self.config.battle_seed, sequence, id, context::INTERRUPT);
        let jitter = self
            .jitter
            .jitter(SpeedModel::effective_agility(snapshot), seed);

        Ok(TurnEntry {
            combatant: id,
            side: snapshot.side,
            priority: SpeedModel::compute_priority(snapshot, 0, jitter),
            kind: TurnKind::Forced,
            sequence,
            generation: self.cursor.generation,
            jitter,
            action_speed: 0,
        })
    }

    /// Drops every entry of a combatant and cancels its turn if it is acting.
    fn invalidate(
        &mut self,
        id: CombatantId,
        reason: RemovalReason,
    ) -> Result<(), SchedulerError> {
        let removed = self.queue.remove_if(|entry| entry.combatant == id);
        self.pending_speed.shift_remove(&id);

        let cancelled = self.current.take_if(|entry| entry.combatant == id);
        let entries = removed.len() + usize::from(cancelled.is_some());

        tracing::debug!(
            target: TARGET,
            combatant = %id,
            %reason,
            entries,
            acting = cancelled.is_some(),
            "combatant entries invalidated"
        );
        if entries > 0 {
            self.emit(QueueEvent::Removed {
                combatant: id,
                entries,
                reason,
            });
        }

        if cancelled.is_some() {
            if let Some(ledger) = self.ledger.as_mut() {
                ledger.release_outstanding();
            }
            return self.advance();
        }
        self.check_battle_over();
        Ok(())
    }
}
