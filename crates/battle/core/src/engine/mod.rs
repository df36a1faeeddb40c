//! Turn-order scheduler.
//!
//! The [`Scheduler`] owns the turn queue, the acting entry and, for variants
//! with a spendable resource, the resource ledger. It is a synchronous state
//! machine:
//!
//! ```text
//! Idle → Generating → AwaitingAction → Resolving → (Generating | AwaitingAction | BattleEnded)
//! ```
//!
//! The only suspension point is `AwaitingAction`: the scheduler waits for an
//! [`ActionSubmission`] from whoever drives the battle. Every committed queue
//! mutation is reported to the registered [`QueueObserver`]s.

mod errors;
mod forecast;
mod generation;
mod mutation;
mod observer;
mod resolve;

pub use errors::SchedulerError;
pub use mutation::RemovalReason;
pub use observer::{QueueEvent, QueueObserver, QueueSnapshot};
pub use resolve::{ActionSubmission, Resolution, SpendOutcome};

use indexmap::IndexMap;

use crate::combatant::{CombatantId, CombatantSnapshot, Side};
use crate::config::SchedulerConfig;
use crate::ledger::{ResourceLedger, SettledBalance};
use crate::policy::SchedulerPolicy;
use crate::queue::{TurnEntry, TurnQueue};
use crate::stats::JitterPolicy;

use generation::PassCursor;

const TARGET: &str = "battle_core::scheduler";

/// Scheduler state.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Constructed, battle not started.
    #[default]
    Idle,
    /// Building the next round (or side phase) of entries.
    Generating,
    /// The head entry's combatant is deciding.
    AwaitingAction,
    /// Applying a submitted action to the queue and ledger.
    Resolving,
    BattleEnded,
}

impl Phase {
    /// Phases in which the battle is running.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            Phase::Generating | Phase::AwaitingAction | Phase::Resolving
        )
    }

    pub const fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Generating)
                | (Phase::Generating, Phase::AwaitingAction)
                | (Phase::AwaitingAction, Phase::Resolving | Phase::Generating)
                | (Phase::Resolving, Phase::Generating | Phase::AwaitingAction)
                | (
                    Phase::Idle | Phase::Generating | Phase::AwaitingAction | Phase::Resolving,
                    Phase::BattleEnded
                )
        )
    }
}

/// Why a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndReason {
    /// A side that took part has no living combatant left.
    SideDefeated { side: Side },
    /// Every combatant of a side left the battle, the last one by fleeing.
    /// Nobody wins.
    Fled { side: Side },
    /// Cancelled from outside (abort, fatal error).
    Aborted,
    /// Ended by the battle-flow controller.
    Concluded,
}

/// Summary returned by [`Scheduler::end_battle`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleReport {
    pub rounds: u64,
    pub turns_taken: u64,
    pub reason: EndReason,
    /// Only side still standing, if exactly one is.
    pub winner: Option<Side>,
    /// Resource balances after the carry-over rule. Empty without a ledger.
    pub balances: Vec<SettledBalance>,
}

/// One battle's turn order.
pub struct Scheduler {
    config: SchedulerConfig,
    policy: SchedulerPolicy,
    jitter: Box<dyn JitterPolicy>,
    observers: Vec<Box<dyn QueueObserver>>,
    phase: Phase,
    roster: IndexMap<CombatantId, CombatantSnapshot>,
    sides_in_play: Vec<Side>,
    /// Side of the most recent combatant to flee.
    last_fled: Option<Side>,
    queue: TurnQueue,
    current: Option<TurnEntry>,
    ledger: Option<ResourceLedger>,
    carried_balances: Vec<SettledBalance>,
    /// Action speed chosen by a submission, used by that combatant's next
    /// generated entry.
    pending_speed: IndexMap<CombatantId, i32>,
    cursor: PassCursor,
    turns_taken: u64,
    end_reason: Option<EndReason>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, policy: SchedulerPolicy) -> Self {
        let jitter: Box<dyn JitterPolicy> = Box::new(policy.jitter);
        Self {
            config,
            policy,
            jitter,
            observers: Vec::new(),
            phase: Phase::Idle,
            roster: IndexMap::new(),
            sides_in_play: Vec::new(),
            last_fled: None,
            queue: TurnQueue::new(),
            current: None,
            ledger: None,
            carried_balances: Vec::new(),
            pending_speed: IndexMap::new(),
            cursor: PassCursor::START,
            turns_taken: 0,
            end_reason: None,
        }
    }

    /// Replaces the policy's built-in jitter with a custom strategy.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Box<dyn JitterPolicy>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Opens ledger entries with balances settled at the end of an earlier
    /// battle instead of the model's initial balance.
    #[must_use]
    pub fn with_carried_balances(mut self, balances: Vec<SettledBalance>) -> Self {
        self.carried_balances = balances;
        self
    }

    pub fn subscribe(&mut self, observer: Box<dyn QueueObserver>) {
        self.observers.push(observer);
    }

    /// Validates the roster, opens the ledger and generates the first round.
    ///
    /// On success the scheduler is in [`Phase::AwaitingAction`] with the
    /// fastest combatant at the head (or in [`Phase::BattleEnded`] if a side
    /// was already wiped out).
    pub fn start_battle(
        &mut self,
        roster: impl IntoIterator<Item = CombatantSnapshot>,
    ) -> Result<(), SchedulerError> {
        self.require_phase(Phase::Idle)?;
        if let Some(model) = &self.policy.resource_model {
            model.validate()?;
        }

        let snapshots: Vec<CombatantSnapshot> = roster.into_iter().collect();
        if snapshots.is_empty() {
            return Err(SchedulerError::NoCombatants);
        }
        if snapshots.len() > SchedulerConfig::MAX_COMBATANTS {
            return Err(SchedulerError::TooManyCombatants {
                count: snapshots.len(),
                max: SchedulerConfig::MAX_COMBATANTS,
            });
        }

        let mut roster = IndexMap::with_capacity(snapshots.len());
        for snapshot in snapshots {
            if roster.contains_key(&snapshot.id) {
                return Err(SchedulerError::DuplicateCombatant {
                    combatant: snapshot.id,
                });
            }
            roster.insert(snapshot.id, snapshot);
        }

        let carried = std::mem::take(&mut self.carried_balances);
        self.ledger = self.policy.resource_model.clone().map(|model| {
            let mut ledger = ResourceLedger::new(model);
            for carry in carried.iter().filter(|c| roster.contains_key(&c.combatant)) {
                ledger.open_with(carry.combatant, carry.balance);
            }
            for id in roster.keys() {
                ledger.open(*id);
            }
            ledger
        });

        for snapshot in roster.values() {
            if !self.sides_in_play.contains(&snapshot.side) {
                self.sides_in_play.push(snapshot.side);
            }
        }
        self.roster = roster;

        tracing::info!(
            target: TARGET,
            combatants = self.roster.len(),
            seed = self.config.battle_seed,
            side_locking = self.policy.side_locking.is_some(),
            resources = self.ledger.is_some(),
            "battle started"
        );

        self.transition(Phase::Generating)?;
        if self.check_battle_over() {
            return Ok(());
        }
        self.regenerate()?;
        self.promote_head()
    }

    /// Ends the battle immediately from any state, discarding an in-progress
    /// decision and any outstanding reservation.
    pub fn abort(&mut self) {
        if self.phase == Phase::BattleEnded {
            return;
        }
        self.finish(EndReason::Aborted);
    }

    /// Tears down the queue and ledger and reports the outcome.
    ///
    /// Ends the battle first if it is still running.
    pub fn end_battle(&mut self) -> Result<BattleReport, SchedulerError> {
        if self.phase == Phase::Idle {
            return Err(SchedulerError::invalid_phase(
                Phase::AwaitingAction,
                Phase::Idle,
            ));
        }
        if self.phase != Phase::BattleEnded {
            self.finish(EndReason::Concluded);
        }

        self.queue.clear();
        self.pending_speed.clear();
        let balances = self
            .ledger
            .take()
            .map(ResourceLedger::settle)
            .unwrap_or_default();

        let report = BattleReport {
            rounds: self.cursor.round,
            turns_taken: self.turns_taken,
            reason: self.end_reason.unwrap_or(EndReason::Concluded),
            winner: self.winner(),
            balances,
        };
        tracing::info!(
            target: TARGET,
            rounds = report.rounds,
            turns = report.turns_taken,
            winner = ?report.winner,
            "battle torn down"
        );
        Ok(report)
    }

    // ===== accessors =====

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current round, starting at 1 once the battle has begun.
    pub fn round(&self) -> u64 {
        self.cursor.round
    }

    /// Number of generation passes so far.
    pub fn generation(&self) -> u64 {
        self.cursor.generation
    }

    /// Side holding the current phase when side locking is on.
    pub fn active_side(&self) -> Option<Side> {
        self.cursor.side
    }

    pub fn ledger(&self) -> Option<&ResourceLedger> {
        self.ledger.as_ref()
    }

    pub fn roster(&self) -> &IndexMap<CombatantId, CombatantSnapshot> {
        &self.roster
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantSnapshot> {
        self.roster.get(&id)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn policy(&self) -> &SchedulerPolicy {
        &self.policy
    }

    pub fn turns_taken(&self) -> u64 {
        self.turns_taken
    }

    /// Entries waiting behind the current head.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// True when no living combatant fights for `side`.
    pub fn is_side_defeated(&self, side: Side) -> bool {
        !self
            .roster
            .values()
            .any(|snapshot| snapshot.side == side && snapshot.alive)
    }

    /// Sides with at least one living combatant.
    pub fn living_sides(&self) -> Vec<Side> {
        [Side::Party, Side::Troop]
            .into_iter()
            .filter(|side| !self.is_side_defeated(*side))
            .collect()
    }

    // ===== internals =====

    fn is_live(&self, combatant: CombatantId) -> bool {
        self.roster
            .get(&combatant)
            .is_some_and(|snapshot| snapshot.alive)
    }

    fn winner(&self) -> Option<Side> {
        if matches!(self.end_reason, Some(EndReason::Fled { .. })) {
            return None;
        }
        match self.living_sides().as_slice() {
            [side] => Some(*side),
            _ => None,
        }
    }

    fn require_phase(&self, expected: Phase) -> Result<(), SchedulerError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SchedulerError::invalid_phase(expected, self.phase))
        }
    }

    fn transition(&mut self, next: Phase) -> Result<(), SchedulerError> {
        if self.phase == next {
            return Ok(());
        }
        if !self.phase.can_transition_to(next) {
            tracing::error!(
                target: TARGET,
                from = %self.phase,
                to = %next,
                "illegal phase transition"
            );
            return Err(SchedulerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!(target: TARGET, from = %self.phase, to = %next, "phase transition");
        self.phase = next;
        Ok(())
    }

    fn emit(&mut self, event: QueueEvent) {
        tracing::trace!(target: TARGET, ?event, "queue changed");
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.on_queue_changed(&event, &snapshot);
        }
    }

    /// Moves the battle forward after the acting entry is gone: next head,
    /// regeneration, or the end of the battle.
    fn advance(&mut self) -> Result<(), SchedulerError> {
        if self.check_battle_over() {
            return Ok(());
        }
        if let Some(entry) = self.pop_live() {
            return self.make_current(entry);
        }
        self.transition(Phase::Generating)?;
        self.regenerate()?;
        self.promote_head()
    }

    /// Pops the head, silently dropping entries of combatants that are gone.
    fn pop_live(&mut self) -> Option<TurnEntry> {
        while let Ok(entry) = self.queue.pop_next() {
            if self.is_live(entry.combatant) {
                return Some(entry);
            }
            tracing::debug!(
                target: TARGET,
                combatant = %entry.combatant,
                kind = %entry.kind,
                "dropped entry of a combatant no longer in battle"
            );
        }
        None
    }

    fn promote_head(&mut self) -> Result<(), SchedulerError> {
        let entry = self.pop_live().ok_or(SchedulerError::EmptyQueue)?;
        self.make_current(entry)
    }

    fn make_current(&mut self, entry: TurnEntry) -> Result<(), SchedulerError> {
        let head = entry.view();
        self.current = Some(entry);
        self.transition(Phase::AwaitingAction)?;
        tracing::debug!(
            target: TARGET,
            combatant = %head.combatant,
            kind = %head.kind,
            priority = %head.priority,
            round = self.cursor.round,
            "turn started"
        );
        self.emit(QueueEvent::HeadChanged { head: Some(head) });
        Ok(())
    }

    /// Ends the battle if a side that took part has been wiped out.
    ///
    /// A side emptied by a flee, with no defeated member left behind, ends
    /// the battle as [`EndReason::Fled`].
    fn check_battle_over(&mut self) -> bool {
        let defeated = self
            .sides_in_play
            .iter()
            .copied()
            .find(|side| self.is_side_defeated(*side));
        let Some(side) = defeated else {
            return false;
        };

        let deserted = !self.roster.values().any(|snapshot| snapshot.side == side);
        let reason = if deserted && self.last_fled == Some(side) {
            EndReason::Fled { side }
        } else {
            EndReason::SideDefeated { side }
        };
        self.finish(reason);
        true
    }

    fn finish(&mut self, reason: EndReason) {
        self.current = None;
        self.queue.clear();
        if let Some(ledger) = self.ledger.as_mut() {
            ledger.release_outstanding();
        }
        tracing::trace!(
            target: TARGET,
            from = %self.phase,
            to = %Phase::BattleEnded,
            "phase transition"
        );
        self.phase = Phase::BattleEnded;
        self.end_reason = Some(reason);
        tracing::info!(target: TARGET, ?reason, round = self.cursor.round, "battle ended");
        self.emit(QueueEvent::BattleEnded { reason });
    }
}
