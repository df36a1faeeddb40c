//! Resolving a submitted action.
//!
//! Order of effects inside one resolution:
//! 1. speed override (recorded for the actor's next entries)
//! 2. resource gain
//! 3. resource spend (extra actions, placed right behind the actor)
//! 4. forced interrupt (a preempting one goes right behind the extras just
//!    claimed, so the spender keeps the initiative)
//! 5. the acting entry is consumed
//! 6. uncommitted reservations are released
//! 7. advance to the next head, regenerating at a round or side boundary

use super::{Phase, QueueEvent, Scheduler, SchedulerError, TARGET};
use crate::combatant::CombatantId;
use crate::config::SchedulerConfig;
use crate::ledger::LedgerError;
use crate::policy::InterruptPriority;
use crate::queue::{TurnEntry, TurnEntryView, TurnKind};
use crate::stats::SpeedModel;

/// What the acting combatant decided, as far as turn order cares.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionSubmission {
    pub actor: CombatantId,
    /// Extra actions claimed by spending the resource.
    #[cfg_attr(feature = "serde", serde(default))]
    pub resource_spend: u32,
    /// Resource credited to the actor (e.g. a "default" command).
    #[cfg_attr(feature = "serde", serde(default))]
    pub resource_gain: u32,
    /// Combatant forced to act out of order by this action.
    #[cfg_attr(feature = "serde", serde(default))]
    pub forces_interrupt: Option<CombatantId>,
    /// Action-specific speed used by the actor's next entries.
    #[cfg_attr(feature = "serde", serde(default))]
    pub speed_override: Option<i32>,
}

impl ActionSubmission {
    /// A plain single action.
    pub fn new(actor: CombatantId) -> Self {
        Self {
            actor,
            resource_spend: 0,
            resource_gain: 0,
            forces_interrupt: None,
            speed_override: None,
        }
    }

    #[must_use]
    pub fn with_resource_spend(mut self, claims: u32) -> Self {
        self.resource_spend = claims;
        self
    }

    #[must_use]
    pub fn with_resource_gain(mut self, amount: u32) -> Self {
        self.resource_gain = amount;
        self
    }

    #[must_use]
    pub fn forcing(mut self, target: CombatantId) -> Self {
        self.forces_interrupt = Some(target);
        self
    }

    #[must_use]
    pub fn with_speed_override(mut self, action_speed: i32) -> Self {
        self.speed_override = Some(action_speed);
        self
    }
}

/// Result of a resource spend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SpendOutcome {
    #[default]
    NotRequested,
    /// Extra entries were placed behind the actor.
    Granted { claims: u32, balance: i32 },
    /// The spend would cross the floor; the turn went ahead as one action.
    Rejected(LedgerError),
}

impl SpendOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, SpendOutcome::Granted { .. })
    }
}

/// Everything a resolution did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub actor: CombatantId,
    /// Kind of the entry that was consumed.
    pub consumed: TurnKind,
    pub spend: SpendOutcome,
    /// New balance after a gain, or why the gain was refused.
    pub gain: Option<Result<i32, LedgerError>>,
    pub interrupt: Option<TurnEntryView>,
    /// Head after advancing; `None` once the battle is over.
    pub next: Option<TurnEntryView>,
    pub phase: Phase,
}

impl Scheduler {
    /// Applies the current actor's decision and advances the queue.
    ///
    /// Everything that can be rejected is checked before the first mutation.
    /// A spend that would cross the resource floor is not an error: it is
    /// reported in [`Resolution::spend`] and the turn proceeds as a single
    /// action.
    pub fn submit(
        &mut self,
        submission: ActionSubmission,
    ) -> Result<Resolution, SchedulerError> {
        self.require_phase(Phase::AwaitingAction)?;
        let current = self.current.as_ref().map(|entry| entry.combatant);
        if current != Some(submission.actor) {
            return Err(SchedulerError::actor_not_current(submission.actor, current));
        }
        self.validate_submission(&submission)?;

        let entry = self
            .current
            .take()
            .ok_or(SchedulerError::actor_not_current(submission.actor, None))?;
        self.transition(Phase::Resolving)?;
        let actor = submission.actor;

        if let Some(action_speed) = submission.speed_override {
            self.pending_speed.insert(actor, action_speed);
        }

        let gain = (submission.resource_gain > 0)
            .then(|| self.credit_gain(actor, submission.resource_gain));

        let spend = if submission.resource_spend > 0 {
            self.claim_extra_actions(&entry, submission.resource_spend)?
        } else {
            SpendOutcome::NotRequested
        };

        let claimed = match &spend {
            SpendOutcome::Granted { claims, .. } => *claims as usize,
            _ => 0,
        };
        let interrupt = match submission.forces_interrupt {
            Some(target) => Some(self.queue_interrupt(target, claimed)?),
            None => None,
        };

        tracing::debug!(
            target: TARGET,
            combatant = %actor,
            kind = %entry.kind,
            extra = spend.is_granted(),
            interrupt = interrupt.is_some(),
            "turn resolved"
        );
        let consumed = entry.kind;

        if let Some(ledger) = self.ledger.as_mut() {
            let released = ledger.release_outstanding();
            if released > 0 {
                tracing::debug!(target: TARGET, released, "uncommitted reservations released");
            }
        }
        self.turns_taken += 1;

        self.advance()?;

        Ok(Resolution {
            actor,
            consumed,
            spend,
            gain,
            interrupt,
            next: self.current_head(),
            phase: self.phase,
        })
    }

    fn validate_submission(&self, submission: &ActionSubmission) -> Result<(), SchedulerError> {
        if let Some(target) = submission.forces_interrupt {
            let snapshot = self
                .roster
                .get(&target)
                .ok_or(SchedulerError::UnknownCombatant { combatant: target })?;
            if !snapshot.alive {
                return Err(SchedulerError::CombatantDefeated { combatant: target });
            }
        }

        if submission.resource_spend == 0 && submission.resource_gain == 0 {
            return Ok(());
        }
        let ledger = self
            .ledger
            .as_ref()
            .ok_or(SchedulerError::ResourcesDisabled)?;

        let max = ledger
            .model()
            .max_claims_per_turn
            .min(SchedulerConfig::MAX_CLAIMS_PER_SPEND);
        if submission.resource_spend > max {
            return Err(SchedulerError::TooManyClaims {
                requested: submission.resource_spend,
                max,
            });
        }
        Ok(())
    }

    fn credit_gain(&mut self, actor: CombatantId, amount: u32) -> Result<i32, LedgerError> {
        let Some(ledger) = self.ledger.as_mut() else {
            return Err(LedgerError::UnknownCombatant { combatant: actor });
        };
        let mode = ledger.model().overflow;
        let result = ledger.credit(actor, amount, mode);
        if let Err(err) = &result {
            tracing::debug!(target: TARGET, combatant = %actor, %err, "resource gain refused");
        }
        result
    }

    /// Reserves and commits the cost of `claims` extra actions, then places
    /// that many Extra entries at the front of the queue.
    ///
    /// Extra entries copy the acting entry's jitter, so they keep its
    /// initiative. A speed override recorded this resolution applies to them.
    fn claim_extra_actions(
        &mut self,
        entry: &TurnEntry,
        claims: u32,
    ) -> Result<SpendOutcome, SchedulerError> {
        let actor = entry.combatant;
        let Some(ledger) = self.ledger.as_mut() else {
            return Err(SchedulerError::ResourcesDisabled);
        };

        let cost = ledger.model().cost_of(claims);
        let token = match ledger.reserve(actor, cost) {
            Ok(token) => token,
            Err(err @ LedgerError::InsufficientResource { .. }) => {
                tracing::debug!(
                    target: TARGET,
                    combatant = %actor,
                    claims,
                    %err,
                    "extra action claim rejected"
                );
                return Ok(SpendOutcome::Rejected(err));
            }
            Err(err) => return Err(err.into()),
        };
        let balance = ledger.commit(token)?;

        let speed = self.pending_speed.get(&actor).copied();
        let snapshot = self.roster.get(&actor);
        let mut extras = Vec::with_capacity(claims as usize);
        for _ in 0..claims {
            let mut extra = entry.derive(TurnKind::Extra, self.queue.next_sequence());
            if let (Some(action_speed), Some(snapshot)) = (speed, snapshot) {
                extra.action_speed = action_speed;
                extra.priority =
                    SpeedModel::compute_priority(snapshot, action_speed, extra.jitter);
            }
            extras.push(extra);
        }

        let views: Vec<TurnEntryView> = extras.iter().map(TurnEntry::view).collect();
        self.queue.insert_front(extras);
        for (position, view) in views.into_iter().enumerate() {
            self.emit(QueueEvent::Inserted {
                entry: view,
                position,
            });
        }

        tracing::debug!(
            target: TARGET,
            combatant = %actor,
            claims,
            balance,
            "extra actions claimed"
        );
        Ok(SpendOutcome::Granted { claims, balance })
    }

    /// Places a Forced entry raised by the action being resolved.
    ///
    /// The actor's entry is already gone, so a preempting interrupt goes to
    /// the front, behind the `claimed` extra actions of this resolution.
    fn queue_interrupt(
        &mut self,
        target: CombatantId,
        claimed: usize,
    ) -> Result<TurnEntryView, SchedulerError> {
        let forced = self.forced_entry(target)?;
        let view = forced.view();
        let position = match self.policy.interrupt_priority {
            InterruptPriority::Preempt => self.queue.insert_pinned_at(claimed, forced),
            InterruptPriority::Deferred => {
                let position = self.queue.pinned_len();
                self.queue.push_pinned(forced);
                position
            }
        };
        self.emit(QueueEvent::Inserted {
            entry: view,
            position,
        });
        Ok(view)
    }
}
