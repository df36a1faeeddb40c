//! Battle-flow controller.
//!
//! [`BattleSession`] owns one [`Scheduler`] and drives it turn by turn: it asks
//! the acting combatant's [`DecisionProvider`] for a decision, submits it,
//! applies the aftermath, and repeats until the battle ends. The only
//! suspension point is the awaited decision, which races against the
//! session's cancellation signal.

use std::str::FromStr;

use battle_core::{
    ActionSubmission, BattleError, BattleReport, CombatantId, CombatantSnapshot, Phase,
    RemovalReason, Resolution, Scheduler, SchedulerError, SpendOutcome, TurnKind,
};
use tokio::sync::watch;

use crate::api::{
    Aftermath, Decision, DecisionProvider, ProviderRegistry, Result, RuntimeError,
    SessionHandle, TurnContext,
};
use crate::events::{BattleEvent, BusObserver, Event, EventBus};

const TARGET: &str = "battle_runtime::session";

/// Session-level limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Turns after which the session concludes the battle on its own.
    pub max_turns: u64,
    /// Buffered events per bus topic before slow subscribers start lagging.
    pub event_capacity: usize,
}

impl SessionConfig {
    pub const DEFAULT_MAX_TURNS: u64 = 1_000;
    pub const DEFAULT_EVENT_CAPACITY: usize = EventBus::DEFAULT_CAPACITY;

    pub const MAX_TURNS_VAR: &'static str = "BATTLE_MAX_TURNS";
    pub const EVENT_CAPACITY_VAR: &'static str = "BATTLE_EVENT_CAPACITY";

    /// Defaults overridden by `BATTLE_MAX_TURNS` and `BATTLE_EVENT_CAPACITY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`Self::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(max_turns) = parse_var(&lookup, Self::MAX_TURNS_VAR)? {
            config.max_turns = max_turns;
        }
        if let Some(capacity) = parse_var(&lookup, Self::EVENT_CAPACITY_VAR)? {
            config.event_capacity = capacity;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u64) -> Self {
        self.max_turns = max_turns;
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: Self::DEFAULT_MAX_TURNS,
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| RuntimeError::InvalidEnv { var, value })
}

/// Outcome of [`BattleSession::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleSummary {
    pub report: BattleReport,
    /// Every resolved turn, in order.
    pub acted: Vec<(CombatantId, TurnKind)>,
    /// The session stopped the battle at [`SessionConfig::max_turns`].
    pub hit_turn_limit: bool,
    /// Fatal scheduler error that aborted the battle.
    pub fatal: Option<SchedulerError>,
}

/// Drives one battle from start to report.
pub struct BattleSession {
    scheduler: Scheduler,
    roster: Vec<CombatantSnapshot>,
    providers: ProviderRegistry,
    config: SessionConfig,
    bus: EventBus,
    handle: SessionHandle,
    cancel_rx: watch::Receiver<bool>,
}

impl BattleSession {
    /// Prepares a session. `scheduler` must be idle; the battle starts when
    /// [`Self::run`] is awaited.
    pub fn new(
        scheduler: Scheduler,
        roster: Vec<CombatantSnapshot>,
        providers: ProviderRegistry,
        config: SessionConfig,
    ) -> Self {
        let bus = EventBus::with_capacity(config.event_capacity);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = SessionHandle::new(cancel_tx, bus.clone());

        Self {
            scheduler,
            roster,
            providers,
            config,
            bus,
            handle,
            cancel_rx,
        }
    }

    /// Handle for aborting the battle and subscribing to its events.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Runs the battle to completion.
    ///
    /// Returns `Err` only when the battle cannot start or a provider fails;
    /// in the latter case the battle is aborted first. A fatal scheduler error
    /// mid-battle aborts it and is reported in [`BattleSummary::fatal`].
    pub async fn run(mut self) -> Result<BattleSummary> {
        self.scheduler
            .subscribe(Box::new(BusObserver::new(self.bus.clone())));

        let roster = std::mem::take(&mut self.roster);
        let combatants = roster.len();
        self.scheduler.start_battle(roster)?;
        let sides = self.scheduler.living_sides();
        tracing::info!(target: TARGET, combatants, ?sides, "session started");
        self.publish(BattleEvent::Started { combatants, sides });

        let mut acted = Vec::new();
        let mut hit_turn_limit = false;
        let mut fatal = None;

        while self.scheduler.phase() != Phase::BattleEnded {
            if acted.len() as u64 >= self.config.max_turns {
                tracing::warn!(
                    target: TARGET,
                    max_turns = self.config.max_turns,
                    "turn limit reached, concluding battle"
                );
                hit_turn_limit = true;
                break;
            }

            let turn = match self.turn_context() {
                Ok(turn) => turn,
                Err(err) => {
                    self.scheduler.abort();
                    return Err(err);
                }
            };
            let actor = turn.head.combatant;
            self.publish(BattleEvent::TurnStarted {
                actor,
                round: turn.queue.round,
            });

            let provider = self.providers.provider_for(actor, turn.head.side);
            let Some(decided) = self.decide(provider.as_ref(), &turn).await else {
                tracing::info!(target: TARGET, %actor, "battle aborted while deciding");
                self.scheduler.abort();
                break;
            };
            let decision = match decided {
                Ok(decision) => decision,
                Err(err) => {
                    tracing::error!(target: TARGET, %actor, error = %err, "decision failed");
                    self.scheduler.abort();
                    let report = self.scheduler.end_battle()?;
                    self.publish(BattleEvent::Ended { report });
                    return Err(err);
                }
            };

            let resolution = match self.resolve(actor, decision.submission) {
                Ok(resolution) => resolution,
                Err(err) => {
                    self.abort_on(err, &mut fatal);
                    break;
                }
            };
            acted.push((actor, resolution.consumed));
            self.publish_resolution(&resolution);

            if let Err(err) = self.apply_aftermath(decision.aftermath) {
                self.abort_on(err, &mut fatal);
                break;
            }
        }

        let report = self.scheduler.end_battle()?;
        tracing::info!(
            target: TARGET,
            reason = ?report.reason,
            winner = ?report.winner,
            turns = acted.len(),
            "session finished"
        );
        self.publish(BattleEvent::Ended {
            report: report.clone(),
        });

        Ok(BattleSummary {
            report,
            acted,
            hit_turn_limit,
            fatal,
        })
    }

    /// Awaits the provider unless the session is cancelled first.
    async fn decide(
        &mut self,
        provider: &dyn DecisionProvider,
        turn: &TurnContext,
    ) -> Option<Result<Decision>> {
        tokio::select! {
            biased;
            () = cancelled(&mut self.cancel_rx) => None,
            decision = provider.decide(turn) => Some(decision),
        }
    }

    fn turn_context(&self) -> Result<TurnContext> {
        let head = self
            .scheduler
            .current_head()
            .ok_or(RuntimeError::NoCurrentActor)?;
        let actor = self
            .scheduler
            .combatant(head.combatant)
            .cloned()
            .ok_or(SchedulerError::UnknownCombatant {
                combatant: head.combatant,
            })?;

        Ok(TurnContext {
            head,
            actor,
            balance: self
                .scheduler
                .ledger()
                .and_then(|ledger| ledger.balance(head.combatant)),
            queue: self.scheduler.snapshot(),
        })
    }

    /// Submits a decision. A decision the scheduler refuses is replaced by a
    /// plain single action so the battle keeps moving.
    fn resolve(
        &mut self,
        actor: CombatantId,
        submission: ActionSubmission,
    ) -> std::result::Result<Resolution, SchedulerError> {
        if submission.actor != actor {
            let err = SchedulerError::actor_not_current(submission.actor, Some(actor));
            return self.reject(actor, err);
        }
        match self.scheduler.submit(submission) {
            Ok(resolution) => Ok(resolution),
            Err(err) if err.severity().aborts_battle() => Err(err),
            Err(err) => self.reject(actor, err),
        }
    }

    fn reject(
        &mut self,
        actor: CombatantId,
        err: SchedulerError,
    ) -> std::result::Result<Resolution, SchedulerError> {
        tracing::debug!(
            target: TARGET,
            %actor,
            code = err.error_code(),
            error = %err,
            "decision rejected, acting once instead"
        );
        self.publish(BattleEvent::DecisionRejected {
            actor,
            error: err.to_string(),
        });
        self.scheduler.submit(ActionSubmission::new(actor))
    }

    /// Applies consequences in order. Validation failures are reported and
    /// skipped; a fatal error stops the battle.
    fn apply_aftermath(
        &mut self,
        aftermath: Vec<Aftermath>,
    ) -> std::result::Result<(), SchedulerError> {
        for item in aftermath {
            if self.scheduler.phase() == Phase::BattleEnded {
                break;
            }

            let (combatant, left, result) = match item {
                Aftermath::Defeated(id) => (
                    id,
                    Some(RemovalReason::Defeated),
                    self.scheduler.remove_combatant(id, RemovalReason::Defeated),
                ),
                Aftermath::Fled(id) => (
                    id,
                    Some(RemovalReason::Fled),
                    self.scheduler.remove_combatant(id, RemovalReason::Fled),
                ),
                Aftermath::Updated(snapshot) => {
                    (snapshot.id, None, self.scheduler.update_combatant(snapshot))
                }
                Aftermath::Joined(snapshot) => {
                    (snapshot.id, None, self.scheduler.add_combatant(snapshot))
                }
            };

            match result {
                Ok(()) => {
                    if let Some(reason) = left {
                        self.publish(BattleEvent::CombatantLeft { combatant, reason });
                    }
                }
                Err(err) if err.severity().aborts_battle() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        target: TARGET,
                        %combatant,
                        code = err.error_code(),
                        error = %err,
                        "aftermath not applied"
                    );
                    self.publish(BattleEvent::AftermathFailed {
                        combatant,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn abort_on(&mut self, err: SchedulerError, fatal: &mut Option<SchedulerError>) {
        tracing::error!(
            target: TARGET,
            code = err.error_code(),
            error = %err,
            "fatal scheduler error, aborting battle"
        );
        self.scheduler.abort();
        *fatal = Some(err);
    }

    fn publish_resolution(&self, resolution: &Resolution) {
        let extra_actions = match resolution.spend {
            SpendOutcome::Granted { claims, .. } => claims,
            _ => 0,
        };
        let balance = self
            .scheduler
            .ledger()
            .and_then(|ledger| ledger.balance(resolution.actor));
        self.publish(BattleEvent::TurnResolved {
            actor: resolution.actor,
            consumed: resolution.consumed,
            extra_actions,
            balance,
        });
    }

    fn publish(&self, event: BattleEvent) {
        self.bus.publish(Event::Battle(event));
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    // The session holds the sender through its handle, so this only fails if
    // the session itself is gone.
    if rx.wait_for(|aborted| *aborted).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_config_defaults_without_env() {
        let config = SessionConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_config_reads_overrides() {
        let config = SessionConfig::from_lookup(lookup(&[
            (SessionConfig::MAX_TURNS_VAR, " 40 "),
            (SessionConfig::EVENT_CAPACITY_VAR, "16"),
        ]))
        .expect("valid overrides");
        assert_eq!(config.max_turns, 40);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_config_rejects_garbage() {
        let err = SessionConfig::from_lookup(lookup(&[(SessionConfig::MAX_TURNS_VAR, "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidEnv {
                var: "BATTLE_MAX_TURNS",
                ..
            }
        ));
    }
}
