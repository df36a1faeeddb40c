//! Asynchronous abstraction for sourcing combatant decisions.
//!
//! Runtime users plug in [`DecisionProvider`] implementations so a battle can
//! run with human input, scripted fixtures, or AI policies. Providers only see
//! an owned [`TurnContext`]; the scheduler stays with the session.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use battle_core::{ActionSubmission, CombatantId, CombatantSnapshot, QueueSnapshot, TurnEntryView};
use serde::{Deserialize, Serialize};

use super::errors::{Result, RuntimeError};

/// Everything a provider may look at when deciding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnContext {
    /// The entry that is acting.
    pub head: TurnEntryView,
    /// The actor as the scheduler last saw it.
    pub actor: CombatantSnapshot,
    /// Spendable balance, if the policy keeps a ledger.
    pub balance: Option<i32>,
    pub queue: QueueSnapshot,
}

/// Battle-state changes caused by an action, applied after it resolves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aftermath {
    Defeated(CombatantId),
    Fled(CombatantId),
    /// Stats or status changed (haste, slow, revive).
    Updated(CombatantSnapshot),
    /// A combatant joins mid-battle (summon, reinforcement).
    Joined(CombatantSnapshot),
}

/// A provider's answer for one turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub submission: ActionSubmission,
    pub aftermath: Vec<Aftermath>,
}

impl Decision {
    pub fn new(submission: ActionSubmission) -> Self {
        Self {
            submission,
            aftermath: Vec::new(),
        }
    }

    /// A plain single action with no consequences.
    pub fn pass(actor: CombatantId) -> Self {
        Self::new(ActionSubmission::new(actor))
    }

    #[must_use]
    pub fn with_aftermath(mut self, aftermath: Aftermath) -> Self {
        self.aftermath.push(aftermath);
        self
    }
}

/// Trait for deciding what the acting combatant does.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - Enemy AI
/// - Scripted/replayed battles
/// - Testing fixtures
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Decide the action for the entry at the head of the queue.
    async fn decide(&self, turn: &TurnContext) -> Result<Decision>;
}

/// Always acts once and does nothing else.
/// Useful for testing or as a fallback.
pub struct PassProvider;

#[async_trait]
impl DecisionProvider for PassProvider {
    async fn decide(&self, turn: &TurnContext) -> Result<Decision> {
        Ok(Decision::pass(turn.head.combatant))
    }
}

/// Replays prepared decisions in order, then passes.
///
/// A scripted decision whose actor is not the acting combatant is an error,
/// which keeps scripted battles honest about the turn order they expect.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Decision>>,
}

impl ScriptedProvider {
    pub fn new(script: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|script| script.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DecisionProvider for ScriptedProvider {
    async fn decide(&self, turn: &TurnContext) -> Result<Decision> {
        let actor = turn.head.combatant;
        let next = self
            .script
            .lock()
            .map_err(|_| RuntimeError::provider(actor, "script lock poisoned"))?
            .pop_front();

        match next {
            Some(decision) if decision.submission.actor != actor => {
                Err(RuntimeError::InvalidDecisionActor {
                    expected: actor,
                    provided: decision.submission.actor,
                })
            }
            Some(decision) => Ok(decision),
            None => Ok(Decision::pass(actor)),
        }
    }
}
