//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the scheduler and from decision providers so clients
//! can bubble them up with consistent context.
use thiserror::Error;

use battle_core::{CombatantId, SchedulerError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("decision provider failed for combatant {combatant}: {reason}")]
    Provider {
        combatant: CombatantId,
        reason: String,
    },

    #[error("decision for {provided} does not match current actor {expected}")]
    InvalidDecisionActor {
        expected: CombatantId,
        provided: CombatantId,
    },

    #[error("battle has no acting combatant while still running")]
    NoCurrentActor,

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

impl RuntimeError {
    pub fn provider(combatant: CombatantId, reason: impl Into<String>) -> Self {
        Self::Provider {
            combatant,
            reason: reason.into(),
        }
    }
}
