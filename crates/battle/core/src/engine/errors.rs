//! Error types for the scheduler state machine.

use super::Phase;
use crate::combatant::CombatantId;
use crate::error::{BattleError, ErrorSeverity};
use crate::ledger::LedgerError;
use crate::policy::InvalidResourceModel;

/// Errors surfaced by [`super::Scheduler`] operations.
///
/// Everything except [`SchedulerError::EmptyQueue`], [`SchedulerError::InvalidTransition`]
/// and internal ledger failures is rejected before any state is touched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("turn queue is exhausted and regeneration produced no entries")]
    EmptyQueue,

    #[error("unknown combatant {combatant}")]
    UnknownCombatant { combatant: CombatantId },

    #[error("combatant {combatant} is already defeated")]
    CombatantDefeated { combatant: CombatantId },

    #[error("operation requires phase {expected}, scheduler is in {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("combatant {actor} is not the current actor (current: {current:?})")]
    ActorNotCurrent {
        actor: CombatantId,
        current: Option<CombatantId>,
    },

    #[error("illegal phase transition {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("combatant {combatant} is already in battle")]
    DuplicateCombatant { combatant: CombatantId },

    #[error("battle holds at most {max} combatants (got {count})")]
    TooManyCombatants { count: usize, max: usize },

    #[error("battle needs at least one combatant")]
    NoCombatants,

    #[error("turn of {combatant} cannot be delayed")]
    CannotDelay { combatant: CombatantId },

    #[error("battle system has no spendable resource")]
    ResourcesDisabled,

    #[error("cannot claim {requested} extra actions in one turn (limit {max})")]
    TooManyClaims { requested: u32, max: u32 },

    #[error("resource model rejected: {0}")]
    InvalidResourceModel(#[from] InvalidResourceModel),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl SchedulerError {
    pub fn actor_not_current(actor: CombatantId, current: Option<CombatantId>) -> Self {
        Self::ActorNotCurrent { actor, current }
    }

    pub fn invalid_phase(expected: Phase, actual: Phase) -> Self {
        Self::InvalidPhase { expected, actual }
    }
}

impl BattleError for SchedulerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EmptyQueue => ErrorSeverity::Fatal,
            Self::InvalidTransition { .. } => ErrorSeverity::Internal,
            Self::Ledger(err) => err.severity(),
            Self::UnknownCombatant { .. }
            | Self::CombatantDefeated { .. }
            | Self::InvalidPhase { .. }
            | Self::ActorNotCurrent { .. }
            | Self::DuplicateCombatant { .. }
            | Self::TooManyCombatants { .. }
            | Self::NoCombatants
            | Self::CannotDelay { .. }
            | Self::ResourcesDisabled
            | Self::TooManyClaims { .. }
            | Self::InvalidResourceModel(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyQueue => "SCHEDULER_EMPTY_QUEUE",
            Self::UnknownCombatant { .. } => "SCHEDULER_UNKNOWN_COMBATANT",
            Self::CombatantDefeated { .. } => "SCHEDULER_COMBATANT_DEFEATED",
            Self::InvalidPhase { .. } => "SCHEDULER_INVALID_PHASE",
            Self::ActorNotCurrent { .. } => "SCHEDULER_ACTOR_NOT_CURRENT",
            Self::InvalidTransition { .. } => "SCHEDULER_INVALID_TRANSITION",
            Self::DuplicateCombatant { .. } => "SCHEDULER_DUPLICATE_COMBATANT",
            Self::TooManyCombatants { .. } => "SCHEDULER_TOO_MANY_COMBATANTS",
            Self::NoCombatants => "SCHEDULER_NO_COMBATANTS",
            Self::CannotDelay { .. } => "SCHEDULER_CANNOT_DELAY",
            Self::ResourcesDisabled => "SCHEDULER_RESOURCES_DISABLED",
            Self::TooManyClaims { .. } => "SCHEDULER_TOO_MANY_CLAIMS",
            Self::InvalidResourceModel(_) => "SCHEDULER_INVALID_RESOURCE_MODEL",
            Self::Ledger(err) => err.error_code(),
        }
    }
}
