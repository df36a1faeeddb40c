//! Common error infrastructure for battle-core.
//!
//! Domain errors (`QueueError`, `LedgerError`, `SchedulerError`) live next to
//! the component that raises them. This module holds what they share: a
//! severity classification that tells the battle-flow controller whether to
//! recover locally or abort the battle, and the [`BattleError`] trait.
//!
//! # Recovery Rules
//!
//! - **Recoverable**: handled inside the scheduler's resolving step (a rejected
//!   resource spend falls back to a single action)
//! - **Validation**: the caller passed something the scheduler cannot accept
//!   in its current phase; nothing was mutated
//! - **Internal**: scheduler bookkeeping went out of sync
//! - **Fatal**: the battle instance cannot continue and must be aborted

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// Handled locally; the battle proceeds with a fallback.
    ///
    /// Examples: insufficient brave points, overflowing refund
    Recoverable,

    /// Invalid input for the current phase, rejected without side effects.
    ///
    /// Examples: unknown combatant id, submission from the wrong actor
    Validation,

    /// Unexpected state inconsistency.
    ///
    /// Examples: illegal phase transition requested by the scheduler itself
    Internal,

    /// The battle instance cannot continue.
    ///
    /// Examples: queue exhausted and regeneration produced no entries
    Fatal,
}

impl ErrorSeverity {
    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if the battle-flow controller should abort the battle.
    pub const fn aborts_battle(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity by recoverability, not by how visible the failure is
/// - Return a stable SCREAMING_SNAKE_CASE code from `error_code` for logs
///   and tests, prefixed with the module (`QUEUE_EMPTY`, `LEDGER_OVERFLOW`)
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_internal_and_fatal_abort() {
        assert!(!ErrorSeverity::Recoverable.aborts_battle());
        assert!(!ErrorSeverity::Validation.aborts_battle());
        assert!(ErrorSeverity::Internal.aborts_battle());
        assert!(ErrorSeverity::Fatal.aborts_battle());
        assert!(ErrorSeverity::Recoverable.is_recoverable());
    }

    #[test]
    fn severity_renders_snake_case() {
        assert_eq!(ErrorSeverity::Fatal.to_string(), "fatal");
        assert_eq!(ErrorSeverity::Recoverable.as_ref(), "recoverable");
    }
}
