use crate::combatant::CombatantId;
use crate::error::{BattleError, ErrorSeverity};

/// Errors raised by the resource ledger.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error(
        "combatant {combatant} cannot spend {requested}: {available} available, floor is {floor}"
    )]
    InsufficientResource {
        combatant: CombatantId,
        requested: u32,
        available: i32,
        floor: i32,
    },

    #[error("crediting {amount} to combatant {combatant} exceeds maximum {max} (balance {balance})")]
    Overflow {
        combatant: CombatantId,
        amount: u32,
        balance: i32,
        max: i32,
    },

    #[error("combatant {combatant} has no ledger entry")]
    UnknownCombatant { combatant: CombatantId },

    #[error("claim {claim} is not outstanding")]
    UnknownClaim { claim: u64 },
}

impl BattleError for LedgerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InsufficientResource { .. } | Self::Overflow { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::UnknownCombatant { .. } => ErrorSeverity::Validation,
            Self::UnknownClaim { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientResource { .. } => "LEDGER_INSUFFICIENT_RESOURCE",
            Self::Overflow { .. } => "LEDGER_OVERFLOW",
            Self::UnknownCombatant { .. } => "LEDGER_UNKNOWN_COMBATANT",
            Self::UnknownClaim { .. } => "LEDGER_UNKNOWN_CLAIM",
        }
    }
}
