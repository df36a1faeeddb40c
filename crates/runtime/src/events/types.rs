//! Event types for different topics.

use battle_core::{
    BattleReport, CombatantId, QueueEvent, QueueSnapshot, RemovalReason, Side, TurnKind,
};
use serde::{Deserialize, Serialize};

/// A scheduler queue change together with the forecast at that moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueChange {
    pub event: QueueEvent,
    pub snapshot: QueueSnapshot,
}

/// Battle-flow milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    Started {
        combatants: usize,
        sides: Vec<Side>,
    },

    /// The session is waiting on a decision for `actor`.
    TurnStarted { actor: CombatantId, round: u64 },

    TurnResolved {
        actor: CombatantId,
        consumed: TurnKind,
        /// Extra actions granted by a resource spend.
        extra_actions: u32,
        /// Actor's balance after the turn, if the policy keeps a ledger.
        balance: Option<i32>,
    },

    /// The scheduler refused a decision; the actor acted once instead.
    DecisionRejected { actor: CombatantId, error: String },

    /// An aftermath entry could not be applied.
    AftermathFailed { combatant: CombatantId, error: String },

    CombatantLeft {
        combatant: CombatantId,
        reason: RemovalReason,
    },

    Ended { report: BattleReport },
}
