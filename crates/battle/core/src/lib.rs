//! Deterministic turn-order scheduling for turn-based battles.
//!
//! `battle-core` decides, action by action, which combatant acts next. Speed
//! and agility set the order, spendable resources (brave points) buy extra
//! actions, status effects force interrupts, and the whole order can be
//! previewed and mutated mid-battle. Every battle-system variant runs on the
//! same [`engine::Scheduler`]; what differs is the [`policy::SchedulerPolicy`]
//! handed to it.
//!
//! The crate is synchronous and performs no I/O. Combatants belong to the
//! surrounding engine and are only ever seen as [`CombatantSnapshot`]s.
pub mod combatant;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod queue;
pub mod stats;

pub use combatant::{CombatantId, CombatantSnapshot, ModifierLayer, Side, SpeedModifier};
pub use config::SchedulerConfig;
pub use engine::{
    ActionSubmission, BattleReport, EndReason, Phase, QueueEvent, QueueObserver, QueueSnapshot,
    RemovalReason, Resolution, Scheduler, SchedulerError, SpendOutcome,
};
pub use error::{BattleError, ErrorSeverity};
pub use ledger::{ClaimToken, LedgerEntry, LedgerError, ResourceLedger, SettledBalance};
pub use policy::{
    CarryOverRule, InterruptPriority, InvalidResourceModel, OverflowMode, ResourceModel,
    SchedulerPolicy, SideLock,
};
pub use queue::{QueueError, TurnEntry, TurnEntryView, TurnKind, TurnQueue};
pub use stats::{Bonus, BonusStack, JitterKind, JitterPolicy, Priority, SpeedModel, StatBounds};
