//! Queue-change notifications.
//!
//! Observers are called synchronously after every committed mutation with the
//! event and a read-only snapshot of the forecast. They cannot reach back into
//! the scheduler.

use super::{EndReason, Phase, RemovalReason};
use crate::combatant::{CombatantId, Side};
use crate::queue::TurnEntryView;
use crate::stats::Priority;

/// What changed in the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueueEvent {
    /// A generation pass filled the ordered segment.
    Regenerated {
        round: u64,
        generation: u64,
        side: Option<Side>,
        entries: usize,
    },
    /// An entry was placed; `position` counts from the current head.
    Inserted {
        entry: TurnEntryView,
        position: usize,
    },
    /// Entries of a combatant were invalidated.
    Removed {
        combatant: CombatantId,
        entries: usize,
        reason: RemovalReason,
    },
    /// A combatant's entries were re-prioritized after a speed change.
    Reordered {
        combatant: CombatantId,
        priority: Priority,
    },
    /// A new entry became the acting one.
    HeadChanged { head: Option<TurnEntryView> },
    /// A combatant sits out a round for resource debt.
    TurnSkipped { combatant: CombatantId, round: u64 },
    BattleEnded { reason: EndReason },
}

/// Read-only state handed to observers with every event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueSnapshot {
    pub phase: Phase,
    pub round: u64,
    pub active_side: Option<Side>,
    pub head: Option<TurnEntryView>,
    /// Forecast up to the configured horizon, head first.
    pub upcoming: Vec<TurnEntryView>,
}

/// Receives queue changes.
///
/// Must be `Send` so a runtime can forward changes to a rendering thread.
pub trait QueueObserver: Send {
    fn on_queue_changed(&mut self, event: &QueueEvent, snapshot: &QueueSnapshot);
}

impl<F> QueueObserver for F
where
    F: FnMut(&QueueEvent, &QueueSnapshot) + Send,
{
    fn on_queue_changed(&mut self, event: &QueueEvent, snapshot: &QueueSnapshot) {
        self(event, snapshot)
    }
}
