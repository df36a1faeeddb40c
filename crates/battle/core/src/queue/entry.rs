use core::cmp::{Ordering, Reverse};

use crate::combatant::{CombatantId, Side};
use crate::stats::Priority;

/// Why an entry exists.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TurnKind {
    /// Created by a generation pass.
    Normal,
    /// Out-of-order action forced by a status effect or another action.
    Forced,
    /// Claimed by spending a resource; keeps the spender's initiative.
    Extra,
    /// Pushed behind every normal entry of the current pass.
    Delayed,
}

impl TurnKind {
    /// Position-anchored kinds live in the pinned segment of the queue and
    /// are not ordered by priority.
    pub const fn is_pinned(self) -> bool {
        matches!(self, TurnKind::Forced | TurnKind::Extra)
    }

    /// Sort band inside the ordered segment; lower bands act first.
    pub(crate) const fn band(self) -> u8 {
        match self {
            TurnKind::Delayed => 1,
            TurnKind::Normal | TurnKind::Forced | TurnKind::Extra => 0,
        }
    }
}

/// One scheduled opportunity for a combatant to act.
///
/// `jitter` and `action_speed` are kept so a recompute after a stat change
/// reproduces everything except the changed stat.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnEntry {
    pub combatant: CombatantId,
    pub side: Side,
    pub priority: Priority,
    pub kind: TurnKind,
    /// Monotonic creation counter; breaks priority ties.
    pub sequence: u64,
    /// Generation pass that created this entry.
    pub generation: u64,
    pub jitter: i32,
    pub action_speed: i32,
}

impl TurnEntry {
    /// Queue ordering key: band, then priority descending, then sequence.
    pub fn order_key(&self) -> (u8, Reverse<Priority>, u64) {
        (self.kind.band(), Reverse(self.priority), self.sequence)
    }

    /// Compares two entries by their queue ordering key.
    pub fn cmp_order(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }

    /// Copies this entry as a different kind with a fresh sequence number.
    pub fn derive(&self, kind: TurnKind, sequence: u64) -> Self {
        Self {
            kind,
            sequence,
            ..self.clone()
        }
    }

    pub fn view(&self) -> TurnEntryView {
        TurnEntryView {
            combatant: self.combatant,
            side: self.side,
            kind: self.kind,
            priority: self.priority,
        }
    }
}

/// Read-only projection of an entry for rendering and input layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnEntryView {
    pub combatant: CombatantId,
    pub side: Side,
    pub kind: TurnKind,
    pub priority: Priority,
}
