//! Turn queue: the forecast of who acts next.
//!
//! The queue has two segments, read front to back:
//!
//! ```text
//! [ pinned: interrupts, extra actions, restored heads ] [ ordered: by key ]
//! ```
//!
//! Pinned entries keep the position they were placed at. Ordered entries are
//! kept sorted by `(band, priority desc, sequence asc)` and are only ever
//! placed by binary search, so mutation never needs a full re-sort.

mod entry;

pub use entry::{TurnEntry, TurnEntryView, TurnKind};

use std::collections::VecDeque;

use crate::combatant::CombatantId;
use crate::error::{BattleError, ErrorSeverity};
use crate::stats::Priority;

/// Errors raised by queue access.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("turn queue has no eligible entries")]
    Empty,
}

impl BattleError for QueueError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Empty => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "QUEUE_EMPTY",
        }
    }
}

/// Ordered collection of pending turn entries.
#[derive(Clone, Debug, Default)]
pub struct TurnQueue {
    pinned: VecDeque<TurnEntry>,
    ordered: VecDeque<TurnEntry>,
    next_sequence: u64,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next tiebreak value.
    pub fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// The value the next call to [`Self::next_sequence`] will return.
    pub fn peek_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Moves the counter forward after sequences were handed out by a plan.
    pub fn advance_sequence_to(&mut self, next: u64) {
        debug_assert!(next >= self.next_sequence, "sequence counter must not go back");
        self.next_sequence = self.next_sequence.max(next);
    }

    /// Inserts an entry into the ordered segment by binary search.
    ///
    /// Returns the entry's position counted from the head.
    pub fn insert(&mut self, entry: TurnEntry) -> usize {
        debug_assert!(
            !entry.kind.is_pinned(),
            "pinned kinds must be placed positionally"
        );
        let index = self
            .ordered
            .partition_point(|queued| queued.cmp_order(&entry).is_lt());
        self.ordered.insert(index, entry);
        self.pinned.len() + index
    }

    /// Places an entry ahead of everything else.
    pub fn push_front(&mut self, entry: TurnEntry) {
        self.pinned.push_front(entry);
    }

    /// Places an entry behind the other pinned entries, still ahead of every
    /// ordered entry.
    pub fn push_pinned(&mut self, entry: TurnEntry) {
        self.pinned.push_back(entry);
    }

    /// Places an entry at `index` within the pinned segment (clamped to its
    /// end). Returns the position it landed at.
    pub fn insert_pinned_at(&mut self, index: usize, entry: TurnEntry) -> usize {
        let index = index.min(self.pinned.len());
        self.pinned.insert(index, entry);
        index
    }

    /// Places a run of entries at the very front, keeping their order.
    pub fn insert_front(&mut self, entries: impl IntoIterator<Item = TurnEntry>) {
        let entries: Vec<TurnEntry> = entries.into_iter().collect();
        for entry in entries.into_iter().rev() {
            self.pinned.push_front(entry);
        }
    }

    /// Removes every matching entry and returns them in head order.
    ///
    /// The relative order of the remaining entries is unchanged.
    pub fn remove_if(
        &mut self,
        mut predicate: impl FnMut(&TurnEntry) -> bool,
    ) -> Vec<TurnEntry> {
        let mut removed = Vec::new();
        for segment in [&mut self.pinned, &mut self.ordered] {
            let mut kept = VecDeque::with_capacity(segment.len());
            for entry in segment.drain(..) {
                if predicate(&entry) {
                    removed.push(entry);
                } else {
                    kept.push_back(entry);
                }
            }
            *segment = kept;
        }
        removed
    }

    /// Removes and returns the first matching entry in head order.
    pub fn take_first(
        &mut self,
        mut predicate: impl FnMut(&TurnEntry) -> bool,
    ) -> Option<TurnEntry> {
        if let Some(index) = self.pinned.iter().position(&mut predicate) {
            return self.pinned.remove(index);
        }
        let index = self.ordered.iter().position(&mut predicate)?;
        self.ordered.remove(index)
    }

    pub fn peek_next(&self) -> Result<&TurnEntry, QueueError> {
        self.pinned
            .front()
            .or_else(|| self.ordered.front())
            .ok_or(QueueError::Empty)
    }

    pub fn pop_next(&mut self) -> Result<TurnEntry, QueueError> {
        self.pinned
            .pop_front()
            .or_else(|| self.ordered.pop_front())
            .ok_or(QueueError::Empty)
    }

    /// Re-prioritizes the entries of one combatant after a speed change.
    ///
    /// Ordered entries are removed and re-inserted (keeping their sequence),
    /// so every other entry keeps its relative position. Pinned entries take
    /// the new priority without moving. Returns true if any priority changed.
    pub fn reorder_after_mutation(
        &mut self,
        combatant: CombatantId,
        mut reprioritize: impl FnMut(&TurnEntry) -> Priority,
    ) -> bool {
        let mut changed = false;

        for entry in self.pinned.iter_mut().filter(|e| e.combatant == combatant) {
            let priority = reprioritize(&*entry);
            changed |= priority != entry.priority;
            entry.priority = priority;
        }

        let mut moved = Vec::new();
        let mut index = 0;
        while index < self.ordered.len() {
            if self.ordered[index].combatant == combatant {
                moved.extend(self.ordered.remove(index));
            } else {
                index += 1;
            }
        }
        for mut entry in moved {
            let priority = reprioritize(&entry);
            changed |= priority != entry.priority;
            entry.priority = priority;
            self.insert(entry);
        }

        changed
    }

    /// Drops the ordered segment ahead of a generation pass.
    pub fn clear_ordered(&mut self) -> Vec<TurnEntry> {
        self.ordered.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pinned.clear();
        self.ordered.clear();
    }

    /// Entries in head order.
    pub fn iter(&self) -> impl Iterator<Item = &TurnEntry> + '_ {
        self.pinned.iter().chain(self.ordered.iter())
    }

    pub fn contains(&self, combatant: CombatantId) -> bool {
        self.iter().any(|entry| entry.combatant == combatant)
    }

    pub fn pinned_len(&self) -> usize {
        self.pinned.len()
    }

    pub fn len(&self) -> usize {
        self.pinned.len() + self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty() && self.ordered.is_empty()
    }
}
