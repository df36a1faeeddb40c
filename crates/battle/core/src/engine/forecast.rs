//! Read-only views of the upcoming turn order.

use super::observer::QueueSnapshot;
use super::Scheduler;
use crate::queue::{TurnEntry, TurnEntryView};

impl Scheduler {
    /// The entry whose combatant is currently acting.
    pub fn current_head(&self) -> Option<TurnEntryView> {
        self.current.as_ref().map(TurnEntry::view)
    }

    /// The next `n` turns, head first.
    ///
    /// Calling this twice without a mutation in between returns the same list.
    pub fn forecast(&self, n: usize) -> Vec<TurnEntryView> {
        self.forecast_iter().take(n).collect()
    }

    /// Lazy forecast: the current head, then queued entries, then projections
    /// of up to `projected_phases` generation passes. Projections are only
    /// computed as far as the iterator is driven.
    pub fn forecast_iter(&self) -> impl Iterator<Item = TurnEntryView> + '_ {
        let scheduled = self
            .current
            .iter()
            .chain(self.queue.iter())
            .filter(|entry| self.is_live(entry.combatant))
            .map(TurnEntry::view);

        let passes = if self.phase.is_active() {
            self.config.projected_phases
        } else {
            0
        };
        let lock = self.policy.side_locking;
        let mut cursor = self.cursor;
        let mut sequence = self.queue.peek_sequence();
        let mut pending = self.pending_speed.clone();

        let projected = (0..passes).flat_map(move |_| {
            cursor = cursor.next(lock.as_ref());
            let plan = self.plan_pass(cursor, &mut sequence, &pending);
            for entry in &plan.entries {
                pending.shift_remove(&entry.combatant);
            }
            plan.entries.into_iter().map(|entry| entry.view())
        });

        scheduled.chain(projected)
    }

    /// State handed to observers.
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            phase: self.phase,
            round: self.cursor.round,
            active_side: self.cursor.side,
            head: self.current_head(),
            upcoming: self.forecast(self.config.forecast_horizon),
        }
    }
}
