//! Combatant speed model.
//!
//! Turns a [`CombatantSnapshot`] into the priority that orders the turn queue.
//!
//! Layers, always in this order:
//! - base agility
//! - equipment modifiers (clamped to [`StatBounds::AGILITY`])
//! - status modifiers (clamped to [`StatBounds::AGILITY`])
//! - action-specific speed (flat, may be negative)
//! - per-entry jitter (drawn once when the entry is created)
//!
//! The result is clamped to [`StatBounds::PRIORITY`].

use std::fmt;

use super::bonus::StatBounds;
use crate::combatant::{CombatantSnapshot, ModifierLayer};

/// Ordering key of a turn entry. Higher acts sooner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Priority(pub i32);

impl Priority {
    pub const ZERO: Self = Self(0);

    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pure functions over combatant snapshots.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeedModel;

impl SpeedModel {
    /// Agility after the equipment and status layers.
    ///
    /// This is also the input of agility-scaled jitter, so a hasted combatant
    /// rolls with its hasted agility.
    pub fn effective_agility(snapshot: &CombatantSnapshot) -> i32 {
        let equipped = snapshot
            .layer_stack(ModifierLayer::Equipment)
            .apply_bounded(snapshot.agility, StatBounds::AGILITY);
        snapshot
            .layer_stack(ModifierLayer::Status)
            .apply_bounded(equipped, StatBounds::AGILITY)
    }

    /// Computes the priority of one turn entry.
    ///
    /// Called once when the entry is created and again only on an explicit
    /// recompute event, with the same `action_speed` and `jitter` the entry
    /// was created with.
    pub fn compute_priority(
        snapshot: &CombatantSnapshot,
        action_speed: i32,
        jitter: i32,
    ) -> Priority {
        let agility = i64::from(Self::effective_agility(snapshot));
        let raw = agility + i64::from(action_speed) + i64::from(jitter);
        let bounds = StatBounds::PRIORITY;
        Priority(raw.clamp(i64::from(bounds.min), i64::from(bounds.max)) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{CombatantId, Side, SpeedModifier};
    use crate::stats::bonus::Bonus;

    fn snapshot(agility: i32) -> CombatantSnapshot {
        CombatantSnapshot::new(CombatantId(1), Side::Party, agility)
    }

    #[test]
    fn plain_agility_is_priority() {
        assert_eq!(SpeedModel::compute_priority(&snapshot(20), 0, 0), Priority(20));
    }

    #[test]
    fn equipment_applies_before_status() {
        // (10 + 10) × 2 = 40, not 10 × 2 + 10 = 30
        let s = snapshot(10)
            .with_modifier(SpeedModifier::status(Bonus::more(100)))
            .with_modifier(SpeedModifier::equipment(Bonus::flat(10)));
        assert_eq!(SpeedModel::effective_agility(&s), 40);
    }

    #[test]
    fn action_speed_and_jitter_are_additive() {
        let s = snapshot(30);
        assert_eq!(SpeedModel::compute_priority(&s, -50, 3), Priority(-17));
    }

    #[test]
    fn effective_agility_never_negative() {
        let s = snapshot(5).with_modifier(SpeedModifier::status(Bonus::flat(-50)));
        assert_eq!(SpeedModel::effective_agility(&s), 0);
    }

    #[test]
    fn priority_is_clamped() {
        let s = snapshot(9999);
        assert_eq!(
            SpeedModel::compute_priority(&s, i32::MAX, i32::MAX),
            Priority(StatBounds::PRIORITY.max)
        );
    }
}
