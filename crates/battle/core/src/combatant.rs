//! Inbound combatant data.
//!
//! Combatants belong to the surrounding engine. The scheduler only ever sees
//! [`CombatantSnapshot`]s: read-only copies of the fields that decide turn
//! order. Entries refer to combatants by [`CombatantId`] and never hold on to
//! the combatant itself.

use std::fmt;

use crate::stats::bonus::{Bonus, BonusStack};

/// Stable identity of a combatant for the duration of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Team a combatant fights for.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Side {
    /// Player-controlled party.
    #[default]
    Party,
    /// Enemy troop.
    Troop,
}

impl Side {
    /// The opposing side.
    pub const fn opponent(self) -> Self {
        match self {
            Side::Party => Side::Troop,
            Side::Troop => Side::Party,
        }
    }
}

/// Where a speed modifier comes from. Layers are applied in declaration order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModifierLayer {
    /// Weapons, armor, accessories.
    Equipment,
    /// Buffs, debuffs and other status effects.
    Status,
}

/// A single agility modifier attached to a combatant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpeedModifier {
    pub layer: ModifierLayer,
    pub bonus: Bonus,
}

impl SpeedModifier {
    pub fn equipment(bonus: Bonus) -> Self {
        Self {
            layer: ModifierLayer::Equipment,
            bonus,
        }
    }

    pub fn status(bonus: Bonus) -> Self {
        Self {
            layer: ModifierLayer::Status,
            bonus,
        }
    }
}

/// Read-only view of a combatant as handed to the scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    /// Base agility before any modifier.
    pub agility: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<SpeedModifier>,
    #[cfg_attr(feature = "serde", serde(default = "alive_by_default"))]
    pub alive: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub side: Side,
}

#[cfg(feature = "serde")]
fn alive_by_default() -> bool {
    true
}

impl CombatantSnapshot {
    /// Creates a living combatant with no modifiers.
    pub fn new(id: CombatantId, side: Side, agility: i32) -> Self {
        Self {
            id,
            agility,
            modifiers: Vec::new(),
            alive: true,
            side,
        }
    }

    /// Attaches a modifier (builder pattern).
    #[must_use]
    pub fn with_modifier(mut self, modifier: SpeedModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Marks the combatant as dead (builder pattern).
    #[must_use]
    pub fn defeated(mut self) -> Self {
        self.alive = false;
        self
    }

    /// Collects the bonuses of one layer into a stack.
    pub fn layer_stack(&self, layer: ModifierLayer) -> BonusStack {
        let mut stack = BonusStack::new();
        stack.extend(
            self.modifiers
                .iter()
                .filter(|m| m.layer == layer)
                .map(|m| m.bonus.clone()),
        );
        stack
    }

    /// Returns true when two snapshots would yield different priorities.
    pub fn speed_differs(&self, other: &Self) -> bool {
        self.agility != other.agility || self.modifiers != other.modifiers
    }
}
