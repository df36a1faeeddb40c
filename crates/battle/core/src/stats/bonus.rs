//! Bonus stacks used by every layer of the speed model.
//!
//! Inside a single layer the calculation order is fixed:
//! Flat → %Inc → More → Less → Clamp
//!
//! Integer percentages keep every result reproducible across platforms.

/// A single modifier applied to a speed value.
///
/// - **Flat**: additive, applied first (e.g. +5 AGI from boots)
/// - **Increased**: percentages summed together, then applied once (+20%)
/// - **More**: multipliers applied one after another (50 = ×1.5)
/// - **Less**: reductions applied one after another (10 = ×0.9)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus {
    Flat(i32),
    Increased(i32),
    More(i32),
    Less(i32),
}

impl Bonus {
    pub fn flat(value: i32) -> Self {
        Bonus::Flat(value)
    }

    /// Percentage increase (20 = +20%).
    pub fn increased(percent: i32) -> Self {
        Bonus::Increased(percent)
    }

    /// Sequential multiplier (50 = ×1.5).
    pub fn more(percent: i32) -> Self {
        Bonus::More(percent)
    }

    /// Sequential reduction (10 = ×0.9).
    pub fn less(percent: i32) -> Self {
        Bonus::Less(percent)
    }
}

/// An ordered collection of bonuses for one layer.
///
/// # Example
/// ```
/// # use battle_core::stats::bonus::{Bonus, BonusStack};
/// let mut stack = BonusStack::new();
/// stack.add(Bonus::flat(5));
/// stack.add(Bonus::increased(20));
/// stack.add(Bonus::increased(15));
/// stack.add(Bonus::more(50));
/// stack.add(Bonus::less(10));
///
/// // clamp((10 + 5) × 1.35 × 1.5 × 0.9, 5, 100) = 27
/// assert_eq!(stack.apply(10, 5, 100), 27);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusStack {
    bonuses: Vec<Bonus>,
}

impl BonusStack {
    pub fn new() -> Self {
        Self {
            bonuses: Vec::new(),
        }
    }

    pub fn add(&mut self, bonus: Bonus) {
        self.bonuses.push(bonus);
    }

    pub fn extend(&mut self, bonuses: impl IntoIterator<Item = Bonus>) {
        self.bonuses.extend(bonuses);
    }

    /// Applies every bonus to `base` and clamps the result to `[min, max]`.
    ///
    /// Intermediate values are widened to `i64` so large agility values and
    /// stacked multipliers cannot overflow before the clamp.
    pub fn apply(&self, base: i32, min: i32, max: i32) -> i32 {
        let mut flat: i64 = 0;
        let mut increased: i64 = 0;
        for bonus in &self.bonuses {
            match bonus {
                Bonus::Flat(v) => flat += i64::from(*v),
                Bonus::Increased(p) => increased += i64::from(*p),
                Bonus::More(_) | Bonus::Less(_) => {}
            }
        }

        let mut value = i64::from(base) + flat;
        if increased != 0 {
            value = value * (100 + increased) / 100;
        }

        for bonus in &self.bonuses {
            if let Bonus::More(p) = bonus {
                value = value * (100 + i64::from(*p)) / 100;
            }
        }
        for bonus in &self.bonuses {
            if let Bonus::Less(p) = bonus {
                value = value * (100 - i64::from(*p)) / 100;
            }
        }

        value.clamp(i64::from(min), i64::from(max)) as i32
    }

    pub fn apply_unclamped(&self, base: i32) -> i32 {
        self.apply(base, i32::MIN, i32::MAX)
    }

    /// Applies the stack within the given bounds.
    pub fn apply_bounded(&self, base: i32, bounds: StatBounds) -> i32 {
        self.apply(base, bounds.min, bounds.max)
    }

    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bonuses.len()
    }
}

/// Builder-style helpers.
///
/// ```
/// # use battle_core::stats::bonus::BonusStack;
/// let haste = BonusStack::new().more(100);
/// assert_eq!(haste.apply_unclamped(12), 24);
/// ```
impl BonusStack {
    #[must_use]
    pub fn flat(mut self, value: i32) -> Self {
        self.add(Bonus::flat(value));
        self
    }

    #[must_use]
    pub fn increased(mut self, percent: i32) -> Self {
        self.add(Bonus::increased(percent));
        self
    }

    #[must_use]
    pub fn more(mut self, percent: i32) -> Self {
        self.add(Bonus::more(percent));
        self
    }

    #[must_use]
    pub fn less(mut self, percent: i32) -> Self {
        self.add(Bonus::less(percent));
        self
    }
}

/// Clamp range for a value produced by the speed model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatBounds {
    pub min: i32,
    pub max: i32,
}

impl StatBounds {
    /// Effective agility after equipment and status layers: [0, 9999].
    ///
    /// Debuffs can slow a combatant to a crawl but never below zero.
    pub const AGILITY: Self = Self { min: 0, max: 9999 };

    /// Final turn priority: [-99999, 99999].
    ///
    /// Negative priorities are legal so slow actions (large negative action
    /// speed) still sort after everything else instead of wrapping.
    pub const PRIORITY: Self = Self {
        min: -99_999,
        max: 99_999,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_and_less_apply_sequentially() {
        let stack = BonusStack::new().more(50).more(50);
        // 100 × 1.5 × 1.5
        assert_eq!(stack.apply_unclamped(100), 225);

        let stack = BonusStack::new().less(50).less(50);
        assert_eq!(stack.apply_unclamped(100), 25);
    }

    #[test]
    fn increased_bonuses_are_summed_before_applying() {
        let stack = BonusStack::new().increased(25).increased(25);
        assert_eq!(stack.apply_unclamped(100), 150);
    }

    #[test]
    fn clamps_to_bounds() {
        let stack = BonusStack::new().flat(-500);
        assert_eq!(stack.apply_bounded(20, StatBounds::AGILITY), 0);

        let stack = BonusStack::new().more(i32::MAX);
        assert_eq!(stack.apply_bounded(9000, StatBounds::AGILITY), 9999);
    }

    #[test]
    fn empty_stack_is_identity() {
        let stack = BonusStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.apply_unclamped(-7), -7);
    }
}
