//! Deterministic agility jitter.
//!
//! Many battle systems randomize speed a little so equal-agility combatants
//! don't always act in the same order. The randomness here is a pure function
//! of a seed: the seed mixes the battle seed, the generation pass, the
//! combatant and a context value, so replaying a battle replays its queues.
//!
//! Jitter is a strategy ([`JitterPolicy`]). [`JitterKind`] covers the common
//! cases and is plain data so policies can be loaded from files.

use crate::combatant::CombatantId;

/// Deterministic random source keyed by seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Value in `[0, bound)`; `0` when `bound` is zero.
    fn below(&self, seed: u64, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.next_u32(seed) % bound
    }
}

/// PCG-XSH-RR: one LCG step followed by an xorshift/rotate permutation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Seed contexts, so independent rolls for the same entry never collide.
pub mod context {
    /// Jitter of a regular entry created by a generation pass.
    pub const GENERATION: u32 = 0;
    /// Jitter of a forced interrupt entry.
    pub const INTERRUPT: u32 = 1;
}

/// Mixes the inputs of one roll into a seed (SplitMix64-style avalanche).
pub fn compute_seed(
    battle_seed: u64,
    generation: u64,
    combatant: CombatantId,
    context: u32,
) -> u64 {
    let mut hash = battle_seed;
    hash ^= generation.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(combatant.0).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}

/// Strategy deciding how much random speed an entry receives.
///
/// Implementations must be pure: the same `(effective_agility, seed)` always
/// yields the same jitter.
pub trait JitterPolicy: Send + Sync {
    fn jitter(&self, effective_agility: i32, seed: u64) -> i32;
}

/// Built-in jitter strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum JitterKind {
    /// Priority is exactly the computed speed.
    #[default]
    None,
    /// Uniform bonus in `[0, base + agility / divisor)`.
    Agility { base: i32, divisor: i32 },
}

impl JitterKind {
    /// The classic "agility plus a quarter of agility plus five" roll.
    pub const CLASSIC: Self = JitterKind::Agility {
        base: 5,
        divisor: 4,
    };
}

impl JitterPolicy for JitterKind {
    fn jitter(&self, effective_agility: i32, seed: u64) -> i32 {
        match *self {
            JitterKind::None => 0,
            JitterKind::Agility { base, divisor } => {
                let scaled = if divisor > 0 {
                    effective_agility.max(0) / divisor
                } else {
                    0
                };
                let bound = base.saturating_add(scaled).max(0) as u32;
                PcgRng.below(seed, bound) as i32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_roll() {
        let seed = compute_seed(42, 3, CombatantId(7), context::GENERATION);
        assert_eq!(PcgRng.next_u32(seed), PcgRng.next_u32(seed));
    }

    #[test]
    fn seed_depends_on_every_input() {
        let base = compute_seed(42, 3, CombatantId(7), context::GENERATION);
        assert_ne!(base, compute_seed(43, 3, CombatantId(7), context::GENERATION));
        assert_ne!(base, compute_seed(42, 4, CombatantId(7), context::GENERATION));
        assert_ne!(base, compute_seed(42, 3, CombatantId(8), context::GENERATION));
        assert_ne!(base, compute_seed(42, 3, CombatantId(7), context::INTERRUPT));
    }

    #[test]
    fn agility_jitter_stays_in_bounds() {
        let kind = JitterKind::CLASSIC;
        for generation in 0..200 {
            let seed = compute_seed(1, generation, CombatantId(1), context::GENERATION);
            let roll = kind.jitter(40, seed);
            // bound = 5 + 40 / 4 = 15
            assert!((0..15).contains(&roll), "roll {roll} out of range");
        }
    }

    #[test]
    fn no_jitter_is_zero() {
        assert_eq!(JitterKind::None.jitter(999, 12345), 0);
    }

    #[test]
    fn zero_bound_is_zero() {
        let kind = JitterKind::Agility {
            base: 0,
            divisor: 0,
        };
        assert_eq!(kind.jitter(50, 99), 0);
    }
}
