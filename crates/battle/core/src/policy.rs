//! Battle-system variants as data.
//!
//! One [`crate::engine::Scheduler`] runs every variant. What differs between a
//! single-turn battle, a brave-point battle, a team-phase battle and an
//! exact-preview battle is captured here and handed to the scheduler at
//! construction.

use crate::combatant::Side;
use crate::stats::JitterKind;

/// Capability set of a battle-system variant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerPolicy {
    /// Spendable per-combatant resource; `None` means no ledger at all.
    pub resource_model: Option<ResourceModel>,
    /// Team phases; `None` means both sides share one queue.
    pub side_locking: Option<SideLock>,
    pub interrupt_priority: InterruptPriority,
    pub jitter: JitterKind,
}

impl SchedulerPolicy {
    /// Single turn per round, agility jitter, preempting interrupts.
    pub fn standard() -> Self {
        Self {
            resource_model: None,
            side_locking: None,
            interrupt_priority: InterruptPriority::Preempt,
            jitter: JitterKind::CLASSIC,
        }
    }

    /// Brave points: borrow up to four turns ahead, spend them on extra
    /// actions, recover one per round.
    pub fn brave() -> Self {
        Self {
            resource_model: Some(ResourceModel::brave_points()),
            ..Self::standard()
        }
    }

    /// Team phases: the party acts as a block, then the troop.
    pub fn free_turn() -> Self {
        Self {
            resource_model: None,
            side_locking: Some(SideLock {
                leading: Side::Party,
            }),
            interrupt_priority: InterruptPriority::Preempt,
            jitter: JitterKind::None,
        }
    }

    /// Exact preview: no jitter, interrupts wait for the current actor.
    pub fn order_turn() -> Self {
        Self {
            resource_model: None,
            side_locking: None,
            interrupt_priority: InterruptPriority::Deferred,
            jitter: JitterKind::None,
        }
    }

    /// Looks up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" | "single" => Some(Self::standard()),
            "brave" => Some(Self::brave()),
            "free" | "free_turn" => Some(Self::free_turn()),
            "order" | "order_turn" => Some(Self::order_turn()),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_resource_model(mut self, model: ResourceModel) -> Self {
        self.resource_model = Some(model);
        self
    }

    #[must_use]
    pub fn with_side_lock(mut self, leading: Side) -> Self {
        self.side_locking = Some(SideLock { leading });
        self
    }

    #[must_use]
    pub fn with_interrupts(mut self, interrupt_priority: InterruptPriority) -> Self {
        self.interrupt_priority = interrupt_priority;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: JitterKind) -> Self {
        self.jitter = jitter;
        self
    }
}

impl Default for ResourceModel {
    fn default() -> Self {
        Self::brave_points()
    }
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Team-phase configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideLock {
    /// Side holding the first phase of every round.
    pub leading: Side,
}

/// Where forced interrupts land.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InterruptPriority {
    /// At the very front. An interrupt raised while someone is deciding
    /// preempts them; they act right after.
    #[default]
    Preempt,
    /// Behind already pinned entries (earlier interrupts, extra actions),
    /// still ahead of every normal entry. Never preempts.
    Deferred,
}

/// What happens when a credit would push a balance past its maximum.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OverflowMode {
    /// Cap at the maximum; the excess is cosmetic and discarded.
    #[default]
    Clamp,
    /// Refuse the credit with [`crate::ledger::LedgerError::Overflow`].
    Reject,
}

/// How balances survive the end of a battle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "rule", rename_all = "snake_case"))]
pub enum CarryOverRule {
    /// Back to the model's initial balance.
    #[default]
    Reset,
    /// Unchanged.
    Keep,
    /// A percentage of the balance, rounded toward zero.
    Partial { percent: u8 },
}

impl CarryOverRule {
    pub fn settle(self, balance: i32, initial: i32) -> i32 {
        match self {
            CarryOverRule::Reset => initial,
            CarryOverRule::Keep => balance,
            CarryOverRule::Partial { percent } => {
                (i64::from(balance) * i64::from(percent.min(100)) / 100) as i32
            }
        }
    }
}

/// Spendable resource rules (brave points and similar).
///
/// Fields omitted from a policy file fall back to [`ResourceModel::brave_points`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResourceModel {
    /// Floor. Negative floors let a combatant borrow against future turns.
    pub min: i32,
    pub max: i32,
    /// Balance when a combatant enters battle.
    pub initial: i32,
    /// Units spent per extra action.
    pub cost_per_claim: u32,
    /// Upper bound on extra actions claimed by one submission.
    pub max_claims_per_turn: u32,
    /// Credited to every combatant at each round boundary.
    pub regen_per_round: i32,
    /// Combatants still in debt after regeneration sit out the round.
    pub skip_while_in_debt: bool,
    pub overflow: OverflowMode,
    pub carry_over: CarryOverRule,
}

impl ResourceModel {
    pub fn brave_points() -> Self {
        Self {
            min: -4,
            max: 4,
            initial: 0,
            cost_per_claim: 1,
            max_claims_per_turn: 3,
            regen_per_round: 1,
            skip_while_in_debt: true,
            overflow: OverflowMode::Clamp,
            carry_over: CarryOverRule::Reset,
        }
    }

    /// Units needed to claim `claims` extra actions.
    pub fn cost_of(&self, claims: u32) -> u32 {
        let cost = u64::from(claims) * u64::from(self.cost_per_claim);
        u32::try_from(cost).unwrap_or(u32::MAX)
    }

    /// Clamps a balance into `[min, max]`. Never panics, even on a model
    /// that fails [`ResourceModel::validate`].
    pub fn clamp(&self, balance: i32) -> i32 {
        balance.min(self.max).max(self.min)
    }

    /// Checks that the bounds are ordered and the initial balance sits
    /// between them.
    pub fn validate(&self) -> Result<(), InvalidResourceModel> {
        if self.min > self.max {
            return Err(InvalidResourceModel::InvertedBounds {
                min: self.min,
                max: self.max,
            });
        }
        if !(self.min..=self.max).contains(&self.initial) {
            return Err(InvalidResourceModel::InitialOutOfBounds {
                initial: self.initial,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Why a [`ResourceModel`] cannot back a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidResourceModel {
    #[error("resource floor {min} is above the cap {max}")]
    InvertedBounds { min: i32, max: i32 },

    #[error("initial balance {initial} is outside [{min}, {max}]")]
    InitialOutOfBounds { initial: i32, min: i32, max: i32 },
}
