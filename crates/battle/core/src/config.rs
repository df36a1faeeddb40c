/// Scheduler configuration constants and tunable parameters.
///
/// Policy (which battle-system variant is running) lives in
/// [`crate::policy::SchedulerPolicy`]; this struct only carries the knobs that
/// every variant shares.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Seed mixed into every jitter roll. Two battles with the same seed and
    /// the same inputs produce identical queues.
    pub battle_seed: u64,

    /// Number of entries included in the snapshot handed to queue observers.
    pub forecast_horizon: usize,

    /// How many upcoming generation passes `forecast` may project past the
    /// entries that are already queued.
    pub projected_phases: usize,
}

impl SchedulerConfig {
    // ===== compile-time limits =====
    /// Maximum number of combatants in one battle (party + troop + joiners).
    pub const MAX_COMBATANTS: usize = 64;
    /// Maximum number of extra actions a single spend may claim.
    pub const MAX_CLAIMS_PER_SPEND: u32 = 8;
    /// Consecutive generation passes that may come up empty (every eligible
    /// combatant skipping for debt) before the queue counts as exhausted.
    pub const MAX_IDLE_PASSES: usize = 32;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_BATTLE_SEED: u64 = 0x5eed_ba77_1e00_0001;
    pub const DEFAULT_FORECAST_HORIZON: usize = 12;
    pub const DEFAULT_PROJECTED_PHASES: usize = 1;

    pub fn new() -> Self {
        Self {
            battle_seed: Self::DEFAULT_BATTLE_SEED,
            forecast_horizon: Self::DEFAULT_FORECAST_HORIZON,
            projected_phases: Self::DEFAULT_PROJECTED_PHASES,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, battle_seed: u64) -> Self {
        self.battle_seed = battle_seed;
        self
    }

    #[must_use]
    pub fn with_forecast_horizon(mut self, forecast_horizon: usize) -> Self {
        self.forecast_horizon = forecast_horizon;
        self
    }

    #[must_use]
    pub fn with_projected_phases(mut self, projected_phases: usize) -> Self {
        self.projected_phases = projected_phases;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}
