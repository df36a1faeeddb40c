//! Battle setup loaded from a data directory.

use std::path::{Path, PathBuf};

use battle_core::{CombatantSnapshot, Scheduler, SchedulerConfig, SchedulerPolicy};

use crate::loaders::{ConfigLoader, LoadResult, PolicyLoader, RosterLoader};

const TARGET: &str = "battle_content::setup";

/// Everything needed to start one battle.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── scheduler.toml   (optional, defaults otherwise)
/// ├── policy.toml      (optional, standard preset otherwise)
/// └── roster.ron
/// ```
#[derive(Clone, Debug)]
pub struct BattleSetup {
    pub config: SchedulerConfig,
    pub policy: SchedulerPolicy,
    pub roster: Vec<CombatantSnapshot>,
}

impl BattleSetup {
    pub const CONFIG_FILE: &'static str = "scheduler.toml";
    pub const POLICY_FILE: &'static str = "policy.toml";
    pub const ROSTER_FILE: &'static str = "roster.ron";

    /// Load the setup stored in `data_dir`.
    pub fn from_dir(data_dir: impl Into<PathBuf>) -> LoadResult<Self> {
        let data_dir = data_dir.into();

        let config = match optional(&data_dir, Self::CONFIG_FILE) {
            Some(path) => ConfigLoader::load(&path)?,
            None => SchedulerConfig::default(),
        };
        let policy = match optional(&data_dir, Self::POLICY_FILE) {
            Some(path) => PolicyLoader::load(&path)?,
            None => SchedulerPolicy::standard(),
        };
        let roster = RosterLoader::load(&data_dir.join(Self::ROSTER_FILE))?;

        tracing::debug!(
            target: TARGET,
            dir = %data_dir.display(),
            combatants = roster.len(),
            seed = config.battle_seed,
            "loaded battle setup"
        );

        Ok(Self {
            config,
            policy,
            roster,
        })
    }

    /// Replaces the policy with a named preset (builder pattern).
    pub fn with_preset(mut self, name: &str) -> LoadResult<Self> {
        self.policy = PolicyLoader::preset(name)?;
        Ok(self)
    }

    /// Builds an idle scheduler for this setup. The roster is handed over at
    /// `start_battle`.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(self.config.clone(), self.policy.clone())
    }
}

fn optional(data_dir: &Path, file: &str) -> Option<PathBuf> {
    let path = data_dir.join(file);
    path.is_file().then_some(path)
}
