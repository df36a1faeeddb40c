//! Simulator subcommands.

mod preview;
mod run;

pub use preview::Preview;
pub use run::Run;

use std::path::PathBuf;

use anyhow::Result;
use battle_content::BattleSetup;
use clap::Args;

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Directory holding scheduler.toml, policy.toml and roster.ron
    #[arg(long, default_value = "data")]
    pub data: PathBuf,

    /// Use a built-in policy instead of policy.toml
    /// (standard, brave, free_turn, order_turn)
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the battle seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SetupArgs {
    pub fn load(&self) -> Result<BattleSetup> {
        let mut setup = BattleSetup::from_dir(&self.data)?;
        if let Some(preset) = &self.preset {
            setup = setup.with_preset(preset)?;
        }
        if let Some(seed) = self.seed {
            setup.config = setup.config.with_seed(seed);
        }
        Ok(setup)
    }
}
