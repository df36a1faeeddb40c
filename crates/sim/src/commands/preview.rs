//! Print the projected turn order of a fresh battle.

use anyhow::Result;
use clap::Parser;

use super::SetupArgs;

/// Start a battle and print the projected turn order
#[derive(Parser, Debug)]
pub struct Preview {
    #[command(flatten)]
    pub setup: SetupArgs,

    /// Number of upcoming turns to show
    #[arg(long, default_value_t = 12)]
    pub turns: usize,
}

impl Preview {
    pub fn execute(self) -> Result<()> {
        let setup = self.setup.load()?;
        let mut scheduler = setup.scheduler();
        scheduler.start_battle(setup.roster)?;

        println!(
            "round {} ({} phase)",
            scheduler.round(),
            scheduler
                .active_side()
                .map_or_else(|| "shared".to_string(), |side| side.to_string())
        );
        for (position, view) in scheduler.forecast(self.turns).iter().enumerate() {
            println!(
                "{:>3}. {:<6} {:<6} {:<8} priority {}",
                position + 1,
                view.combatant,
                view.side,
                view.kind,
                view.priority.0
            );
        }

        scheduler.abort();
        Ok(())
    }
}
