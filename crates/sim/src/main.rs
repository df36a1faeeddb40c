//! Battle simulator.
//!
//! Loads a battle setup from a data directory and either runs it to the end
//! with pass-through decisions or prints the upcoming turn order.
//!
//! ```bash
//! cargo run -p battle-sim -- run --data data --preset brave
//! cargo run -p battle-sim -- preview --data data --turns 8
//! ```

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Preview, Run};

/// Turn-order battle simulator
#[derive(Parser)]
#[command(name = "battle-sim")]
#[command(about = "Runs and previews turn-order battles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a battle to completion and print the summary
    Run(Run),

    /// Start a battle and print the projected turn order
    Preview(Preview),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for RUST_LOG and BATTLE_* settings)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(cmd) => cmd.execute().await,
        Command::Preview(cmd) => cmd.execute(),
    }
}
