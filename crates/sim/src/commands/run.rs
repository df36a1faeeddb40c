//! Run a battle with pass-through decisions.

use anyhow::Result;
use battle_runtime::{
    BattleSession, Event, ProviderRegistry, QueueChange, SessionConfig, Topic,
};
use clap::Parser;
use tokio::sync::broadcast;

use super::SetupArgs;

const TARGET: &str = "battle_sim::run";

/// Run a battle to completion and print the summary
#[derive(Parser, Debug)]
pub struct Run {
    #[command(flatten)]
    pub setup: SetupArgs,

    /// Stop after this many turns (overrides BATTLE_MAX_TURNS)
    #[arg(long)]
    pub max_turns: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Run {
    pub async fn execute(self) -> Result<()> {
        let setup = self.setup.load()?;

        let mut config = SessionConfig::from_env()?;
        if let Some(max_turns) = self.max_turns {
            config = config.with_max_turns(max_turns);
        }

        let session = BattleSession::new(
            setup.scheduler(),
            setup.roster,
            ProviderRegistry::new(),
            config,
        );
        let queue = session.handle().subscribe(Topic::Queue);
        let follower = tokio::spawn(follow_queue(queue));

        let summary = session.run().await?;
        // The session dropped its sender; the follower drains and stops.
        follower.await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary.report)?);
            return Ok(());
        }

        for (turn, (actor, kind)) in summary.acted.iter().enumerate() {
            println!("{:>4}. {actor} ({kind})", turn + 1);
        }
        println!(
            "ended after {} rounds: {:?}, winner {}",
            summary.report.rounds,
            summary.report.reason,
            summary
                .report
                .winner
                .map_or_else(|| "none".to_string(), |side| side.to_string())
        );
        if summary.hit_turn_limit {
            println!("stopped at the turn limit");
        }
        if let Some(fatal) = summary.fatal {
            println!("aborted: {fatal}");
        }
        Ok(())
    }
}

/// Logs queue changes the way a rendering task would consume them.
async fn follow_queue(mut queue: broadcast::Receiver<Event>) {
    loop {
        match queue.recv().await {
            Ok(Event::Queue(QueueChange { event, snapshot })) => {
                tracing::debug!(
                    target: TARGET,
                    ?event,
                    round = snapshot.round,
                    upcoming = snapshot.upcoming.len(),
                    "queue changed"
                );
            }
            Ok(Event::Battle(_)) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(target: TARGET, skipped, "queue follower lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
