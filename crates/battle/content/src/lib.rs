//! Data-driven battle setup.
//!
//! This crate reads battle data files into `battle-core` types:
//! - Scheduler configuration (TOML)
//! - Battle-system policies (TOML, or a named preset)
//! - Combatant rosters (RON)
//!
//! Nothing here runs a battle; the runtime and the simulator hand the loaded
//! values to a [`battle_core::Scheduler`].

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{BattleSetup, ConfigLoader, LoadResult, PolicyLoader, RosterLoader};
