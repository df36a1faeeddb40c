//! Content loaders for reading battle data from files.

pub mod config;
pub mod policy;
pub mod roster;
pub mod setup;

pub use config::ConfigLoader;
pub use policy::PolicyLoader;
pub use roster::RosterLoader;
pub use setup::BattleSetup;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

const TARGET: &str = "battle_content::loaders";

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    tracing::trace!(target: TARGET, path = %path.display(), "reading content file");
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
