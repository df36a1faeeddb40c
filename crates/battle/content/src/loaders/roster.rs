//! Combatant roster loader.

use std::collections::HashSet;
use std::path::Path;

use battle_core::{CombatantSnapshot, SchedulerConfig};

use crate::loaders::{LoadResult, read_file};

/// Loader for combatant rosters from RON files.
pub struct RosterLoader;

impl RosterLoader {
    /// Load a roster from a RON file.
    ///
    /// RON format: `Vec<CombatantSnapshot>`. `modifiers`, `alive` and `side`
    /// may be omitted (no modifiers, alive, party).
    ///
    /// ```ron
    /// [
    ///     (id: (1), agility: 24, side: Party),
    ///     (id: (11), agility: 18, side: Troop, modifiers: [
    ///         (layer: Status, bonus: More(50)),
    ///     ]),
    /// ]
    /// ```
    pub fn load(path: &Path) -> LoadResult<Vec<CombatantSnapshot>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a roster from a RON string.
    ///
    /// Rejects rosters the scheduler would refuse anyway (duplicate ids, too
    /// many combatants) so the error points at the file instead of the battle.
    pub fn parse(content: &str) -> LoadResult<Vec<CombatantSnapshot>> {
        let roster: Vec<CombatantSnapshot> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;

        if roster.len() > SchedulerConfig::MAX_COMBATANTS {
            anyhow::bail!(
                "Roster has {} combatants, at most {} are allowed",
                roster.len(),
                SchedulerConfig::MAX_COMBATANTS
            );
        }

        let mut seen = HashSet::with_capacity(roster.len());
        for snapshot in &roster {
            if !seen.insert(snapshot.id) {
                anyhow::bail!("Roster lists combatant {} more than once", snapshot.id);
            }
        }

        Ok(roster)
    }
}
