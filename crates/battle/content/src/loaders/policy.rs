//! Battle-system policy loader.

use std::path::Path;

use battle_core::SchedulerPolicy;

use crate::loaders::{LoadResult, read_file};

/// Loader for scheduler policies from TOML files or preset names.
pub struct PolicyLoader;

impl PolicyLoader {
    /// Load a policy from a TOML file.
    ///
    /// A file may start from a preset with a top-level `preset = "<name>"` key;
    /// the remaining keys then override the preset's fields.
    ///
    /// ```toml
    /// preset = "brave"
    /// interrupt_priority = "deferred"
    ///
    /// [resource_model]
    /// max_claims_per_turn = 2
    /// ```
    pub fn load(path: &Path) -> LoadResult<SchedulerPolicy> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a policy from a TOML string.
    pub fn parse(content: &str) -> LoadResult<SchedulerPolicy> {
        let mut table: toml::Table = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse policy TOML: {}", e))?;

        let Some(preset) = table.remove("preset") else {
            let policy: SchedulerPolicy = toml::Value::Table(table)
                .try_into()
                .map_err(|e| anyhow::anyhow!("Failed to parse policy TOML: {}", e))?;
            return validated(policy);
        };

        let name = preset
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Policy preset must be a string, got {}", preset))?;
        let base = Self::preset(name)?;

        let toml::Value::Table(mut merged) = toml::Value::try_from(&base)
            .map_err(|e| anyhow::anyhow!("Failed to encode preset '{}': {}", name, e))?
        else {
            anyhow::bail!("Preset '{}' did not encode as a table", name);
        };
        merge_tables(&mut merged, table);

        let policy: SchedulerPolicy = toml::Value::Table(merged)
            .try_into()
            .map_err(|e| anyhow::anyhow!("Failed to apply overrides to preset '{}': {}", name, e))?;
        validated(policy)
    }

    /// Look up a built-in policy by name.
    pub fn preset(name: &str) -> LoadResult<SchedulerPolicy> {
        SchedulerPolicy::preset(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown policy preset '{}' (expected standard, brave, free_turn or order_turn)",
                name
            )
        })
    }
}

fn validated(policy: SchedulerPolicy) -> LoadResult<SchedulerPolicy> {
    if let Some(model) = &policy.resource_model {
        model
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid resource model: {}", e))?;
    }
    Ok(policy)
}

/// Overlays `overrides` onto `base`, descending into nested tables.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
