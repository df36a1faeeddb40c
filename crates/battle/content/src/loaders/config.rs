//! Scheduler configuration loader.

use std::path::Path;

use battle_core::SchedulerConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for scheduler configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys keep their defaults, so an empty file yields
    /// [`SchedulerConfig::default`].
    pub fn load(path: &Path) -> LoadResult<SchedulerConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse config data from a TOML string.
    pub fn parse(content: &str) -> LoadResult<SchedulerConfig> {
        let config: SchedulerConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.forecast_horizon == 0 {
            anyhow::bail!("forecast_horizon must be at least 1");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "battle_seed = 42").expect("write fixture");

        let config = ConfigLoader::load(file.path()).expect("config should load");
        assert_eq!(config.battle_seed, 42);
        assert_eq!(
            config.forecast_horizon,
            SchedulerConfig::DEFAULT_FORECAST_HORIZON
        );
        assert_eq!(
            config.projected_phases,
            SchedulerConfig::DEFAULT_PROJECTED_PHASES
        );
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let err = ConfigLoader::parse("forecast_horizon = 0").unwrap_err();
        assert!(err.to_string().contains("forecast_horizon"));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.toml");

        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
