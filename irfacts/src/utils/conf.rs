//! Session configuration, persisted as TOML.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    mutation::IdentityPolicy,
    utils::error::{FactError, FactResult},
};

/// What the session does when the diff sink fails to persist an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistenceFailurePolicy {
    /// Log the failure, count it in the report and keep going.
    #[default]
    Continue,
    /// Stop the session with the persistence error.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Highest iteration index that is extracted and persisted.
    pub iteration_budget: usize,

    /// Seed of the random source used to pick among applicable rewrite rules.
    pub seed: u64,

    pub identity_policy: IdentityPolicy,

    pub persistence_failure: PersistenceFailurePolicy,

    /// Root directory of the per-iteration diff files, if persisted to disk.
    pub output_dir: Option<PathBuf>,
}

impl SessionConfig {
    pub const DEFAULT_ITERATION_BUDGET: usize = 1000;
    pub const DEFAULT_SEED: u64 = 1_563_540_296_429;

    pub fn from_toml_str(content: &str) -> FactResult<Self> {
        toml::from_str(content).map_err(|e| FactError::ConfigParse {
            source: e,
            file: "<inline>".to_string(),
        })
    }

    /// Load a configuration from a TOML file. Missing keys take their default.
    pub fn load_from_toml(path: &Path) -> FactResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FactError::ConfigParse {
            source: e,
            file: path.display().to_string(),
        })
    }

    pub fn save_to_toml(&self, path: &Path) -> FactResult<()> {
        let content = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            iteration_budget: Self::DEFAULT_ITERATION_BUDGET,
            seed: Self::DEFAULT_SEED,
            identity_policy: IdentityPolicy::default(),
            persistence_failure: PersistenceFailurePolicy::default(),
            output_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = SessionConfig::from_toml_str("iteration_budget = 3").unwrap();
        assert_eq!(config.iteration_budget, 3);
        assert_eq!(config.seed, SessionConfig::DEFAULT_SEED);
        assert_eq!(config.identity_policy, IdentityPolicy::Fresh);
        assert_eq!(config.persistence_failure, PersistenceFailurePolicy::Continue);
    }

    #[test]
    fn policies_use_kebab_case() {
        let config = SessionConfig::from_toml_str(
            "identity_policy = \"preserve\"\npersistence_failure = \"abort\"\noutput_dir = \"out\"",
        )
        .unwrap();
        assert_eq!(config.identity_policy, IdentityPolicy::Preserve);
        assert_eq!(config.persistence_failure, PersistenceFailurePolicy::Abort);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = SessionConfig::from_toml_str("persistence_failure = \"retry\"").unwrap_err();
        assert!(matches!(err, FactError::ConfigParse { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");
        let config = SessionConfig {
            iteration_budget: 12,
            seed: 7,
            ..SessionConfig::default()
        };
        config.save_to_toml(&path).unwrap();
        assert_eq!(SessionConfig::load_from_toml(&path).unwrap(), config);
    }
}
