//! Configuration management for the CLI

use anyhow::{Context, Result};
use eta_lib::predictor::DEFAULT_MODEL_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Path to the trained pipeline artifact
    pub model_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the user's config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("delivery-eta").join("config.json"))
    }
}

/// Pick the artifact path: explicit flag or env, then config file, then default
pub fn model_path(override_path: Option<PathBuf>, config: &Config) -> PathBuf {
    override_path
        .or_else(|| config.model_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.model_path.is_none());
        assert_eq!(
            model_path(None, &config),
            PathBuf::from("models/best_model.json")
        );
    }

    #[test]
    fn test_model_path_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model_path": "/srv/eta/model.json"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            model_path(None, &config),
            PathBuf::from("/srv/eta/model.json")
        );
        assert_eq!(
            model_path(Some(PathBuf::from("local.json")), &config),
            PathBuf::from("local.json")
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
