//! Server configuration

use anyhow::{Context, Result};
use eta_lib::predictor::DEFAULT_MODEL_PATH;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Path to the trained pipeline artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the form, JSON API and health/metrics endpoints
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `ETA_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ETA").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid ETA_* configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
