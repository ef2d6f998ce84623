//! CLI settings
//!
//! Defaults can be overridden by an optional `config/geoscore` file and by
//! `GEOSCORE_*` environment variables (a `.env` file is loaded first).
//! Command line flags take precedence over both.

use serde::Deserialize;
use std::path::PathBuf;

/// Default locations of the configuration and output files
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Feature manifest
    #[serde(default = "default_features_config")]
    pub features_config: PathBuf,

    /// Training configuration
    #[serde(default = "default_training_config")]
    pub training_config: PathBuf,

    /// Saved feature matrix read by `prepare`
    #[serde(default = "default_matrix_path")]
    pub matrix_path: PathBuf,
}

fn default_features_config() -> PathBuf {
    PathBuf::from("configs/features.yaml")
}

fn default_training_config() -> PathBuf {
    PathBuf::from("configs/training.yaml")
}

fn default_matrix_path() -> PathBuf {
    PathBuf::from("data/final/feature_matrix.csv")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            features_config: default_features_config(),
            training_config: default_training_config(),
            matrix_path: default_matrix_path(),
        }
    }
}

impl Settings {
    /// Load settings from `.env`, the config file and the environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_sources("config/geoscore")
    }

    /// Load settings from the config file at `file` (extension optional)
    /// and the environment
    pub fn from_sources(file: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("GEOSCORE"))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))
    }
}
