//! Training configuration schema

use crate::error::{ParseError, Result};
use crate::yaml_parser::YamlParser;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Column selection by glob or regex pattern
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureFilteringConfig {
    /// Keep only matching columns, in pattern order
    #[serde(default)]
    pub use_features: Vec<String>,

    /// Drop matching columns from what remains
    #[serde(default)]
    pub omit_features: Vec<String>,
}

/// Row exclusion by glob or regex pattern
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowFilteringConfig {
    /// Column name to patterns; rows whose value matches any are removed
    #[serde(default)]
    pub omit_rows: IndexMap<String, Vec<String>>,
}

/// Declarative filters applied when a matrix is consumed
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub feature_filtering: FeatureFilteringConfig,

    #[serde(default)]
    pub row_filtering: RowFilteringConfig,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.feature_filtering.use_features.is_empty()
            && self.feature_filtering.omit_features.is_empty()
            && self.row_filtering.omit_rows.is_empty()
    }
}

/// Settings for turning a feature matrix into training data
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_id_column")]
    pub id_column: String,

    pub target_variable: String,

    #[serde(flatten)]
    pub filters: FilterConfig,

    #[serde(default = "default_split_ratio")]
    pub train_test_split_ratio: f64,

    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_id_column() -> String {
    "AGS".to_string()
}

fn default_split_ratio() -> f64 {
    0.8
}

fn default_random_state() -> u64 {
    42
}

impl TrainingConfig {
    /// Parse and validate a training configuration from YAML text
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let config: TrainingConfig = YamlParser::parse(yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a training configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config: TrainingConfig = YamlParser::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        YamlParser::require_non_empty("id_column", &self.id_column)?;
        YamlParser::require_non_empty("target_variable", &self.target_variable)?;

        let ratio = self.train_test_split_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ParseError::InvalidValue {
                field: "train_test_split_ratio".to_string(),
                message: format!("{} is not between 0 and 1", ratio),
            });
        }
        Ok(())
    }
}
