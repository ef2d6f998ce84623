//! YAML Parser
//!
//! Provides utilities for reading YAML documents into typed configuration.

use crate::error::{ParseError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, error};

/// YAML parser utilities
pub struct YamlParser;

impl YamlParser {
    /// Deserialize a YAML string
    pub fn parse<T: DeserializeOwned>(yaml_str: &str) -> Result<T> {
        serde_yaml::from_str(yaml_str).map_err(|e| {
            error!("Error parsing YAML config: {}", e);
            ParseError::YamlError(e)
        })
    }

    /// Read and deserialize a YAML file
    pub fn parse_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read configuration from {}", path.display());
        Self::parse(&content)
    }

    /// Fail with `InvalidValue` unless `value` has non-whitespace content
    pub fn require_non_empty(field: impl Into<String>, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ParseError::InvalidValue {
                field: field.into(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
