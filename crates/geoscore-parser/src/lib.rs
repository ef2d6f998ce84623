//! geoscore Parser - YAML configuration parser
//!
//! This crate turns the feature manifest (`features.yaml`) and the training
//! configuration (`training.yaml`) into validated, strongly typed structs.
//! Malformed documents fail here, before any component is resolved or any
//! data is read.

pub mod error;
pub mod manifest;
pub mod training;
pub mod yaml_parser;

// Re-export main parser types
pub use error::{ParseError, Result};
pub use manifest::{
    ComponentDescriptor, FeatureDescriptor, FeaturesManifest, ManifestParser, MatrixConfig,
    MissingValuesPolicy, TransformDescriptor, DEFAULT_FEATURE_MODULE, DEFAULT_TRANSFORM_MODULE,
};
pub use training::{FeatureFilteringConfig, FilterConfig, RowFilteringConfig, TrainingConfig};
pub use yaml_parser::YamlParser;
