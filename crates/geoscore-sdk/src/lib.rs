//! geoscore SDK
//!
//! High-level entry points: [`FeatureMatrixBuilder`] assembles the
//! municipality feature matrix from a manifest, the [`filtering`] module
//! narrows a matrix by column and row patterns, and [`training`] turns it
//! into a seeded train/test split.
//!
//! # Example
//!
//! ```rust,ignore
//! use geoscore_sdk::FeatureMatrixBuilder;
//!
//! let builder = FeatureMatrixBuilder::new("configs/features.yaml")?;
//! let matrix = builder.build_matrix()?;
//! println!("{:?}", matrix.shape());
//! ```

pub mod builder;
pub mod error;
pub mod filtering;
pub mod training;

pub use builder::FeatureMatrixBuilder;
pub use error::{Result, SdkError};
pub use filtering::{apply_filters, filter_features, filter_rows, FilterWarning, Filtered};
pub use training::{prepare_training_data, TrainingData};

// Re-export commonly used types
pub use geoscore_core::{Table, Value};
pub use geoscore_parser::{FeaturesManifest, FilterConfig, TrainingConfig};
pub use geoscore_runtime::{ComponentRegistry, ConfiguredFeature};
