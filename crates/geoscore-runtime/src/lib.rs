//! geoscore Runtime - feature components
//!
//! This crate provides the two component kinds the matrix pipeline is built
//! from, `Feature` data sources and `FeatureEngineering` transforms, the
//! built-in implementations of both, and the `ComponentRegistry` that turns
//! manifest descriptors into live instances.

pub mod archive;
pub mod error;
pub mod feature;
pub mod feature_engineering;
pub mod features;
pub mod registry;

pub use error::{Result, RuntimeError};
pub use feature::{ConfiguredFeature, Feature};
pub use feature_engineering::{FeatureEngineering, HomogeneityFeatureEngineering};
pub use registry::ComponentRegistry;
