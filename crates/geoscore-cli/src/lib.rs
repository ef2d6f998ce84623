//! geoscore command line
//!
//! Thin wrapper over `geoscore-sdk`: `build-matrix` assembles the feature
//! matrix from a manifest, `prepare` filters and splits a saved matrix for
//! training.

pub mod commands;
pub mod settings;

pub use settings::Settings;
