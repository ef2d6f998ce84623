//! Runtime error types

use geoscore_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No components are registered under the module path
    #[error("Cannot resolve module '{module}'")]
    ModuleResolution { module: String },

    /// The module exists but has no such class
    #[error("Module '{module}' has no component '{class}'")]
    ComponentNotFound { module: String, class: String },

    /// Constructor parameters are unknown or ill-typed
    #[error("Invalid parameters for '{component}': {message}")]
    InvalidParams { component: String, message: String },

    /// Raw data for a feature could not be loaded
    #[error("Could not load feature '{feature}': {source}")]
    FeatureLoad {
        feature: String,
        #[source]
        source: Box<RuntimeError>,
    },

    /// A loaded feature could not be transformed
    #[error("Could not transform feature '{feature}': {source}")]
    FeatureTransform {
        feature: String,
        #[source]
        source: Box<RuntimeError>,
    },

    /// A transform's input table lacks required columns
    #[error("Validation failed for transform '{transform}', missing columns: {missing:?}")]
    Validation {
        transform: String,
        missing: Vec<String>,
    },

    /// A transform output column already exists on the feature table
    #[error("Column '{column}' from transform '{transform}' collides with an existing column")]
    ColumnCollision { transform: String, column: String },

    /// A data file could not be read
    #[error("Failed to read data source {path}: {source}")]
    DataSource {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    /// Archive download failed
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Archive could not be opened or extracted
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Table operation error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
