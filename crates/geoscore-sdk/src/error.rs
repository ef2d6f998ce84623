//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Manifest or training configuration error
    #[error("Parser error: {0}")]
    ParseError(#[from] geoscore_parser::ParseError),

    /// Component resolution or feature processing error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] geoscore_runtime::RuntimeError),

    /// Table operation error
    #[error("Table error: {0}")]
    TableError(#[from] geoscore_core::CoreError),

    /// Nothing to build a matrix from
    #[error("No features loaded")]
    NoFeatures,

    /// A feature table lacks the join key
    #[error("Join key '{join_key}' not found in output of feature '{feature}'")]
    MissingJoinKey { feature: String, join_key: String },

    /// Training data could not be prepared
    #[error("Training data error: {0}")]
    TrainingData(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
