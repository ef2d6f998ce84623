//! geoscore Core - Core types for the municipality feature pipeline
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Value` cells
//! - `Table`, the keyed tabular unit every feature produces
//! - Delimited file reading and writing
//! - Error types

pub mod csv;
pub mod error;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use csv::{CsvOptions, Encoding};
pub use error::{CoreError, Result};
pub use table::{Column, JoinMethod, Table};
pub use types::Value;
