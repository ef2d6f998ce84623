//! Feature-engineering transforms
//!
//! A transform derives one or more statistics from declared input columns and
//! returns them as a small table keyed like the feature it belongs to.

pub mod homogeneity;

pub use homogeneity::{HomogeneityFeatureEngineering, HomogeneityParams};

use crate::error::{Result, RuntimeError};
use geoscore_core::Table;
use tracing::{error, info};

/// Column-to-column transform contract
pub trait FeatureEngineering: Send + Sync {
    /// Instance name from the manifest, the class name when unnamed
    fn name(&self) -> &str;

    /// Columns that must be present in the input
    fn input_columns(&self) -> &[String];

    /// Output column, or prefix for multiple outputs
    fn output_column(&self) -> &str;

    /// Required columns absent from `table`. Implementations that need more
    /// than `input_columns` override this.
    fn missing_columns(&self, table: &Table) -> Vec<String> {
        absent_columns(table, self.input_columns())
    }

    /// Check the table before applying
    fn validate(&self, table: &Table) -> bool {
        let missing = self.missing_columns(table);
        if !missing.is_empty() {
            error!(
                "Missing required input columns for transformation '{}': {:?}",
                self.name(),
                missing
            );
            return false;
        }
        true
    }

    /// Validate, then compute on a copy of `table`. A transform without
    /// input columns is rejected.
    fn apply(&self, table: &Table) -> Result<Table> {
        info!("Applying transformation '{}'", self.name());
        if self.input_columns().is_empty() {
            error!("Transformation '{}' declares no input columns", self.name());
            return Err(RuntimeError::InvalidParams {
                component: self.name().to_string(),
                message: "at least one input column is required".to_string(),
            });
        }
        if !self.validate(table) {
            return Err(RuntimeError::Validation {
                transform: self.name().to_string(),
                missing: self.missing_columns(table),
            });
        }
        self.compute(table.clone())
    }

    /// The transformation itself; only called on validated input
    fn compute(&self, table: Table) -> Result<Table>;
}

/// Names from `required` that `table` does not have, in order
pub fn absent_columns<S: AsRef<str>>(table: &Table, required: &[S]) -> Vec<String> {
    required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !table.has_column(name))
        .map(str::to_string)
        .collect()
}
