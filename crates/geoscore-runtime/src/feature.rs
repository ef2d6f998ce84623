//! Feature data sources
//!
//! A `Feature` loads raw data and turns it into a table keyed by the
//! municipality code. `ConfiguredFeature` binds one to its manifest name and
//! to the feature-engineering transforms listed for it, and runs the whole
//! load, transform and merge sequence.

use crate::error::{Result, RuntimeError};
use crate::feature_engineering::FeatureEngineering;
use geoscore_core::{CoreError, JoinMethod, Table};
use tracing::{debug, info};

/// Two-phase data source contract
pub trait Feature: Send + Sync {
    /// Registered class name
    fn kind(&self) -> &str;

    /// Read the raw data
    fn load(&self) -> Result<Table>;

    /// Turn raw data into a keyed feature table
    fn transform(&self, table: Table) -> Result<Table>;
}

/// A resolved feature with its nested transforms
pub struct ConfiguredFeature {
    name: String,
    feature: Box<dyn Feature>,
    join_key: String,
    before_transforms: Vec<Box<dyn FeatureEngineering>>,
    after_transforms: Vec<Box<dyn FeatureEngineering>>,
}

impl ConfiguredFeature {
    pub fn new(name: impl Into<String>, feature: Box<dyn Feature>, join_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feature,
            join_key: join_key.into(),
            before_transforms: Vec::new(),
            after_transforms: Vec::new(),
        }
    }

    /// Transforms run against the loaded table
    pub fn with_before_transforms(mut self, transforms: Vec<Box<dyn FeatureEngineering>>) -> Self {
        self.before_transforms = transforms;
        self
    }

    /// Transforms run against the transformed table
    pub fn with_after_transforms(mut self, transforms: Vec<Box<dyn FeatureEngineering>>) -> Self {
        self.after_transforms = transforms;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        self.feature.kind()
    }

    pub fn join_key(&self) -> &str {
        &self.join_key
    }

    pub fn before_transforms(&self) -> &[Box<dyn FeatureEngineering>] {
        &self.before_transforms
    }

    pub fn after_transforms(&self) -> &[Box<dyn FeatureEngineering>] {
        &self.after_transforms
    }

    /// Load raw data, wrapping failures as `FeatureLoad`
    pub fn load(&self) -> Result<Table> {
        self.feature.load().map_err(|e| RuntimeError::FeatureLoad {
            feature: self.name.clone(),
            source: Box::new(e),
        })
    }

    /// Load, transform and merge transform outputs.
    ///
    /// Before-transforms see the loaded table; their keyed outputs are
    /// left-merged onto the result of `transform` in registration order.
    /// After-transforms then see the merged table and are merged the same way.
    pub fn load_transform(&self) -> Result<Table> {
        let loaded = self.load()?;
        debug!(
            "Loaded feature '{}' with shape {:?}",
            self.name,
            loaded.shape()
        );

        let mut engineered = Vec::with_capacity(self.before_transforms.len());
        for transform in &self.before_transforms {
            engineered.push((transform.name(), transform.apply(&loaded)?));
        }

        let mut table = self
            .feature
            .transform(loaded)
            .map_err(|e| RuntimeError::FeatureTransform {
                feature: self.name.clone(),
                source: Box::new(e),
            })?;

        for (transform, output) in engineered {
            table = self.merge_output(table, transform, &output)?;
        }

        for transform in &self.after_transforms {
            let output = transform.apply(&table)?;
            table = self.merge_output(table, transform.name(), &output)?;
        }

        info!(
            "Feature '{}' produced table with shape {:?}",
            self.name,
            table.shape()
        );
        Ok(table)
    }

    fn merge_output(&self, table: Table, transform: &str, output: &Table) -> Result<Table> {
        table
            .merge(output, &self.join_key, JoinMethod::Left)
            .map_err(|e| match e {
                CoreError::ColumnCollision(column) => RuntimeError::ColumnCollision {
                    transform: transform.to_string(),
                    column,
                },
                other => RuntimeError::Core(other),
            })
    }
}

impl std::fmt::Debug for ConfiguredFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredFeature")
            .field("name", &self.name)
            .field("kind", &self.feature.kind())
            .field("join_key", &self.join_key)
            .field("before_transforms", &self.before_transforms.len())
            .field("after_transforms", &self.after_transforms.len())
            .finish()
    }
}
