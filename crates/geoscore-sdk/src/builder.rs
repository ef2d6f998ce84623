//! Feature matrix assembly
//!
//! The builder resolves the manifest once, up front. Building the matrix then
//! loads the municipality base table, runs every feature through its
//! load/transform pipeline, namespaces the feature columns and merges them
//! onto the base on the join key.

use crate::error::{Result, SdkError};
use geoscore_core::csv::write_csv;
use geoscore_core::Table;
use geoscore_parser::{FeaturesManifest, ManifestParser, MatrixConfig, MissingValuesPolicy};
use geoscore_runtime::{ComponentRegistry, ConfiguredFeature};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Builds the municipality feature matrix described by a manifest
///
/// # Example
///
/// ```rust,ignore
/// use geoscore_sdk::FeatureMatrixBuilder;
///
/// let matrix = FeatureMatrixBuilder::new("configs/features.yaml")?
///     .with_output_path("data/final/matrix.csv")
///     .build_matrix()?;
/// ```
pub struct FeatureMatrixBuilder {
    matrix: MatrixConfig,
    municipalities: ConfiguredFeature,
    features: IndexMap<String, ConfiguredFeature>,
}

impl FeatureMatrixBuilder {
    /// Read the manifest at `config_path` and resolve it against the built-in
    /// components
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        info!("Loading feature manifest from {}", config_path.display());
        let manifest = ManifestParser::parse_file(config_path)?;
        Self::from_manifest(manifest, &ComponentRegistry::with_builtins())
    }

    /// Resolve an already parsed manifest against `registry`.
    ///
    /// A base feature that cannot be resolved is an error. Other features
    /// that fail to resolve are logged and left out.
    pub fn from_manifest(manifest: FeaturesManifest, registry: &ComponentRegistry) -> Result<Self> {
        let join_key = manifest.matrix.join_key.as_str();
        let municipalities = registry.resolve_feature(&manifest.municipalities, join_key)?;

        let mut features = IndexMap::new();
        for descriptor in &manifest.features {
            match registry.resolve_feature(descriptor, join_key) {
                Ok(feature) => {
                    features.insert(descriptor.name().to_string(), feature);
                }
                Err(e) => {
                    error!("Skipping feature '{}': {}", descriptor.name(), e);
                }
            }
        }

        if features.is_empty() {
            warn!("No features were resolved from the manifest");
        } else {
            info!("Resolved {} of {} feature(s)", features.len(), manifest.features.len());
        }

        Ok(Self {
            matrix: manifest.matrix,
            municipalities,
            features,
        })
    }

    /// Write the matrix to `path` instead of the configured output path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.matrix.output_path = path.into();
        self
    }

    /// Enable or disable writing the matrix after building it
    pub fn with_save_output(mut self, save: bool) -> Self {
        self.matrix.save_output = save;
        self
    }

    /// Matrix settings in effect
    pub fn matrix_config(&self) -> &MatrixConfig {
        &self.matrix
    }

    /// The resolved base feature
    pub fn municipalities(&self) -> &ConfiguredFeature {
        &self.municipalities
    }

    /// Names of the resolved features, in manifest order
    pub fn get_feature_names(&self) -> Vec<&str> {
        self.features.keys().map(String::as_str).collect()
    }

    /// Look up a resolved feature by name
    pub fn get_feature(&self, name: &str) -> Option<&ConfiguredFeature> {
        self.features.get(name)
    }

    /// Build the feature matrix.
    ///
    /// Every feature table must carry the join key. Non-key columns are
    /// prefixed with the feature name, then each table is merged onto the
    /// base with the configured join method and the missing-value policy is
    /// applied. The result is written to the output path when saving is
    /// enabled.
    pub fn build_matrix(&self) -> Result<Table> {
        if self.features.is_empty() {
            return Err(SdkError::NoFeatures);
        }
        let join_key = self.matrix.join_key.as_str();

        let mut feature_tables = Vec::with_capacity(self.features.len());
        for (name, feature) in &self.features {
            info!("Processing feature: {}", name);
            let table = feature.load_transform()?;
            let table = namespace_columns(name, table, join_key)?;
            info!("Feature '{}' produced {:?}", name, table.shape());
            feature_tables.push(table);
        }

        info!("Loading base table '{}'", self.municipalities.name());
        let mut matrix = self.municipalities.load_transform()?;
        require_join_key(self.municipalities.name(), &matrix, join_key)?;

        for table in &feature_tables {
            matrix = matrix.merge(table, join_key, self.matrix.join_method)?;
        }

        let matrix = self.apply_missing_values(matrix)?;
        info!("Built feature matrix with shape {:?}", matrix.shape());

        if self.matrix.save_output {
            write_csv(&matrix, &self.matrix.output_path)?;
            info!("Saved feature matrix to {}", self.matrix.output_path.display());
        }

        Ok(matrix)
    }

    fn apply_missing_values(&self, matrix: Table) -> Result<Table> {
        match self.matrix.missing_values {
            MissingValuesPolicy::None => Ok(matrix),
            MissingValuesPolicy::Drop => {
                let kept = matrix.drop_nulls(None)?;
                info!("Dropped {} row(s) with missing values", matrix.num_rows() - kept.num_rows());
                Ok(kept)
            }
            MissingValuesPolicy::Fill => {
                info!("Filling {} missing value(s) with {}", matrix.null_count(), self.matrix.fill_value);
                Ok(matrix.fill_nulls(&self.matrix.fill_value))
            }
        }
    }
}

fn require_join_key(feature: &str, table: &Table, join_key: &str) -> Result<()> {
    if table.has_column(join_key) {
        return Ok(());
    }
    error!("Join key '{}' not found in {} table", join_key, feature);
    Err(SdkError::MissingJoinKey {
        feature: feature.to_string(),
        join_key: join_key.to_string(),
    })
}

/// Prefix every column except the join key with `{feature}_`
fn namespace_columns(feature: &str, table: Table, join_key: &str) -> Result<Table> {
    require_join_key(feature, &table, join_key)?;
    Ok(table.rename_with(|column| (column != join_key).then(|| format!("{}_{}", feature, column)))?)
}

impl std::fmt::Debug for FeatureMatrixBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureMatrixBuilder")
            .field("matrix", &self.matrix)
            .field("municipalities", &self.municipalities.name())
            .field("features", &self.get_feature_names())
            .finish()
    }
}
