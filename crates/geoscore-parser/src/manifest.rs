//! Feature manifest schema
//!
//! A manifest names the base municipalities feature, the list of features to
//! join onto it and the matrix settings:
//!
//! ```yaml
//! municipalities:
//!   class: MunicipalityFeature
//!   params:
//!     data_path: data/raw/municipalities.csv
//!
//! features:
//!   - name: births
//!     class: BirthsFeature
//!     params:
//!       data_path: data/raw/births.csv
//!     before_transforms:
//!       - name: births_homogeneity
//!         class: HomogeneityFeatureEngineering
//!         input_columns: [births]
//!         output_column: births_cv
//!         params:
//!           weight_column: Persons
//!
//! matrix:
//!   join_key: AGS
//!   missing_values: fill
//!   fill_value: -999
//! ```

use crate::error::{ParseError, Result};
use crate::yaml_parser::YamlParser;
use geoscore_core::{JoinMethod, Value};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Module path used when a feature descriptor does not name one
pub const DEFAULT_FEATURE_MODULE: &str = "geoscore_runtime::features";

/// Module path used when a transform descriptor does not name one
pub const DEFAULT_TRANSFORM_MODULE: &str = "geoscore_runtime::feature_engineering";

const DEFAULT_MUNICIPALITIES_NAME: &str = "municipalities";

/// Reference to a registered component plus its constructor parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDescriptor {
    /// Unique name of the component instance
    #[serde(default)]
    pub name: String,

    /// Registered class name
    #[serde(rename = "class", alias = "class_name")]
    pub class_name: String,

    /// Module the class is registered under
    #[serde(default)]
    pub module: Option<String>,

    /// Named constructor parameters
    #[serde(default)]
    pub params: serde_yaml::Mapping,
}

impl ComponentDescriptor {
    fn module_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.module.as_deref().unwrap_or(default)
    }
}

/// Feature entry of the manifest
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "FeatureEntry")]
pub struct FeatureDescriptor {
    pub component: ComponentDescriptor,

    /// Transforms run against the loaded table, merged onto the transformed one
    pub before_transforms: Vec<TransformDescriptor>,

    /// Transforms run against the transformed table
    pub after_transforms: Vec<TransformDescriptor>,
}

impl FeatureDescriptor {
    pub fn name(&self) -> &str {
        &self.component.name
    }

    pub fn module_path(&self) -> &str {
        self.component.module_or(DEFAULT_FEATURE_MODULE)
    }
}

/// Feature-engineering entry nested under a feature
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "TransformEntry")]
pub struct TransformDescriptor {
    pub component: ComponentDescriptor,

    /// Columns that must be present for the transform to run
    pub input_columns: Vec<String>,

    /// Output column name, or prefix when several outputs are produced
    pub output_column: String,
}

impl TransformDescriptor {
    pub fn name(&self) -> &str {
        &self.component.name
    }

    pub fn module_path(&self) -> &str {
        self.component.module_or(DEFAULT_TRANSFORM_MODULE)
    }
}

// Flat on-disk shapes of the descriptors. serde cannot deny unknown keys
// through `flatten`, so entries are read flat and regrouped.

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FeatureEntry {
    #[serde(default)]
    name: String,
    #[serde(rename = "class", alias = "class_name")]
    class_name: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    params: serde_yaml::Mapping,
    #[serde(default)]
    before_transforms: Vec<TransformDescriptor>,
    #[serde(default)]
    after_transforms: Vec<TransformDescriptor>,
}

impl From<FeatureEntry> for FeatureDescriptor {
    fn from(entry: FeatureEntry) -> Self {
        Self {
            component: ComponentDescriptor {
                name: entry.name,
                class_name: entry.class_name,
                module: entry.module,
                params: entry.params,
            },
            before_transforms: entry.before_transforms,
            after_transforms: entry.after_transforms,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TransformEntry {
    #[serde(default)]
    name: String,
    #[serde(rename = "class", alias = "class_name")]
    class_name: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    params: serde_yaml::Mapping,
    #[serde(default)]
    input_columns: Vec<String>,
    #[serde(default)]
    output_column: String,
}

impl From<TransformEntry> for TransformDescriptor {
    fn from(entry: TransformEntry) -> Self {
        Self {
            component: ComponentDescriptor {
                name: entry.name,
                class_name: entry.class_name,
                module: entry.module,
                params: entry.params,
            },
            input_columns: entry.input_columns,
            output_column: entry.output_column,
        }
    }
}

/// Missing value handling after all features are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuesPolicy {
    /// Leave nulls in place
    #[default]
    None,
    /// Remove every row holding at least one null
    Drop,
    /// Replace nulls with `fill_value`
    Fill,
}

/// Matrix construction settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixConfig {
    #[serde(default = "default_join_key")]
    pub join_key: String,

    #[serde(default)]
    pub join_method: JoinMethod,

    #[serde(
        default,
        alias = "missing_values_policy",
        deserialize_with = "null_as_default"
    )]
    pub missing_values: MissingValuesPolicy,

    #[serde(default = "default_fill_value")]
    pub fill_value: Value,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    #[serde(default = "default_save_output")]
    pub save_output: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            join_key: default_join_key(),
            join_method: JoinMethod::default(),
            missing_values: MissingValuesPolicy::default(),
            fill_value: default_fill_value(),
            output_path: default_output_path(),
            save_output: default_save_output(),
        }
    }
}

fn default_join_key() -> String {
    "AGS".to_string()
}

fn default_fill_value() -> Value {
    Value::Number(0.0)
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/final/feature_matrix.csv")
}

fn default_save_output() -> bool {
    true
}

/// An explicit `null` selects the default instead of failing
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Complete feature manifest
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesManifest {
    /// Base feature defining the rows of the matrix
    pub municipalities: FeatureDescriptor,

    #[serde(default)]
    pub features: Vec<FeatureDescriptor>,

    #[serde(default)]
    pub matrix: MatrixConfig,
}

impl FeaturesManifest {
    /// Check the constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        YamlParser::require_non_empty("matrix.join_key", &self.matrix.join_key)?;

        if self.matrix.missing_values == MissingValuesPolicy::Fill && self.matrix.fill_value.is_null() {
            return Err(ParseError::InvalidValue {
                field: "matrix.fill_value".to_string(),
                message: "a fill value is required when missing_values is 'fill'".to_string(),
            });
        }

        validate_descriptor("municipalities", &self.municipalities)?;

        let mut seen = HashSet::new();
        for (i, feature) in self.features.iter().enumerate() {
            let field = format!("features[{}]", i);
            YamlParser::require_non_empty(format!("{}.name", field), feature.name())?;
            validate_descriptor(&field, feature)?;

            if feature.name() == self.municipalities.name() {
                return Err(ParseError::InvalidValue {
                    field: format!("{}.name", field),
                    message: format!("'{}' is reserved for the base feature", feature.name()),
                });
            }
            if !seen.insert(feature.name()) {
                return Err(ParseError::InvalidValue {
                    field: format!("{}.name", field),
                    message: format!("duplicate feature name '{}'", feature.name()),
                });
            }
        }

        Ok(())
    }

    fn apply_defaults(&mut self) {
        if self.municipalities.component.name.trim().is_empty() {
            self.municipalities.component.name = DEFAULT_MUNICIPALITIES_NAME.to_string();
        }
    }
}

fn validate_descriptor(field: &str, feature: &FeatureDescriptor) -> Result<()> {
    YamlParser::require_non_empty(format!("{}.class", field), &feature.component.class_name)?;

    let transforms = feature
        .before_transforms
        .iter()
        .enumerate()
        .map(|(i, t)| ("before_transforms", i, t))
        .chain(
            feature
                .after_transforms
                .iter()
                .enumerate()
                .map(|(i, t)| ("after_transforms", i, t)),
        );

    for (list, i, transform) in transforms {
        let prefix = format!("{}.{}[{}]", field, list, i);
        YamlParser::require_non_empty(format!("{}.name", prefix), transform.name())?;
        YamlParser::require_non_empty(format!("{}.class", prefix), &transform.component.class_name)?;
        if transform.input_columns.is_empty() {
            return Err(ParseError::MissingField {
                field: format!("{}.input_columns", prefix),
            });
        }
        if transform.output_column.trim().is_empty() {
            return Err(ParseError::MissingField {
                field: format!("{}.output_column", prefix),
            });
        }
    }

    Ok(())
}

/// Feature manifest parser
pub struct ManifestParser;

impl ManifestParser {
    /// Parse and validate a manifest from YAML text
    pub fn parse(yaml_str: &str) -> Result<FeaturesManifest> {
        let mut manifest: FeaturesManifest = YamlParser::parse(yaml_str)?;
        manifest.apply_defaults();
        manifest.validate()?;
        debug!(
            "Parsed manifest with {} feature(s), join key '{}'",
            manifest.features.len(),
            manifest.matrix.join_key
        );
        Ok(manifest)
    }

    /// Parse and validate a manifest file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<FeaturesManifest> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }
}
