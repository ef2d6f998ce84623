//! Weighted coefficient of variation per municipality
//!
//! Source rows below municipality level (districts, polling stations) are
//! grouped by municipality code. For every group with at least two rows the
//! transform computes a weighted CV per input column and emits the mean of
//! the defined CVs.

use super::{absent_columns, FeatureEngineering};
use crate::error::Result;
use crate::registry::parse_params;
use geoscore_core::{Table, Value};
use geoscore_parser::TransformDescriptor;
use serde::Deserialize;

/// Constructor parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HomogeneityParams {
    /// Column holding the weight of each row, usually a population count
    pub weight_column: String,

    /// Column rows are grouped by
    #[serde(default = "default_group_column")]
    pub group_column: String,
}

fn default_group_column() -> String {
    "AGS".to_string()
}

/// Population-weighted homogeneity of one or more columns
#[derive(Debug, Clone)]
pub struct HomogeneityFeatureEngineering {
    name: String,
    input_columns: Vec<String>,
    output_column: String,
    weight_column: String,
    group_column: String,
}

impl HomogeneityFeatureEngineering {
    pub const NAME: &'static str = "HomogeneityFeatureEngineering";

    pub fn new(
        input_columns: Vec<String>,
        output_column: impl Into<String>,
        weight_column: impl Into<String>,
    ) -> Self {
        Self {
            name: Self::NAME.to_string(),
            input_columns,
            output_column: output_column.into(),
            weight_column: weight_column.into(),
            group_column: default_group_column(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_group_column(mut self, group_column: impl Into<String>) -> Self {
        self.group_column = group_column.into();
        self
    }

    /// Build from a manifest entry, named after it
    pub fn from_descriptor(descriptor: &TransformDescriptor) -> Result<Self> {
        let params: HomogeneityParams = parse_params(Self::NAME, &descriptor.component.params)?;
        let mut transform = Self::new(
            descriptor.input_columns.clone(),
            descriptor.output_column.clone(),
            params.weight_column,
        )
        .with_group_column(params.group_column);
        if !descriptor.name().is_empty() {
            transform = transform.with_name(descriptor.name());
        }
        Ok(transform)
    }

    pub fn weight_column(&self) -> &str {
        &self.weight_column
    }

    pub fn group_column(&self) -> &str {
        &self.group_column
    }
}

/// Weighted CV of `values`. Undefined (`None`) when any value or weight is
/// missing, the weights do not sum to a positive number, every value is zero
/// or the weighted mean is zero.
pub fn weighted_cv(values: &[Option<f64>], weights: &[Option<f64>]) -> Option<f64> {
    let values: Vec<f64> = values.iter().copied().collect::<Option<_>>()?;
    let weights: Vec<f64> = weights.iter().copied().collect::<Option<_>>()?;

    let total: f64 = weights.iter().sum();
    if total <= 0.0 || values.iter().all(|v| *v == 0.0) {
        return None;
    }

    let mean = values.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>() / total;
    if mean == 0.0 {
        return None;
    }

    let variance = values
        .iter()
        .zip(&weights)
        .map(|(v, w)| w * (v - mean).powi(2))
        .sum::<f64>()
        / total;

    let cv = variance.sqrt() / mean;
    cv.is_finite().then_some(cv)
}

impl FeatureEngineering for HomogeneityFeatureEngineering {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    fn output_column(&self) -> &str {
        &self.output_column
    }

    fn missing_columns(&self, table: &Table) -> Vec<String> {
        let mut missing = absent_columns(table, &self.input_columns);
        for extra in [&self.weight_column, &self.group_column] {
            if !table.has_column(extra) && !missing.contains(extra) {
                missing.push(extra.clone());
            }
        }
        missing
    }

    fn compute(&self, table: Table) -> Result<Table> {
        let weights = table.require_column(&self.weight_column)?;
        let inputs = self
            .input_columns
            .iter()
            .map(|name| table.require_column(name))
            .collect::<geoscore_core::Result<Vec<_>>>()?;

        let mut keys = Vec::new();
        let mut scores = Vec::new();

        for (key, rows) in table.group_indices(&self.group_column)? {
            // a single row has no spread to measure
            if rows.len() < 2 {
                continue;
            }

            let group_weights: Vec<Option<f64>> = rows.iter().map(|&r| weights[r].as_f64()).collect();
            let cvs: Vec<f64> = inputs
                .iter()
                .filter_map(|column| {
                    let values: Vec<Option<f64>> = rows.iter().map(|&r| column[r].as_f64()).collect();
                    weighted_cv(&values, &group_weights)
                })
                .collect();

            keys.push(key);
            scores.push(if cvs.is_empty() {
                Value::Null
            } else {
                Value::number(cvs.iter().sum::<f64>() / cvs.len() as f64)
            });
        }

        Ok(Table::from_columns(vec![
            (self.group_column.clone(), keys),
            (self.output_column.clone(), scores),
        ])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    fn districts(rows: &[(&str, f64, f64, f64)]) -> Table {
        Table::from_columns(vec![
            ("AGS", rows.iter().map(|r| Value::from(r.0)).collect()),
            ("share_a", rows.iter().map(|r| Value::from(r.1)).collect()),
            ("share_b", rows.iter().map(|r| Value::from(r.2)).collect()),
            ("Persons", rows.iter().map(|r| Value::from(r.3)).collect()),
        ])
        .unwrap()
    }

    fn transform(columns: &[&str]) -> HomogeneityFeatureEngineering {
        HomogeneityFeatureEngineering::new(
            columns.iter().map(|c| c.to_string()).collect(),
            "homogeneity",
            "Persons",
        )
    }

    #[test]
    fn test_equal_weights_fixture() {
        let cv = weighted_cv(
            &[Some(90.0), Some(100.0), Some(110.0)],
            &[Some(1.0), Some(1.0), Some(1.0)],
        )
        .unwrap();
        assert!((cv - 0.0816).abs() < 1e-4);
    }

    #[test]
    fn test_weights_shift_the_mean() {
        // mean = (10*3 + 20*1) / 4 = 12.5, variance = (3*6.25 + 56.25) / 4 = 18.75
        let cv = weighted_cv(&[Some(10.0), Some(20.0)], &[Some(3.0), Some(1.0)]).unwrap();
        assert!((cv - 18.75_f64.sqrt() / 12.5).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_cases() {
        assert_eq!(weighted_cv(&[Some(0.0), Some(0.0)], &[Some(1.0), Some(1.0)]), None);
        assert_eq!(weighted_cv(&[Some(1.0), Some(-1.0)], &[Some(1.0), Some(1.0)]), None);
        assert_eq!(weighted_cv(&[Some(1.0), Some(2.0)], &[Some(0.0), Some(0.0)]), None);
        assert_eq!(weighted_cv(&[Some(1.0), None], &[Some(1.0), Some(1.0)]), None);
    }

    #[test]
    fn test_single_row_groups_are_excluded() {
        let table = districts(&[
            ("01001000", 90.0, 1.0, 1.0),
            ("01001000", 100.0, 1.0, 1.0),
            ("01001000", 110.0, 1.0, 1.0),
            ("01002000", 50.0, 1.0, 10.0),
        ]);

        let output = transform(&["share_a"]).apply(&table).unwrap();
        assert_eq!(output.column_names(), vec!["AGS", "homogeneity"]);
        assert_eq!(output.num_rows(), 1);
        assert_eq!(output.value(0, "AGS"), Some(&Value::from("01001000")));
        let score = output.value(0, "homogeneity").and_then(Value::as_f64).unwrap();
        assert!((score - 0.0816).abs() < 1e-4);
    }

    #[test]
    fn test_mean_over_defined_columns() {
        // share_b is all zero and is left out of the mean
        let table = districts(&[
            ("01001000", 90.0, 0.0, 1.0),
            ("01001000", 110.0, 0.0, 1.0),
        ]);
        let output = transform(&["share_a", "share_b"]).apply(&table).unwrap();
        let score = output.value(0, "homogeneity").and_then(Value::as_f64).unwrap();
        assert!((score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_all_undefined_gives_null() {
        let table = districts(&[("01001000", 0.0, 0.0, 1.0), ("01001000", 0.0, 0.0, 1.0)]);
        let output = transform(&["share_a", "share_b"]).apply(&table).unwrap();
        assert_eq!(output.num_rows(), 1);
        assert_eq!(output.value(0, "homogeneity"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_columns_fail_validation() {
        let table = districts(&[("01001000", 1.0, 1.0, 1.0)]);
        let transform = transform(&["share_a", "share_c"]).with_group_column("district");

        assert!(!transform.validate(&table));
        match transform.apply(&table) {
            Err(RuntimeError::Validation { transform, missing }) => {
                assert_eq!(transform, "HomogeneityFeatureEngineering");
                assert_eq!(missing, vec!["share_c", "district"]);
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_no_input_columns_is_an_error() {
        let table = districts(&[("01001000", 1.0, 2.0, 1.0), ("01001000", 3.0, 4.0, 1.0)]);
        match transform(&[]).with_name("spread").apply(&table) {
            Err(RuntimeError::InvalidParams { component, .. }) => assert_eq!(component, "spread"),
            other => panic!("Expected InvalidParams, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_name_the_instance() {
        let table = districts(&[("01001000", 1.0, 1.0, 1.0)]);
        let transform = transform(&["share_c"]).with_name("share_c_spread");
        assert_eq!(transform.name(), "share_c_spread");
        match transform.apply(&table) {
            Err(RuntimeError::Validation { transform, .. }) => assert_eq!(transform, "share_c_spread"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let table = districts(&[("1", 1.0, 2.0, 1.0), ("1", 3.0, 4.0, 1.0)]);
        let before = table.clone();
        transform(&["share_a"]).apply(&table).unwrap();
        assert_eq!(table, before);
    }
}
