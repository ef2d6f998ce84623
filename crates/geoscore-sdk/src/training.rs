//! Training data preparation
//!
//! Turns a feature matrix into shuffled train and test partitions according
//! to a [`TrainingConfig`]: rows are filtered first, the id column and rows
//! without a target are dropped, features are filtered and the remaining
//! rows are split with a seeded shuffle.

use crate::error::{Result, SdkError};
use crate::filtering::{filter_features, filter_rows, FilterWarning};
use geoscore_core::{Table, Value};
use geoscore_parser::TrainingConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

/// Train and test partitions of a feature matrix
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub x_train: Table,
    pub x_test: Table,
    pub y_train: Vec<Value>,
    pub y_test: Vec<Value>,
    pub warnings: Vec<FilterWarning>,
}

impl TrainingData {
    /// Names of the feature columns
    pub fn feature_names(&self) -> Vec<&str> {
        self.x_train.column_names()
    }
}

/// Split `matrix` into features and target, filter it and partition it.
///
/// Row filters run while the id column is still present, so rows can be
/// excluded by id. The test partition holds `ceil(n * (1 - ratio))` rows.
pub fn prepare_training_data(matrix: &Table, config: &TrainingConfig) -> Result<TrainingData> {
    let rows = filter_rows(matrix, &config.filters.row_filtering)?;
    let mut warnings = rows.warnings;

    let table = if rows.table.has_column(&config.id_column) {
        rows.table.drop_columns(&[config.id_column.as_str()])
    } else {
        warn!("Id column '{}' not found in feature matrix", config.id_column);
        rows.table
    };

    let target = config.target_variable.as_str();
    let with_target = table.drop_nulls(Some(&[target][..]))?;
    let dropped = table.num_rows() - with_target.num_rows();
    if dropped > 0 {
        info!("Dropped {} row(s) without a value for '{}'", dropped, target);
    }

    let y = with_target.require_column(target)?.to_vec();
    let features = filter_features(&with_target.drop_columns(&[target]), &config.filters.feature_filtering)?;
    warnings.extend(features.warnings);
    let x = features.table;

    if x.num_rows() < 2 {
        return Err(SdkError::TrainingData(format!(
            "at least 2 rows are required for a train/test split, found {}",
            x.num_rows()
        )));
    }

    let (train, test) = split_indices(x.num_rows(), config.train_test_split_ratio, config.random_state);
    info!(
        "Prepared {} training and {} test row(s) with {} feature(s)",
        train.len(),
        test.len(),
        x.num_columns()
    );

    Ok(TrainingData {
        x_train: x.take_rows(&train),
        x_test: x.take_rows(&test),
        y_train: train.iter().map(|&i| y[i].clone()).collect(),
        y_test: test.iter().map(|&i| y[i].clone()).collect(),
        warnings,
    })
}

/// Shuffle `0..rows` with a seeded generator and cut it into train and test
/// positions. Both sides get at least one row once there are two.
pub fn split_indices(rows: usize, train_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..rows).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let test_rows = ((rows as f64) * (1.0 - train_ratio)).ceil() as usize;
    let test_rows = if rows < 2 { 0 } else { test_rows.clamp(1, rows - 1) };

    let test = indices.split_off(rows - test_rows);
    (indices, test)
}
