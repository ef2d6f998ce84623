//! Subcommand implementations

use anyhow::{Context, Result};
use geoscore_core::csv::read_csv;
use geoscore_core::{CsvOptions, Table};
use geoscore_parser::TrainingConfig;
use geoscore_sdk::{prepare_training_data, FeatureMatrixBuilder, TrainingData};
use std::path::{Path, PathBuf};
use tracing::info;

/// Options of `build-matrix`
#[derive(Debug, Clone)]
pub struct BuildMatrixOptions {
    pub config: PathBuf,
    pub output: Option<PathBuf>,
    pub no_save: bool,
}

/// Build the feature matrix and report its shape
pub fn build_matrix(options: &BuildMatrixOptions) -> Result<Table> {
    let mut builder = FeatureMatrixBuilder::new(&options.config)
        .with_context(|| format!("Failed to load manifest {}", options.config.display()))?;
    if let Some(output) = &options.output {
        builder = builder.with_output_path(output);
    }
    if options.no_save {
        builder = builder.with_save_output(false);
    }

    info!("Building matrix from feature(s): {:?}", builder.get_feature_names());
    let matrix = builder.build_matrix().context("Failed to build feature matrix")?;

    let (rows, columns) = matrix.shape();
    println!("Feature matrix: {} rows x {} columns", rows, columns);
    if builder.matrix_config().save_output {
        println!("Saved to {}", builder.matrix_config().output_path.display());
    }
    Ok(matrix)
}

/// Options of `prepare`
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub matrix: PathBuf,
    pub training: PathBuf,
}

/// Read a saved matrix, keeping the id column as text
pub fn read_matrix(path: &Path, id_column: &str) -> Result<Table> {
    let options = CsvOptions::default().with_text_columns([id_column]);
    read_csv(path, &options).with_context(|| format!("Failed to read matrix {}", path.display()))
}

/// Filter and split a saved matrix, then report shapes and filter warnings
pub fn prepare(options: &PrepareOptions) -> Result<TrainingData> {
    let config = TrainingConfig::from_file(&options.training).with_context(|| {
        format!("Failed to load training config {}", options.training.display())
    })?;
    let matrix = read_matrix(&options.matrix, &config.id_column)?;

    let data = prepare_training_data(&matrix, &config).context("Failed to prepare training data")?;

    println!("X_train: {:?}, y_train: {}", data.x_train.shape(), data.y_train.len());
    println!("X_test:  {:?}, y_test:  {}", data.x_test.shape(), data.y_test.len());
    println!("Features: {}", data.feature_names().join(", "));
    for warning in &data.warnings {
        println!("Warning: {}", warning);
    }
    Ok(data)
}
