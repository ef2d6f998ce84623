//! Registered unemployed per municipality (GENESIS table 13211-01-03-5)

use super::{pad_ags, read_source, with_ags, write_transformed};
use crate::error::Result;
use crate::feature::Feature;
use geoscore_core::{CsvOptions, Encoding, Table};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_RAW_DATA_PATH: &str = "data/raw/features/unemployment.csv";

/// Unemployment counts
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnemploymentFeature {
    #[serde(default = "default_raw_data_path")]
    raw_data_path: PathBuf,

    #[serde(default)]
    tform_data_path: Option<PathBuf>,
}

fn default_raw_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_RAW_DATA_PATH)
}

impl UnemploymentFeature {
    pub const NAME: &'static str = "UnemploymentFeature";

    pub fn new(raw_data_path: impl AsRef<Path>) -> Self {
        Self {
            raw_data_path: raw_data_path.as_ref().to_path_buf(),
            tform_data_path: None,
        }
    }

    pub fn with_tform_data_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tform_data_path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl Feature for UnemploymentFeature {
    fn kind(&self) -> &str {
        Self::NAME
    }

    fn load(&self) -> Result<Table> {
        let options = CsvOptions::genesis()
            .with_encoding(Encoding::Latin1)
            .skip_rows(7)
            .skip_footer(4)
            .with_text_columns(["Unnamed: 0", "Unnamed: 1"]);

        let table = read_source(&self.raw_data_path, &options)?.rename(&[
            ("Unnamed: 0", "MU_ID"),
            ("Unnamed: 1", "Municipality"),
            ("Unnamed: 2", "unemployment_total"),
        ])?;

        // the first data line describes the columns
        let rows: Vec<usize> = (1..table.num_rows()).collect();
        let table = table.take_rows(&rows);

        with_ags(table, "MU_ID", pad_ags)
    }

    fn transform(&self, table: Table) -> Result<Table> {
        let output = table.drop_columns(&["MU_ID", "Municipality"]);
        write_transformed(&output, self.tform_data_path.as_deref())?;
        Ok(output)
    }
}
