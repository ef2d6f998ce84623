//! Live births per municipality (GENESIS table 12612-91-01-5)

use super::{municipality, municipality_population, pad_ags, read_source, with_ags, write_transformed, AGS};
use crate::error::Result;
use crate::feature::Feature;
use geoscore_core::{CsvOptions, Encoding, JoinMethod, Table};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_RAW_DATA_PATH: &str = "data/raw/features/12612-91-01-5-births.csv";

/// Births normalised by municipality population
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BirthsFeature {
    #[serde(default = "default_raw_data_path")]
    raw_data_path: PathBuf,

    #[serde(default)]
    tform_data_path: Option<PathBuf>,

    #[serde(default = "default_municipality_data_path")]
    municipality_data_path: PathBuf,
}

fn default_raw_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_RAW_DATA_PATH)
}

fn default_municipality_data_path() -> PathBuf {
    PathBuf::from(municipality::DEFAULT_RAW_DATA_PATH)
}

impl BirthsFeature {
    pub const NAME: &'static str = "BirthsFeature";

    pub fn new(raw_data_path: impl AsRef<Path>, municipality_data_path: impl AsRef<Path>) -> Self {
        Self {
            raw_data_path: raw_data_path.as_ref().to_path_buf(),
            tform_data_path: None,
            municipality_data_path: municipality_data_path.as_ref().to_path_buf(),
        }
    }

    pub fn with_tform_data_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tform_data_path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl Feature for BirthsFeature {
    fn kind(&self) -> &str {
        Self::NAME
    }

    fn load(&self) -> Result<Table> {
        let options = CsvOptions::genesis()
            .with_encoding(Encoding::Latin1)
            .skip_rows(5)
            .skip_footer(4)
            .with_names(["MU_ID", "MU_name", "births"])
            .with_text_columns(["MU_ID", "MU_name"]);

        let table = read_source(&self.raw_data_path, &options)?;
        with_ags(table, "MU_ID", pad_ags)
    }

    fn transform(&self, table: Table) -> Result<Table> {
        let population = municipality_population(&self.municipality_data_path)?;
        let mut merged = table.merge(&population, AGS, JoinMethod::Left)?;

        let per_capita = merged.divide("births", "Persons")?;
        merged.insert_column("births", per_capita)?;

        let output = merged.select(&[AGS, "births"])?;
        write_transformed(&output, self.tform_data_path.as_deref())?;
        Ok(output)
    }
}
