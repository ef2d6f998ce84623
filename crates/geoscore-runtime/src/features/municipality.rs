//! Municipality reference data
//!
//! Area and population per municipality (GENESIS table 12411). This is the
//! base table of every feature matrix.

use super::{read_source, with_ags};
use crate::error::Result;
use crate::feature::Feature;
use geoscore_core::{CsvOptions, Table, Value};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_RAW_DATA_PATH: &str = "data/raw/municipalities_2022.csv";

const COLUMNS: [&str; 5] = ["MU_ID", "Municipality", "Persons", "Area", "Population Density"];

/// Municipality feature
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MunicipalityFeature {
    #[serde(default = "default_raw_data_path")]
    raw_data_path: PathBuf,
}

fn default_raw_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_RAW_DATA_PATH)
}

impl MunicipalityFeature {
    pub const NAME: &'static str = "MunicipalityFeature";

    pub fn new(raw_data_path: impl AsRef<Path>) -> Self {
        Self {
            raw_data_path: raw_data_path.as_ref().to_path_buf(),
        }
    }

    pub fn raw_data_path(&self) -> &Path {
        &self.raw_data_path
    }

    /// Raw rows with the derived `AGS` column
    pub(crate) fn load_raw(&self) -> Result<Table> {
        let options = CsvOptions::genesis()
            .skip_rows(6)
            .skip_footer(4)
            .with_names(COLUMNS)
            .with_text_columns(["MU_ID", "Municipality"]);

        let table = read_source(&self.raw_data_path, &options)?;
        with_ags(table, "MU_ID", municipality_ags)
    }
}

/// Municipality code from a 12-digit regional key: state, district and
/// county digits, then the municipality digits with the collective
/// municipality level cut out
pub fn municipality_ags(mu_id: &Value) -> Value {
    let Some(id) = mu_id.as_str() else {
        return Value::Null;
    };
    let chars: Vec<char> = id.chars().collect();
    let part = |start: usize, end: usize| -> String {
        chars[start.min(chars.len())..end.min(chars.len())].iter().collect()
    };
    Value::String(format!("{}{}", part(0, 5), part(9, 12)))
}

impl Feature for MunicipalityFeature {
    fn kind(&self) -> &str {
        Self::NAME
    }

    fn load(&self) -> Result<Table> {
        self.load_raw()
    }

    fn transform(&self, table: Table) -> Result<Table> {
        Ok(table.drop_columns(&["MU_ID", "Municipality"]))
    }
}
