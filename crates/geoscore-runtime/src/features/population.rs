//! Population by age group (GENESIS table 12411-02-03-5)

use super::{divide_columns, pad_ags, read_source, with_ags, write_transformed, AGS};
use crate::error::Result;
use crate::feature::Feature;
use geoscore_core::{CsvOptions, Encoding, Table};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_RAW_DATA_PATH: &str = "data/raw/features/population.csv";

const TOTAL: &str = "total_population";

/// Age group labels of the export and their column names
const AGE_GROUPS: [(&str, &str); 18] = [
    ("unter 3 Jahre", "age_under_3"),
    ("3 bis unter 6 Jahre", "age_3_to_5"),
    ("6 bis unter 10 Jahre", "age_6_to_9"),
    ("10 bis unter 15 Jahre", "age_10_to_14"),
    ("15 bis unter 18 Jahre", "age_15_to_17"),
    ("18 bis unter 20 Jahre", "age_18_to_19"),
    ("20 bis unter 25 Jahre", "age_20_to_24"),
    ("25 bis unter 30 Jahre", "age_25_to_29"),
    ("30 bis unter 35 Jahre", "age_30_to_34"),
    ("35 bis unter 40 Jahre", "age_35_to_39"),
    ("40 bis unter 45 Jahre", "age_40_to_44"),
    ("45 bis unter 50 Jahre", "age_45_to_49"),
    ("50 bis unter 55 Jahre", "age_50_to_54"),
    ("55 bis unter 60 Jahre", "age_55_to_59"),
    ("60 bis unter 65 Jahre", "age_60_to_64"),
    ("65 bis unter 75 Jahre", "age_65_to_74"),
    ("75 Jahre und mehr", "age_75_and_over"),
    ("Insgesamt", TOTAL),
];

/// Age structure as shares of the total population
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulationFeature {
    #[serde(default = "default_raw_data_path")]
    raw_data_path: PathBuf,

    #[serde(default)]
    tform_data_path: Option<PathBuf>,
}

fn default_raw_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_RAW_DATA_PATH)
}

impl PopulationFeature {
    pub const NAME: &'static str = "PopulationFeature";

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

impl Feature for PopulationFeature {
    fn kind(&self) -> &str {
        Self::NAME
    }

    fn load(&self) -> Result<Table> {
        let options = CsvOptions::genesis()
            .with_encoding(Encoding::Latin1)
            .skip_rows(6)
            .skip_footer(4)
            .with_names([
                "date",
                "MU_ID",
                "Municipality",
                "age_group",
                "people_count",
                "male_count",
                "female_count",
            ])
            .with_text_columns(["date", "MU_ID", "Municipality", "age_group"]);

        let table = read_source(&self.raw_data_path, &options)?;
        with_ags(table, "MU_ID", pad_ags)
    }

    fn transform(&self, table: Table) -> Result<Table> {
        let pivoted = table
            .pivot_sum(AGS, "age_group", "people_count")?
            .rename(&AGE_GROUPS)?;

        let shares: Vec<String> = pivoted
            .column_names()
            .into_iter()
            .filter(|name| *name != AGS && *name != TOTAL)
            .map(str::to_string)
            .collect();
        let output = divide_columns(pivoted, &shares, TOTAL)?;

        write_transformed(&output, self.tform_data_path.as_deref())?;
        Ok(output)
    }
}
