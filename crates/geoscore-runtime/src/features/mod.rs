//! Built-in features
//!
//! Each feature reads one statistical office export and produces a table
//! keyed by the 8-character municipality code (`AGS`). Constructor
//! parameters are deserialized straight into the feature struct, so unknown
//! parameters are rejected when the manifest is resolved.

pub mod births;
pub mod election;
pub mod municipality;
pub mod population;
pub mod road_accidents;
pub mod unemployment;

pub use births::BirthsFeature;
pub use election::{Election21Feature, Election25Feature};
pub use municipality::MunicipalityFeature;
pub use population::PopulationFeature;
pub use road_accidents::RoadAccidentsFeature;
pub use unemployment::UnemploymentFeature;

use crate::error::{Result, RuntimeError};
use geoscore_core::csv::{read_csv, write_csv};
use geoscore_core::{CsvOptions, Table, Value};
use std::path::Path;
use tracing::info;

/// Name of the municipality code column every feature produces
pub const AGS: &str = "AGS";

const AGS_LEN: usize = 8;

/// Read a data file, naming the path on failure
pub(crate) fn read_source(path: &Path, options: &CsvOptions) -> Result<Table> {
    read_csv(path, options).map_err(|source| RuntimeError::DataSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a transformed table when an output path is configured
pub(crate) fn write_transformed(table: &Table, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        write_csv(table, path)?;
        info!("Wrote transformed data to {}", path.display());
    }
    Ok(())
}

/// Right-pad a regional code with zeros to the full AGS width
pub fn pad_ags(code: &Value) -> Value {
    match code {
        v if v.is_null() => Value::Null,
        v => {
            let code = v.to_string();
            let width = code.chars().count();
            Value::String(format!("{}{}", code, "0".repeat(AGS_LEN.saturating_sub(width))))
        }
    }
}

/// Add an `AGS` column derived from `column` cell by cell
pub(crate) fn with_ags<F>(mut table: Table, column: &str, derive: F) -> Result<Table>
where
    F: Fn(&Value) -> Value,
{
    let codes = table.require_column(column)?.iter().map(derive).collect();
    table.insert_column(AGS, codes)?;
    Ok(table)
}

/// `Persons` per municipality from the municipality export, for per-capita
/// normalisation
pub(crate) fn municipality_population(path: &Path) -> Result<Table> {
    let municipalities = MunicipalityFeature::new(path).load_raw()?;
    Ok(municipalities.select(&[AGS, "Persons"])?)
}

/// Replace each of `columns` with its value divided by `denominator`
pub(crate) fn divide_columns<S: AsRef<str>>(
    mut table: Table,
    columns: &[S],
    denominator: &str,
) -> Result<Table> {
    for column in columns {
        let ratios = table.divide(column.as_ref(), denominator)?;
        table.insert_column(column.as_ref(), ratios)?;
    }
    Ok(table)
}
