//! Federal election results by polling district
//!
//! Results for the 2021 and 2025 Bundestag elections come as one ZIP per
//! election. Polling districts are summed per municipality and votes are
//! turned into shares of the voters.

use super::{divide_columns, read_source, write_transformed, AGS};
use crate::archive::fetch_archive_file;
use crate::error::Result;
use crate::feature::Feature;
use geoscore_core::{CsvOptions, Table, Value};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ELECTION_21_URL: &str =
    "https://www.bundeswahlleiterin.de/en/dam/jcr/c2cd99e6-064e-4ebc-b634-f86b5c0e14b3/btw21_wbz.zip";
pub const ELECTION_25_URL: &str =
    "https://www.bundeswahlleiterin.de/en/dam/jcr/e79a7bd3-0607-4e87-9752-8e601e299e00/btw25_wbz.zip";

const AGS_PARTS: [&str; 4] = ["Land", "Regierungsbezirk", "Kreis", "Gemeinde"];

const ELIGIBLE: &str = "eligible_voters";
const VOTERS: &str = "total_voters";
const PARTICIPATION: &str = "election_participation";

/// Where an election's results archive comes from
struct ArchiveSource<'a> {
    url: &'a str,
    raw_dir: &'a Path,
    reuse_download: bool,
}

/// Read the results file and derive `AGS`; rows without a complete code are
/// dropped
fn load_results(source: &ArchiveSource<'_>, file_name: &str, skip_rows: usize) -> Result<Table> {
    let path = fetch_archive_file(source.url, source.raw_dir, file_name, source.reuse_download)?;
    let options = CsvOptions::default()
        .with_delimiter(b';')
        .skip_rows(skip_rows)
        .with_text_columns(AGS_PARTS);

    let mut table = read_source(&path, &options)?.drop_nulls(Some(&AGS_PARTS[..]))?;

    let parts = AGS_PARTS
        .iter()
        .map(|name| table.require_column(name))
        .collect::<geoscore_core::Result<Vec<_>>>()?;
    let codes = (0..table.num_rows())
        .map(|row| {
            let [land, district, county, municipality] =
                [0, 1, 2, 3].map(|i| parts[i][row].to_string());
            Value::String(format!("{}{}{}{:0>3}", land, district, county, municipality))
        })
        .collect();
    table.insert_column(AGS, codes)?;
    Ok(table)
}

/// Sum per municipality, add turnout and convert `vote_columns` to shares of
/// the voters
fn aggregate(table: Table, vote_columns: impl Fn(&str) -> bool) -> Result<Table> {
    let sums: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| *name != AGS)
        .map(str::to_string)
        .collect();
    let mut grouped = table.group_sum(AGS, &sums)?;

    let participation = grouped.divide(VOTERS, ELIGIBLE)?;
    grouped.insert_column(PARTICIPATION, participation)?;

    let votes: Vec<String> = grouped
        .column_names()
        .into_iter()
        .filter(|&name| vote_columns(name))
        .map(str::to_string)
        .collect();
    divide_columns(grouped, &votes, VOTERS)
}

/// 2021 Bundestag election
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Election21Feature {
    #[serde(default = "default_url_21")]
    url: String,

    #[serde(default = "default_raw_data_path_21")]
    raw_data_path: PathBuf,

    /// Use an already extracted results file instead of downloading again
    #[serde(default)]
    reuse_download: bool,

    #[serde(default)]
    tform_data_path: Option<PathBuf>,
}

fn default_url_21() -> String {
    ELECTION_21_URL.to_string()
}

fn default_raw_data_path_21() -> PathBuf {
    PathBuf::from("data/raw/features/election_2021")
}

impl Election21Feature {
    pub const NAME: &'static str = "Election21Feature";
    pub const RESULTS_FILE: &'static str = "btw21_wbz_ergebnisse.csv";

    pub fn new(raw_data_path: impl AsRef<Path>) -> Self {
        Self {
            url: default_url_21(),
            raw_data_path: raw_data_path.as_ref().to_path_buf(),
            reuse_download: false,
            tform_data_path: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_reuse_download(mut self, reuse: bool) -> Self {
        self.reuse_download = reuse;
        self
    }

    fn source(&self) -> ArchiveSource<'_> {
        ArchiveSource {
            url: &self.url,
            raw_dir: &self.raw_data_path,
            reuse_download: self.reuse_download,
        }
    }

    pub fn with_tform_data_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tform_data_path = Some(path.as_ref().to_path_buf());
        self
    }
}

fn is_vote_21(name: &str) -> bool {
    name.starts_with("E_") || name.starts_with("Z_")
}

impl Feature for Election21Feature {
    fn kind(&self) -> &str {
        Self::NAME
    }

    fn load(&self) -> Result<Table> {
        let table = load_results(&self.source(), Self::RESULTS_FILE, 0)?;
        Ok(table.rename(&[
            ("Wahlberechtigte (A)", ELIGIBLE),
            ("Wählende (B)", VOTERS),
            ("E_Ungültige", "E_invalid_votes"),
            ("E_Gültige", "E_valid_votes"),
            ("Z_Ungültige", "Z_invalid_votes"),
            ("Z_Gültige", "Z_valid_votes"),
        ])?)
    }

    fn transform(&self, table: Table) -> Result<Table> {
        let keep: Vec<String> = table
            .column_names()
            .into_iter()
            .filter(|name| is_vote_21(name) || [AGS, ELIGIBLE, VOTERS].contains(name))
            .map(str::to_string)
            .collect();

        let output = aggregate(table.select(&keep)?, is_vote_21)?;
        write_transformed(&output, self.tform_data_path.as_deref())?;
        Ok(output)
    }
}

/// 2025 Bundestag election
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Election25Feature {
    #[serde(default = "default_url_25")]
    url: String,

    #[serde(default = "default_raw_data_path_25")]
    raw_data_path: PathBuf,

    /// Use an already extracted results file instead of downloading again
    #[serde(default)]
    reuse_download: bool,

    #[serde(default)]
    tform_data_path: Option<PathBuf>,
}

fn default_url_25() -> String {
    ELECTION_25_URL.to_string()
}

fn default_raw_data_path_25() -> PathBuf {
    PathBuf::from("data/raw/features/election_2025")
}

impl Election25Feature {
    pub const NAME: &'static str = "Election25Feature";
    pub const RESULTS_FILE: &'static str = "btw25_wbz_ergebnisse.csv";

    pub fn new(raw_data_path: impl AsRef<Path>) -> Self {
        Self {
            url: default_url_25(),
            raw_data_path: raw_data_path.as_ref().to_path_buf(),
            reuse_download: false,
            tform_data_path: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_reuse_download(mut self, reuse: bool) -> Self {
        self.reuse_download = reuse;
        self
    }

    fn source(&self) -> ArchiveSource<'_> {
        ArchiveSource {
            url: &self.url,
            raw_dir: &self.raw_data_path,
            reuse_download: self.reuse_download,
        }
    }

    pub fn with_tform_data_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tform_data_path = Some(path.as_ref().to_path_buf());
        self
    }
}

impl Feature for Election25Feature {
    fn kind(&self) -> &str {
        Self::NAME
    }

    fn load(&self) -> Result<Table> {
        // four banner lines precede the header
        load_results(&self.source(), Self::RESULTS_FILE, 4)
    }

    fn transform(&self, table: Table) -> Result<Table> {
        let keep: Vec<String> = table
            .column_names()
            .into_iter()
            .filter(|name| {
                name.ends_with("Erststimmen")
                    || name.ends_with("Zweitstimmen")
                    || [AGS, "Wahlberechtigte (A)", "Wählende (B)"].contains(name)
            })
            .map(str::to_string)
            .collect();

        let selected = table.select(&keep)?.rename(&[
            ("Wahlberechtigte (A)", ELIGIBLE),
            ("Wählende (B)", VOTERS),
            ("Ungültige - Zweitstimmen", "invalid_votes_zweitstimmen"),
            ("Gültige - Zweitstimmen", "valid_votes_zweitstimmen"),
            ("Ungültige - Erststimmen", "invalid_votes_erststimmen"),
            ("Gültige - Erststimmen", "valid_votes_erststimmen"),
        ])?;

        let output = aggregate(selected, |name| {
            ![AGS, ELIGIBLE, VOTERS, PARTICIPATION].contains(&name)
        })?;
        write_transformed(&output, self.tform_data_path.as_deref())?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_columns_21() {
        assert!(is_vote_21("Z_SPD"));
        assert!(is_vote_21("E_invalid_votes"));
        assert!(!is_vote_21(ELIGIBLE));
        assert!(!is_vote_21(AGS));
    }
}
