//! Declarative column and row filtering
//!
//! Patterns are globs unless they contain a regex metacharacter other than
//! `*`, in which case they are used as regular expressions. Either way a
//! pattern must match the whole column name or cell text.
//!
//! Filtering never fails on configuration mistakes. Unmatched patterns,
//! invalid regexes and unknown row-filter columns are reported as
//! [`FilterWarning`]s next to the filtered table and logged.

use crate::error::Result;
use geoscore_core::{Table, Value};
use geoscore_parser::{FeatureFilteringConfig, FilterConfig, RowFilteringConfig};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

const REGEX_METACHARACTERS: &[char] = &['.', '^', '$', '[', ']', '(', ')', '+', '?', '|', '{', '}', '\\'];

/// Which feature list a pattern came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternList {
    Use,
    Omit,
}

impl fmt::Display for PatternList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternList::Use => write!(f, "use_features"),
            PatternList::Omit => write!(f, "omit_features"),
        }
    }
}

/// Non-fatal problem found while filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterWarning {
    /// Feature patterns that selected no column
    UnmatchedPatterns { list: PatternList, patterns: Vec<String> },

    /// Pattern that looked like a regex but did not compile
    InvalidPattern { pattern: String, message: String },

    /// Row filter on a column the table does not have
    MissingColumn { column: String },
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWarning::UnmatchedPatterns { list, patterns } => {
                write!(f, "No columns matched for {} patterns: {:?}", list, patterns)
            }
            FilterWarning::InvalidPattern { pattern, message } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, message)
            }
            FilterWarning::MissingColumn { column } => {
                write!(f, "Column '{}' not found in data, skipping row filter", column)
            }
        }
    }
}

/// A filtered table and the warnings collected on the way
#[derive(Debug, Clone)]
pub struct Filtered {
    pub table: Table,
    pub warnings: Vec<FilterWarning>,
}

/// Compile a glob or regex pattern into a full-match regex.
///
/// Patterns without regex metacharacters are escaped literally, with `*`
/// matching any run of characters.
pub fn compile_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let body = if pattern.contains(REGEX_METACHARACTERS) {
        pattern.to_string()
    } else {
        regex::escape(pattern).replace(r"\*", ".*")
    };
    Regex::new(&format!("^(?:{})$", body))
}

/// Patterns paired with their compiled form; invalid ones keep `None`
struct Patterns<'a> {
    compiled: Vec<(&'a str, Option<Regex>)>,
}

impl<'a> Patterns<'a> {
    fn compile(patterns: &'a [String], warnings: &mut Vec<FilterWarning>) -> Self {
        let compiled = patterns
            .iter()
            .map(|pattern| match compile_pattern(pattern) {
                Ok(regex) => (pattern.as_str(), Some(regex)),
                Err(e) => {
                    let warning = FilterWarning::InvalidPattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                    (pattern.as_str(), None)
                }
            })
            .collect();
        Self { compiled }
    }

    fn is_match(&self, text: &str) -> bool {
        self.compiled
            .iter()
            .any(|(_, regex)| regex.as_ref().is_some_and(|r| r.is_match(text)))
    }

    /// Columns selected by the patterns, in pattern order then column order.
    /// An exact name not yet selected wins over pattern matching; a repeated
    /// one is matched as a pattern.
    fn resolve(&self, columns: &[&str]) -> Vec<String> {
        let mut selected: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for (pattern, regex) in &self.compiled {
            if columns.contains(pattern) && seen.insert(*pattern) {
                selected.push(pattern.to_string());
                continue;
            }
            let Some(regex) = regex else { continue };
            for &column in columns {
                if !seen.contains(column) && regex.is_match(column) {
                    seen.insert(column);
                    selected.push(column.to_string());
                }
            }
        }
        selected
    }

    /// Patterns that select no column at all
    fn unmatched(&self, columns: &[&str], selected: &[String]) -> Vec<String> {
        self.compiled
            .iter()
            .filter(|(pattern, regex)| {
                !selected.iter().any(|s| s == pattern)
                    && regex
                        .as_ref()
                        .map_or(true, |r| !columns.iter().any(|c| r.is_match(c)))
            })
            .map(|(pattern, _)| pattern.to_string())
            .collect()
    }
}

/// Resolve feature patterns against `columns`; see [`filter_features`] for
/// the matching rules
pub fn resolve_feature_patterns(columns: &[&str], patterns: &[String]) -> Vec<String> {
    let mut warnings = Vec::new();
    Patterns::compile(patterns, &mut warnings).resolve(columns)
}

/// Keep and drop columns by pattern.
///
/// With `use_features` the table is reduced to the selected columns in
/// selection order. `omit_features` is then resolved against what is left
/// and those columns are dropped. Row count is unchanged.
pub fn filter_features(table: &Table, config: &FeatureFilteringConfig) -> Result<Filtered> {
    let mut warnings = Vec::new();
    let mut table = table.clone();

    if !config.use_features.is_empty() {
        let patterns = Patterns::compile(&config.use_features, &mut warnings);
        let columns = table.column_names();
        let selected = patterns.resolve(&columns);
        report_unmatched(PatternList::Use, patterns.unmatched(&columns, &selected), &mut warnings);

        table = table.select(&selected)?;
        info!("Selected {} feature(s) by use_features", table.num_columns());
    }

    if !config.omit_features.is_empty() {
        let patterns = Patterns::compile(&config.omit_features, &mut warnings);
        let columns = table.column_names();
        let omitted = patterns.resolve(&columns);
        report_unmatched(PatternList::Omit, patterns.unmatched(&columns, &omitted), &mut warnings);

        table = table.drop_columns(&omitted);
        info!("Omitted {} feature(s) by omit_features", omitted.len());
    }

    Ok(Filtered { table, warnings })
}

/// Remove rows whose value in a configured column matches any of that
/// column's patterns. Null cells never match.
pub fn filter_rows(table: &Table, config: &RowFilteringConfig) -> Result<Filtered> {
    let mut warnings = Vec::new();
    let mut excluded = vec![false; table.num_rows()];

    for (column, patterns) in &config.omit_rows {
        let Some(values) = table.column(column) else {
            let warning = FilterWarning::MissingColumn { column: column.clone() };
            warn!("{}", warning);
            warnings.push(warning);
            continue;
        };

        let patterns = Patterns::compile(patterns, &mut warnings);
        for (row, value) in values.iter().enumerate() {
            if excluded[row] {
                continue;
            }
            if let Some(text) = cell_text(value) {
                excluded[row] = patterns.is_match(&text);
            }
        }
    }

    let keep: Vec<bool> = excluded.iter().map(|e| !e).collect();
    let filtered = table.filter(&keep)?;
    let removed = table.num_rows() - filtered.num_rows();
    if removed > 0 {
        info!("Row filtering removed {} of {} row(s)", removed, table.num_rows());
    }

    Ok(Filtered {
        table: filtered,
        warnings,
    })
}

/// Row filtering followed by feature filtering
pub fn apply_filters(table: &Table, config: &FilterConfig) -> Result<Filtered> {
    let rows = filter_rows(table, &config.row_filtering)?;
    let mut features = filter_features(&rows.table, &config.feature_filtering)?;

    let mut warnings = rows.warnings;
    warnings.append(&mut features.warnings);
    Ok(Filtered {
        table: features.table,
        warnings,
    })
}

fn report_unmatched(list: PatternList, patterns: Vec<String>, warnings: &mut Vec<FilterWarning>) {
    if patterns.is_empty() {
        return;
    }
    let warning = FilterWarning::UnmatchedPatterns { list, patterns };
    warn!("{}", warning);
    warnings.push(warning);
}

/// Text a cell is matched against; nulls have none
fn cell_text(value: &Value) -> Option<String> {
    (!value.is_null()).then(|| value.to_string())
}
