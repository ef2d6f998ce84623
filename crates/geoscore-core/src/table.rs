//! Feature tables
//!
//! A `Table` is an ordered set of equally long, uniquely named columns. Every
//! feature produces one, keyed by a join column (usually `AGS`), and the
//! matrix builder merges them into one wide table.

use crate::error::{CoreError, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How two tables are combined on their join column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMethod {
    /// Only keys present on both sides
    Inner,
    /// Every key from both sides
    Outer,
    /// Every row of the left table
    #[default]
    Left,
    /// Every row of the right table
    Right,
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Hashable form of a join cell. Nulls never match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl Key {
    fn of(value: &Value) -> Option<Key> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Number(n) if n.is_nan() => None,
            // -0.0 and 0.0 must hash alike
            Value::Number(n) => Some(Key::Number((n + 0.0).to_bits())),
            Value::String(s) => Some(Key::Text(s.clone())),
        }
    }
}

/// Column-oriented table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs.
    ///
    /// All columns must have the same length and distinct names.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<Value>)>) -> Result<Self> {
        let mut table = Table::new();
        for (name, values) in columns {
            let name = name.into();
            if table.has_column(&name) {
                return Err(CoreError::DuplicateColumn(name));
            }
            table.insert_column(name, values)?;
        }
        Ok(table)
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cells of a column, or `None` when it does not exist
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.column_index(name).map(|i| self.columns[i].values.as_slice())
    }

    /// Cells of a column, failing with `ColumnNotFound`
    pub fn require_column(&self, name: &str) -> Result<&[Value]> {
        self.column(name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))
    }

    /// Cell at `row` in column `name`
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).and_then(|values| values.get(row))
    }

    /// Cells of one row, in column order
    pub fn row(&self, row: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[row]).collect()
    }

    /// Insert a column, replacing an existing one of the same name in place.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() && self.rows == 0 {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(CoreError::LengthMismatch {
                column: name,
                expected: self.rows,
                actual: values.len(),
            });
        }

        match self.column_index(&name) {
            Some(i) => self.columns[i].values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Rename columns with a function; names it maps to `None` are kept.
    pub fn rename_with<F>(mut self, f: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut seen = HashSet::new();
        for column in &mut self.columns {
            if let Some(new_name) = f(&column.name) {
                column.name = new_name;
            }
            if !seen.insert(column.name.clone()) {
                return Err(CoreError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(self)
    }

    /// Rename columns from `(old, new)` pairs. Absent columns are ignored.
    pub fn rename(self, mapping: &[(&str, &str)]) -> Result<Self> {
        let lookup: HashMap<&str, &str> = mapping.iter().copied().collect();
        self.rename_with(|name| lookup.get(name).map(|n| n.to_string()))
    }

    /// Keep the given columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let index = self
                .column_index(name)
                .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))?;
            if columns.iter().any(|c: &Column| c.name == name) {
                return Err(CoreError::DuplicateColumn(name.to_string()));
            }
            columns.push(self.columns[index].clone());
        }
        Ok(Table {
            columns,
            rows: self.rows,
        })
    }

    /// Drop the given columns. Names that are not present are ignored.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let drop: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        Table {
            columns: self
                .columns
                .iter()
                .filter(|c| !drop.contains(c.name.as_str()))
                .cloned()
                .collect(),
            rows: self.rows,
        }
    }

    /// Keep the rows at the given positions, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: indices.iter().map(|&i| c.values[i].clone()).collect(),
                })
                .collect(),
            rows: indices.len(),
        }
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn filter(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.rows {
            return Err(CoreError::LengthMismatch {
                column: "<mask>".to_string(),
                expected: self.rows,
                actual: mask.len(),
            });
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        Ok(self.take_rows(&indices))
    }

    /// Remove every row holding a null in any column of `subset`
    /// (all columns when `subset` is `None`).
    pub fn drop_nulls(&self, subset: Option<&[&str]>) -> Result<Table> {
        let checked: Vec<&Column> = match subset {
            Some(names) => names
                .iter()
                .map(|n| {
                    self.column_index(n)
                        .map(|i| &self.columns[i])
                        .ok_or_else(|| CoreError::ColumnNotFound(n.to_string()))
                })
                .collect::<Result<_>>()?,
            None => self.columns.iter().collect(),
        };

        let mask: Vec<bool> = (0..self.rows)
            .map(|row| checked.iter().all(|c| !c.values[row].is_null()))
            .collect();
        self.filter(&mask)
    }

    /// Replace every null cell with `fill`.
    pub fn fill_nulls(&self, fill: &Value) -> Table {
        let mut table = self.clone();
        for column in &mut table.columns {
            for cell in &mut column.values {
                if cell.is_null() {
                    *cell = fill.clone();
                }
            }
        }
        table
    }

    /// Count of null cells across the whole table
    pub fn null_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.iter().filter(|v| v.is_null()).count())
            .sum()
    }

    /// Merge `right` onto this table on column `on`.
    ///
    /// Rows multiply for repeated keys. Null keys never match. A non-key
    /// column present on both sides is a `ColumnCollision`.
    pub fn merge(&self, right: &Table, on: &str, how: JoinMethod) -> Result<Table> {
        let left_keys = self.require_column(on)?;
        let right_keys = right.require_column(on)?;

        if let Some(collision) = right
            .columns
            .iter()
            .find(|c| c.name != on && self.has_column(&c.name))
        {
            return Err(CoreError::ColumnCollision(collision.name.clone()));
        }

        let mut right_index: HashMap<Key, Vec<usize>> = HashMap::new();
        for (j, key) in right_keys.iter().enumerate() {
            if let Some(key) = Key::of(key) {
                right_index.entry(key).or_default().push(j);
            }
        }

        let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
        match how {
            JoinMethod::Right => {
                let mut left_index: HashMap<Key, Vec<usize>> = HashMap::new();
                for (i, key) in left_keys.iter().enumerate() {
                    if let Some(key) = Key::of(key) {
                        left_index.entry(key).or_default().push(i);
                    }
                }
                for (j, key) in right_keys.iter().enumerate() {
                    match Key::of(key).and_then(|k| left_index.get(&k)) {
                        Some(matches) => pairs.extend(matches.iter().map(|&i| (Some(i), Some(j)))),
                        None => pairs.push((None, Some(j))),
                    }
                }
            }
            JoinMethod::Inner | JoinMethod::Left | JoinMethod::Outer => {
                let mut matched_right = vec![false; right.rows];
                for (i, key) in left_keys.iter().enumerate() {
                    match Key::of(key).and_then(|k| right_index.get(&k)) {
                        Some(matches) => {
                            for &j in matches {
                                matched_right[j] = true;
                                pairs.push((Some(i), Some(j)));
                            }
                        }
                        None if how != JoinMethod::Inner => pairs.push((Some(i), None)),
                        None => {}
                    }
                }
                if how == JoinMethod::Outer {
                    pairs.extend(
                        matched_right
                            .iter()
                            .enumerate()
                            .filter(|(_, matched)| !**matched)
                            .map(|(j, _)| (None, Some(j))),
                    );
                }
            }
        }

        let mut merged = Table::new();
        merged.rows = pairs.len();
        for column in &self.columns {
            let values = pairs
                .iter()
                .map(|(i, j)| match (i, j) {
                    (Some(i), _) => column.values[*i].clone(),
                    (None, Some(j)) if column.name == on => right_keys[*j].clone(),
                    _ => Value::Null,
                })
                .collect();
            merged.columns.push(Column {
                name: column.name.clone(),
                values,
            });
        }
        for column in right.columns.iter().filter(|c| c.name != on) {
            let values = pairs
                .iter()
                .map(|(_, j)| j.map_or(Value::Null, |j| column.values[j].clone()))
                .collect();
            merged.columns.push(Column {
                name: column.name.clone(),
                values,
            });
        }
        Ok(merged)
    }

    /// Row positions per distinct value of `column`, sorted by value.
    /// Rows with a null key are left out.
    pub fn group_indices(&self, column: &str) -> Result<Vec<(Value, Vec<usize>)>> {
        let keys = self.require_column(column)?;
        let mut position: HashMap<Key, usize> = HashMap::new();
        let mut groups: Vec<(Value, Vec<usize>)> = Vec::new();

        for (row, value) in keys.iter().enumerate() {
            let Some(key) = Key::of(value) else { continue };
            let slot = *position.entry(key).or_insert_with(|| {
                groups.push((value.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(row);
        }

        groups.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(groups)
    }

    /// Sum `columns` per distinct `key`. Nulls are skipped; a group without
    /// any number sums to 0.
    pub fn group_sum<S: AsRef<str>>(&self, key: &str, columns: &[S]) -> Result<Table> {
        let groups = self.group_indices(key)?;
        let mut result = Table::new();
        result.insert_column(key, groups.iter().map(|(k, _)| k.clone()).collect())?;

        for name in columns {
            let name = name.as_ref();
            let values = self.require_column(name)?;
            let mut sums = Vec::with_capacity(groups.len());
            for (_, rows) in &groups {
                let mut sum = 0.0;
                for &row in rows {
                    match &values[row] {
                        v if v.is_null() => {}
                        Value::Number(n) => sum += n,
                        other => {
                            return Err(CoreError::TypeError(format!(
                                "cannot sum non-numeric value '{}' in column '{}'",
                                other, name
                            )))
                        }
                    }
                }
                sums.push(Value::Number(sum));
            }
            result.insert_column(name, sums)?;
        }
        Ok(result)
    }

    /// Spread `values` into one column per distinct `columns` entry, one row
    /// per distinct `index` entry, summing duplicates. Both axes are sorted;
    /// combinations without any number are null.
    pub fn pivot_sum(&self, index: &str, columns: &str, values: &str) -> Result<Table> {
        let rows = self.group_indices(index)?;
        let headers = self.group_indices(columns)?;
        let cells = self.require_column(values)?;
        let header_keys = self.require_column(columns)?;

        let mut result = Table::new();
        result.insert_column(index, rows.iter().map(|(k, _)| k.clone()).collect())?;

        for (header, _) in &headers {
            let header_key = Key::of(header);
            let mut out = Vec::with_capacity(rows.len());
            for (_, members) in &rows {
                let mut sum: Option<f64> = None;
                for &row in members {
                    if Key::of(&header_keys[row]) != header_key {
                        continue;
                    }
                    if let Some(n) = cells[row].as_f64() {
                        *sum.get_or_insert(0.0) += n;
                    }
                }
                out.push(sum.into());
            }
            result.insert_column(header.to_string(), out)?;
        }
        Ok(result)
    }

    /// Cell-wise `numerator / denominator` with null for zero or missing
    /// denominators.
    pub fn divide(&self, numerator: &str, denominator: &str) -> Result<Vec<Value>> {
        let num = self.require_column(numerator)?;
        let den = self.require_column(denominator)?;
        Ok(num.iter().zip(den).map(|(n, d)| n.checked_div(d)).collect())
    }
}
