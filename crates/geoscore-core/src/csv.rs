//! Delimited file reading and writing
//!
//! Statistical office exports carry banner lines above the data and notes
//! below it, so reading supports skipping a fixed number of leading and
//! trailing lines before the records are parsed.

use crate::error::Result;
use crate::table::Table;
use crate::types::Value;
use std::fs;
use std::path::Path;

/// Text encoding of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1, as used by the GENESIS exports
    Latin1,
}

/// Options for reading a delimited file into a `Table`
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// First remaining line holds column names
    pub has_header: bool,
    /// Explicit column names; replace the header when both are present
    pub names: Option<Vec<String>>,
    /// Lines dropped from the top of the file
    pub skip_rows: usize,
    /// Lines dropped from the bottom of the file
    pub skip_footer: usize,
    /// Cell contents read as null, in addition to empty cells
    pub na_values: Vec<String>,
    /// Columns kept as text instead of being parsed as numbers
    pub text_columns: Vec<String>,
    pub encoding: Encoding,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            names: None,
            skip_rows: 0,
            skip_footer: 0,
            na_values: Vec::new(),
            text_columns: Vec::new(),
            encoding: Encoding::Utf8,
        }
    }
}

impl CsvOptions {
    /// Semicolon separated, `-` and `.` as missing markers
    pub fn genesis() -> Self {
        Self {
            delimiter: b';',
            na_values: vec!["-".to_string(), ".".to_string()],
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn skip_rows(mut self, rows: usize) -> Self {
        self.skip_rows = rows;
        self
    }

    pub fn skip_footer(mut self, rows: usize) -> Self {
        self.skip_footer = rows;
        self
    }

    /// Use explicit names and treat every line as data
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self.has_header = false;
        self
    }

    pub fn with_text_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.text_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn parse_cell(&self, raw: &str, text: bool) -> Value {
        if raw.is_empty() || self.na_values.iter().any(|na| na == raw) {
            return Value::Null;
        }
        if text {
            return Value::String(raw.to_string());
        }
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::String(raw.to_string()),
        }
    }
}

fn decode(bytes: Vec<u8>, encoding: Encoding) -> String {
    match encoding {
        Encoding::Utf8 => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        },
        // Latin-1 code points map one to one onto the first 256 chars
        Encoding::Latin1 => bytes.into_iter().map(char::from).collect(),
    }
}

/// Read a delimited file into a table
pub fn read_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Table> {
    let bytes = fs::read(path.as_ref())?;
    read_csv_str(&decode(bytes, options.encoding), options)
}

/// Parse delimited text into a table
pub fn read_csv_str(content: &str, options: &CsvOptions) -> Result<Table> {
    let lines: Vec<&str> = content.lines().collect();
    let end = lines.len().saturating_sub(options.skip_footer);
    let body: Vec<&str> = lines
        .get(options.skip_rows.min(end)..end)
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .collect();
    let body = body.join("\n");

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = reader.records();
    let header: Option<Vec<String>> = if options.has_header {
        match records.next() {
            Some(record) => Some(
                record?
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        if name.trim().is_empty() {
                            format!("Unnamed: {}", i)
                        } else {
                            name.to_string()
                        }
                    })
                    .collect(),
            ),
            None => None,
        }
    } else {
        None
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in records {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    let names: Vec<String> = match (&options.names, header) {
        (Some(names), _) => names.clone(),
        (None, Some(header)) => header,
        (None, None) => {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            (0..width).map(|i| i.to_string()).collect()
        }
    };

    let mut columns: Vec<(String, Vec<Value>)> = Vec::with_capacity(names.len());
    for (i, name) in names.into_iter().enumerate() {
        let text = options.text_columns.contains(&name);
        let values = rows
            .iter()
            .map(|row| row.get(i).map_or(Value::Null, |raw| options.parse_cell(raw, text)))
            .collect();
        columns.push((name, values));
    }

    Table::from_columns(columns)
}

/// Write a table with a header line. Parent directories are created and an
/// existing file is overwritten; nulls become empty cells.
pub fn write_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = ::csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in 0..table.num_rows() {
        writer.write_record(table.row(row).iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_EXPORT: &str = "Banner line\n\
        Table 12612\n\
        ;;;\n\
        01001;Flensburg;850\n\
        01002;Kiel;.\n\
        0100;Kreis;-\n\
        __________\n\
        Source: Statistische Aemter";

    #[test]
    fn test_read_skips_banner_and_footer() {
        let options = CsvOptions::genesis()
            .skip_rows(2)
            .skip_footer(2)
            .with_names(["MU_ID", "MU_name", "births"])
            .with_text_columns(["MU_ID"]);

        let table = read_csv_str(GENESIS_EXPORT, &options).unwrap();

        // the ";;;" line survives the skip and is read as an all-null row
        assert_eq!(table.num_rows(), 4);
        assert_eq!(table.value(1, "MU_ID"), Some(&Value::from("01001")));
        assert_eq!(table.value(1, "births"), Some(&Value::Number(850.0)));
        assert_eq!(table.value(2, "births"), Some(&Value::Null));
        assert_eq!(table.value(3, "births"), Some(&Value::Null));
    }

    #[test]
    fn test_unnamed_header_cells() {
        let content = ";;Arbeitslose\n01001;Flensburg;3000";
        let options = CsvOptions::genesis().with_text_columns(["Unnamed: 0"]);
        let table = read_csv_str(content, &options).unwrap();
        assert_eq!(table.column_names(), vec!["Unnamed: 0", "Unnamed: 1", "Arbeitslose"]);
        assert_eq!(table.value(0, "Unnamed: 0"), Some(&Value::from("01001")));
    }

    #[test]
    fn test_latin1_decoding() {
        let bytes = b"name\nM\xfcnchen".to_vec();
        assert_eq!(decode(bytes, Encoding::Latin1), "name\nMünchen");
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let table = Table::from_columns(vec![
            ("AGS", vec![Value::from("01001000"), Value::from("01002000")]),
            ("v", vec![Value::Number(1.5), Value::Null]),
        ])
        .unwrap();

        write_csv(&table, &path).unwrap();
        let read = read_csv(&path, &CsvOptions::default().with_text_columns(["AGS"])).unwrap();
        assert_eq!(read, table);
    }
}
