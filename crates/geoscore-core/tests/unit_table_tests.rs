//! Unit tests for table operations
//!
//! Exercises the table behaviour the feature pipeline relies on

use geoscore_core::csv::{read_csv_str, write_csv};
use geoscore_core::{CoreError, CsvOptions, JoinMethod, Table, Value};

fn ags(codes: &[&str]) -> Vec<Value> {
    codes.iter().map(|c| Value::from(*c)).collect()
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_successive_left_merges_keep_base_rows() {
    let base = Table::from_columns(vec![("AGS", ags(&["01001000", "01002000", "01003000"]))]).unwrap();
    let births = Table::from_columns(vec![
        ("AGS", ags(&["01001000", "01003000"])),
        ("births_births", vec![Value::Number(0.01), Value::Number(0.02)]),
    ])
    .unwrap();
    let unemployment = Table::from_columns(vec![
        ("AGS", ags(&["01002000", "09999000"])),
        ("unemployment_total", vec![Value::Number(300.0), Value::Number(5.0)]),
    ])
    .unwrap();

    let merged = base
        .merge(&births, "AGS", JoinMethod::Left)
        .and_then(|t| t.merge(&unemployment, "AGS", JoinMethod::Left))
        .unwrap();

    assert_eq!(merged.shape(), (3, 3));
    assert_eq!(merged.column("AGS").unwrap(), &ags(&["01001000", "01002000", "01003000"])[..]);
    assert_eq!(merged.value(1, "births_births"), Some(&Value::Null));
    assert_eq!(merged.value(1, "unemployment_total"), Some(&Value::Number(300.0)));
}

#[test]
fn test_merge_requires_key_on_both_sides() {
    let left = Table::from_columns(vec![("AGS", ags(&["1"]))]).unwrap();
    let right = Table::from_columns(vec![("other", ags(&["1"]))]).unwrap();

    match left.merge(&right, "AGS", JoinMethod::Left) {
        Err(CoreError::ColumnNotFound(column)) => assert_eq!(column, "AGS"),
        other => panic!("Expected ColumnNotFound, got {:?}", other),
    }
}

#[test]
fn test_null_keys_never_match() {
    let left = Table::from_columns(vec![("k", vec![Value::Null, Value::from("a")])]).unwrap();
    let right = Table::from_columns(vec![
        ("k", vec![Value::Null, Value::from("a")]),
        ("v", vec![Value::Number(1.0), Value::Number(2.0)]),
    ])
    .unwrap();

    let merged = left.merge(&right, "k", JoinMethod::Inner).unwrap();
    assert_eq!(merged.num_rows(), 1);
    assert_eq!(merged.value(0, "v"), Some(&Value::Number(2.0)));
}

// =============================================================================
// Column Tests
// =============================================================================

#[test]
fn test_rename_with_prefix_skips_key() {
    let table = Table::from_columns(vec![
        ("AGS", ags(&["1"])),
        ("value", vec![Value::Number(1.0)]),
    ])
    .unwrap();

    let renamed = table
        .rename_with(|name| (name != "AGS").then(|| format!("births_{}", name)))
        .unwrap();
    assert_eq!(renamed.column_names(), vec!["AGS", "births_value"]);
}

#[test]
fn test_rename_into_existing_name_fails() {
    let table = Table::from_columns(vec![
        ("a", vec![Value::Number(1.0)]),
        ("b", vec![Value::Number(2.0)]),
    ])
    .unwrap();
    assert!(matches!(table.rename(&[("a", "b")]), Err(CoreError::DuplicateColumn(_))));
}

#[test]
fn test_drop_columns_ignores_missing() {
    let table = Table::from_columns(vec![
        ("a", vec![Value::Number(1.0)]),
        ("b", vec![Value::Number(2.0)]),
    ])
    .unwrap();
    let dropped = table.drop_columns(&["b", "does_not_exist"]);
    assert_eq!(dropped.column_names(), vec!["a"]);
}

#[test]
fn test_insert_column_replaces_in_place() {
    let mut table = Table::from_columns(vec![
        ("a", vec![Value::Number(1.0)]),
        ("b", vec![Value::Number(2.0)]),
    ])
    .unwrap();
    table.insert_column("a", vec![Value::Number(10.0)]).unwrap();
    assert_eq!(table.column_names(), vec!["a", "b"]);
    assert_eq!(table.value(0, "a"), Some(&Value::Number(10.0)));

    let err = table.insert_column("c", vec![]).unwrap_err();
    assert!(matches!(err, CoreError::LengthMismatch { expected: 1, actual: 0, .. }));
}

#[test]
fn test_divide_maps_zero_to_null() {
    let table = Table::from_columns(vec![
        ("votes", vec![Value::Number(50.0), Value::Number(10.0)]),
        ("total", vec![Value::Number(100.0), Value::Number(0.0)]),
    ])
    .unwrap();
    assert_eq!(
        table.divide("votes", "total").unwrap(),
        vec![Value::Number(0.5), Value::Null]
    );
}

// =============================================================================
// CSV Tests
// =============================================================================

#[test]
fn test_written_matrix_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("final").join("feature_matrix.csv");

    let first = Table::from_columns(vec![("AGS", ags(&["1", "2"]))]).unwrap();
    let second = Table::from_columns(vec![("AGS", ags(&["3"]))]).unwrap();
    write_csv(&first, &path).unwrap();
    write_csv(&second, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let read = read_csv_str(&content, &CsvOptions::default().with_text_columns(["AGS"])).unwrap();
    assert_eq!(read, second);
}
