//! Shared fixtures for SDK tests
//!
//! Features are registered under a test module and serve fixed tables, so
//! the builder can be exercised without any data files.

#![allow(dead_code)]

use geoscore_core::{Table, Value};
use geoscore_parser::{FeaturesManifest, ManifestParser};
use geoscore_runtime::{ComponentRegistry, Feature, Result, RuntimeError};
use std::io;

pub const MOCK_MODULE: &str = "tests::mock";

/// Serves the same table on every load
pub struct StaticFeature {
    kind: String,
    table: Table,
}

impl Feature for StaticFeature {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn load(&self) -> Result<Table> {
        Ok(self.table.clone())
    }

    fn transform(&self, table: Table) -> Result<Table> {
        Ok(table)
    }
}

/// Fails to read its data
pub struct MissingExportFeature;

impl Feature for MissingExportFeature {
    fn kind(&self) -> &str {
        "MissingExport"
    }

    fn load(&self) -> Result<Table> {
        Err(RuntimeError::Io(io::Error::new(io::ErrorKind::NotFound, "export.csv")))
    }

    fn transform(&self, table: Table) -> Result<Table> {
        Ok(table)
    }
}

pub fn text(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

pub fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

fn register_static(registry: &mut ComponentRegistry, class: &'static str, table: Table) {
    registry.register_feature_factory(MOCK_MODULE, class, move |_| {
        let feature: Box<dyn Feature> = Box::new(StaticFeature {
            kind: class.to_string(),
            table: table.clone(),
        });
        Ok(feature)
    });
}

/// Built-ins plus the mock features:
///
/// - `Municipalities`: AGS 1, 2, 3 with a `name`
/// - `Births`: AGS 1, 2
/// - `Unemployment`: AGS 2, 3
/// - `NoKey`: a table without `AGS`
/// - `Broken`: cannot be constructed
/// - `MissingExport`: fails on load
pub fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::with_builtins();

    register_static(
        &mut registry,
        "Municipalities",
        Table::from_columns(vec![
            ("AGS", text(&["1", "2", "3"])),
            ("name", text(&["Flensburg", "Kiel", "Lübeck"])),
        ])
        .unwrap(),
    );
    register_static(
        &mut registry,
        "Births",
        Table::from_columns(vec![
            ("AGS", text(&["1", "2"])),
            ("births", numbers(&[10.0, 20.0])),
        ])
        .unwrap(),
    );
    register_static(
        &mut registry,
        "Unemployment",
        Table::from_columns(vec![
            ("AGS", text(&["2", "3"])),
            ("rate", numbers(&[0.1, 0.2])),
        ])
        .unwrap(),
    );
    register_static(
        &mut registry,
        "NoKey",
        Table::from_columns(vec![("code", text(&["1"])), ("value", numbers(&[1.0]))]).unwrap(),
    );

    registry.register_feature_factory(MOCK_MODULE, "Broken", |descriptor| {
        Err(RuntimeError::InvalidParams {
            component: descriptor.class_name.clone(),
            message: "cannot be constructed".to_string(),
        })
    });
    registry.register_feature_factory(MOCK_MODULE, "MissingExport", |_| {
        let feature: Box<dyn Feature> = Box::new(MissingExportFeature);
        Ok(feature)
    });

    registry
}

/// Manifest over the mock module with the given feature classes
/// (`name: class` pairs) and extra `matrix` settings
pub fn manifest(features: &[(&str, &str)], matrix: &str) -> FeaturesManifest {
    let mut yaml = format!(
        "municipalities:\n  class: Municipalities\n  module: {}\nfeatures:\n",
        MOCK_MODULE
    );
    for (name, class) in features {
        yaml.push_str(&format!(
            "  - name: {}\n    class: {}\n    module: {}\n",
            name, class, MOCK_MODULE
        ));
    }
    yaml.push_str("matrix:\n  save_output: false\n");
    for line in matrix.lines().filter(|l| !l.trim().is_empty()) {
        yaml.push_str(&format!("  {}\n", line.trim()));
    }
    ManifestParser::parse(&yaml).unwrap()
}

/// Filtering fixture: five municipalities in three states
pub fn regions() -> Table {
    Table::from_columns(vec![
        ("AGS", text(&["02000", "02123", "03000", "09162", "09163"])),
        ("land", text(&["Hamburg", "Hamburg", "Niedersachsen", "Bayern", "Bayern"])),
        ("value", numbers(&[1.0, 2.0, 3.0, 4.0, 5.0])),
    ])
    .unwrap()
}

/// Filtering fixture: four feature columns over four rows
pub fn census() -> Table {
    Table::from_columns(vec![
        ("census_a", numbers(&[1.0, 2.0, 3.0, 4.0])),
        ("census_b", numbers(&[5.0, 6.0, 7.0, 8.0])),
        ("feature_c", numbers(&[9.0, 10.0, 11.0, 12.0])),
        ("feature_d", numbers(&[13.0, 14.0, 15.0, 16.0])),
    ])
    .unwrap()
}
