//! Unit tests for the built-in features
//!
//! Every feature is exercised against small exports written to a temporary
//! directory, so no test touches the network.

mod common;

use common::{close, election_21, municipalities, write_export};
use geoscore_core::csv::read_csv;
use geoscore_core::{CsvOptions, Value};
use geoscore_parser::ManifestParser;
use geoscore_runtime::features::{
    BirthsFeature, Election21Feature, Election25Feature, MunicipalityFeature, PopulationFeature,
    RoadAccidentsFeature, UnemploymentFeature,
};
use geoscore_runtime::{ComponentRegistry, ConfiguredFeature, Feature, RuntimeError};

// =============================================================================
// Municipality Tests
// =============================================================================

#[test]
fn test_municipality_load_transform() {
    let dir = tempfile::tempdir().unwrap();
    let feature = MunicipalityFeature::new(municipalities(dir.path()));

    let loaded = feature.load().unwrap();
    assert_eq!(loaded.num_rows(), 3);
    assert_eq!(loaded.value(2, "AGS"), Some(&Value::from("01051003")));

    let table = feature.transform(loaded).unwrap();
    assert_eq!(
        table.column_names(),
        vec!["Persons", "Area", "Population Density", "AGS"]
    );
    assert_eq!(table.value(0, "Persons"), Some(&Value::Number(1000.0)));
}

#[test]
fn test_missing_raw_file_is_a_load_error() {
    let feature = MunicipalityFeature::new("does/not/exist.csv");
    match feature.load() {
        Err(RuntimeError::DataSource { path, .. }) => {
            assert_eq!(path, std::path::PathBuf::from("does/not/exist.csv"))
        }
        other => panic!("Expected DataSource, got {:?}", other),
    }

    let configured = ConfiguredFeature::new("municipalities", Box::new(feature), "AGS");
    assert!(matches!(
        configured.load_transform(),
        Err(RuntimeError::FeatureLoad { .. })
    ));
}

// =============================================================================
// Births Tests
// =============================================================================

#[test]
fn test_births_per_capita() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_export(
        dir.path(),
        "births.csv",
        5,
        &["01001;Flensburg;10", "01002;Kiel;.", "01003;Elsewhere;7"],
        4,
    );
    let feature = BirthsFeature::new(raw, municipalities(dir.path()));

    let table = feature.load_transform_once();
    assert_eq!(table.column_names(), vec!["AGS", "births"]);
    assert_eq!(table.value(0, "AGS"), Some(&Value::from("01001000")));
    assert!(close(table.value(0, "births").and_then(Value::as_f64), 0.01));
    assert_eq!(table.value(1, "births"), Some(&Value::Null));
    // no municipality row to normalise by
    assert_eq!(table.value(2, "births"), Some(&Value::Null));
}

// =============================================================================
// Population Tests
// =============================================================================

#[test]
fn test_population_shares() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_export(
        dir.path(),
        "population.csv",
        6,
        &[
            "31.12.2022;01001;Flensburg;unter 3 Jahre;30;15;15",
            "31.12.2022;01001;Flensburg;75 Jahre und mehr;70;30;40",
            "31.12.2022;01001;Flensburg;Insgesamt;1000;500;500",
            "31.12.2022;01002;Kiel;unter 3 Jahre;5;-;-",
            "31.12.2022;01002;Kiel;Insgesamt;0;0;0",
        ],
        4,
    );
    let tform = dir.path().join("tform").join("population.csv");
    let feature = PopulationFeature::new(raw).with_tform_data_path(&tform);

    let table = feature.load_transform_once();
    assert_eq!(
        table.column_names(),
        vec!["AGS", "age_75_and_over", "total_population", "age_under_3"]
    );
    assert!(close(table.value(0, "age_under_3").and_then(Value::as_f64), 0.03));
    assert!(close(table.value(0, "age_75_and_over").and_then(Value::as_f64), 0.07));
    assert_eq!(table.value(0, "total_population"), Some(&Value::Number(1000.0)));
    assert_eq!(table.value(1, "age_under_3"), Some(&Value::Null));
    assert_eq!(table.value(1, "age_75_and_over"), Some(&Value::Null));

    let written = read_csv(&tform, &CsvOptions::default().with_text_columns(["AGS"])).unwrap();
    assert_eq!(written.shape(), table.shape());
}

// =============================================================================
// Unemployment Tests
// =============================================================================

#[test]
fn test_unemployment_drops_description_row() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_export(
        dir.path(),
        "unemployment.csv",
        7,
        &[";;", ";;insgesamt", "01001;Flensburg;3000", "01002;Kiel;."],
        4,
    );
    let feature = UnemploymentFeature::new(raw);

    let table = feature.load_transform_once();
    assert_eq!(table.column_names(), vec!["unemployment_total", "AGS"]);
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.value(0, "unemployment_total"), Some(&Value::Number(3000.0)));
    assert_eq!(table.value(1, "AGS"), Some(&Value::from("01002000")));
    assert_eq!(table.value(1, "unemployment_total"), Some(&Value::Null));
}

// =============================================================================
// Road Accident Tests
// =============================================================================

#[test]
fn test_road_accidents_per_capita() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_export(
        dir.path(),
        "accidents.csv",
        7,
        &["01001;Flensburg;20;5;15;1;6", "01002;Kiel;40;-;30;0;8"],
        4,
    );
    let feature = RoadAccidentsFeature::new(raw, municipalities(dir.path()));

    let table = feature.load_transform_once();
    assert_eq!(
        table.column_names(),
        vec![
            "accident_count",
            "injury_accidents",
            "property_damage_accidents",
            "fatalities",
            "injured",
            "AGS"
        ]
    );
    assert!(close(table.value(0, "accident_count").and_then(Value::as_f64), 0.02));
    assert!(close(table.value(1, "accident_count").and_then(Value::as_f64), 0.02));
    assert_eq!(table.value(1, "injury_accidents"), Some(&Value::Null));
    assert!(close(table.value(1, "fatalities").and_then(Value::as_f64), 0.0));
}

// =============================================================================
// Election Tests
// =============================================================================

#[test]
fn test_election_21_shares_per_municipality() {
    let dir = tempfile::tempdir().unwrap();
    let feature = Election21Feature::new(election_21(dir.path()))
        .with_url("http://127.0.0.1:9/unused.zip")
        .with_reuse_download(true);

    let loaded = feature.load().unwrap();
    // the row without a municipality number is dropped
    assert_eq!(loaded.num_rows(), 3);
    assert!(loaded.has_column("eligible_voters"));
    assert!(loaded.has_column("E_valid_votes"));

    let table = feature.transform(loaded).unwrap();
    assert_eq!(
        table.column("AGS").unwrap(),
        &[Value::from("01001000"), Value::from("01003001")]
    );
    assert_eq!(table.value(0, "eligible_voters"), Some(&Value::Number(200.0)));
    assert!(close(table.value(0, "election_participation").and_then(Value::as_f64), 0.7));
    assert!(close(table.value(0, "Z_SPD").and_then(Value::as_f64), 60.0 / 140.0));
    assert!(close(table.value(0, "E_valid_votes").and_then(Value::as_f64), 138.0 / 140.0));
    assert_eq!(table.value(1, "election_participation"), Some(&Value::Null));
    assert_eq!(table.value(1, "Z_SPD"), Some(&Value::Null));
}

#[test]
fn test_election_25_skips_banner() {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = dir.path().join("election_2025");
    std::fs::create_dir_all(&raw_dir).unwrap();
    let content = [
        "# Bundestagswahl 2025",
        "# Ergebnisse nach Wahlbezirken",
        "#",
        "",
        "Land;Regierungsbezirk;Kreis;Gemeinde;Gemeindename;Wahlberechtigte (A);Wählende (B);Gültige - Erststimmen;SPD - Erststimmen;Gültige - Zweitstimmen;SPD - Zweitstimmen",
        "01;0;01;000;Flensburg;100;50;50;20;50;25",
        "01;0;01;000;Flensburg;100;50;50;10;50;15",
    ]
    .join("\n");
    std::fs::write(raw_dir.join("btw25_wbz_ergebnisse.csv"), content).unwrap();

    let feature = Election25Feature::new(&raw_dir)
        .with_url("http://127.0.0.1:9/unused.zip")
        .with_reuse_download(true);
    let table = feature.load_transform_once();

    assert_eq!(table.num_rows(), 1);
    assert!(!table.has_column("Gemeindename"));
    assert!(close(table.value(0, "election_participation").and_then(Value::as_f64), 0.5));
    assert!(close(table.value(0, "SPD - Zweitstimmen").and_then(Value::as_f64), 0.4));
    assert!(close(table.value(0, "valid_votes_erststimmen").and_then(Value::as_f64), 1.0));
    assert_eq!(table.value(0, "total_voters"), Some(&Value::Number(100.0)));
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_manifest_feature_with_homogeneity() {
    let dir = tempfile::tempdir().unwrap();
    let raw_dir = election_21(dir.path());
    let yaml = format!(
        r#"
municipalities:
  class: MunicipalityFeature
features:
  - name: election_21
    class: Election21Feature
    params:
      url: http://127.0.0.1:9/unused.zip
      raw_data_path: "{}"
      reuse_download: true
    before_transforms:
      - name: spd_spread
        class: HomogeneityFeatureEngineering
        input_columns: [Z_SPD]
        output_column: spd_cv
        params:
          weight_column: eligible_voters
"#,
        raw_dir.display()
    );
    let manifest = ManifestParser::parse(&yaml).unwrap();

    let feature = ComponentRegistry::with_builtins()
        .resolve_feature(&manifest.features[0], &manifest.matrix.join_key)
        .unwrap();
    let table = feature.load_transform().unwrap();

    assert!(close(table.value(0, "spd_cv").and_then(Value::as_f64), 1.0 / 3.0));
    // a single polling district has no spread
    assert_eq!(table.value(1, "spd_cv"), Some(&Value::Null));
}

/// Load and transform without nested transforms
trait LoadTransformOnce {
    fn load_transform_once(&self) -> geoscore_core::Table;
}

impl<F: Feature> LoadTransformOnce for F {
    fn load_transform_once(&self) -> geoscore_core::Table {
        let loaded = self.load().unwrap();
        self.transform(loaded).unwrap()
    }
}
