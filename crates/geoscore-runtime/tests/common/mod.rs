//! Shared fixtures for runtime tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write an export with `banner` lines above and `footer` lines below the rows
pub fn write_export(dir: &Path, name: &str, banner: usize, rows: &[&str], footer: usize) -> PathBuf {
    let mut lines: Vec<String> = (0..banner).map(|i| format!("Banner line {}", i)).collect();
    lines.extend(rows.iter().map(|r| r.to_string()));
    lines.extend((0..footer).map(|i| format!("Footnote {}", i)));

    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

pub fn municipalities(dir: &Path) -> PathBuf {
    write_export(
        dir,
        "municipalities.csv",
        6,
        &[
            "010010000000;Flensburg, Stadt;1000;56.73;17.6",
            "010020000000;Kiel, Landeshauptstadt;2000;118.65;16.9",
            "010515163003;Wesselburen, Stadt;0;5.0;0",
        ],
        4,
    )
}

pub fn election_21(dir: &Path) -> PathBuf {
    let raw_dir = dir.join("election_2021");
    fs::create_dir_all(&raw_dir).unwrap();
    let content = [
        "Land;Regierungsbezirk;Kreis;Gemeinde;Wahlbezirk;Wahlberechtigte (A);Wählende (B);E_Gültige;E_SPD;Z_Gültige;Z_SPD",
        "01;0;01;000;0001;100;80;78;30;79;40",
        "01;0;01;000;0002;100;60;60;20;60;20",
        "01;0;02;;0001;50;40;40;10;40;10",
        "01;0;03;1;0001;0;0;0;0;0;0",
    ]
    .join("\n");
    fs::write(raw_dir.join("btw21_wbz_ergebnisse.csv"), content).unwrap();
    raw_dir
}

pub fn close(actual: Option<f64>, expected: f64) -> bool {
    actual.map_or(false, |a| (a - expected).abs() < 1e-9)
}
