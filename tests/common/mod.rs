#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use eu_renewables::frame::Frame;
use tempfile::{TempDir, tempdir};

pub const SAMPLE_CSV: &str = "nrg_ind_ren_sample.csv";
pub const SAMPLE_GEOJSON: &str = "europe_sample.geojson";
pub const SAMPLE_WIDE_TSV: &str = "estat_nrg_ind_ren_wide.tsv";
pub const SAMPLE_CONFIG: &str = "mappings.yml";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    fixture_dir().join(name)
}

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Copies a fixture into the workspace under `name`.
    pub fn copy_fixture(&self, fixture: &str, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::copy(fixture_path(fixture), &path).expect("copy fixture");
        path
    }
}

/// A long-layout statistical frame with one `REN` row per `(geo, year, value)`.
pub fn statistical_frame(rows: &[(&str, &str, &str)]) -> Frame {
    let rows = rows
        .iter()
        .map(|(geo, year, value)| vec!["A", "REN", "PC", *geo, *year, *value])
        .collect::<Vec<_>>();
    Frame::from_text_rows(
        "statistical",
        &["freq", "nrg_bal", "unit", "geo", "TIME_PERIOD", "OBS_VALUE"],
        &rows,
    )
}

/// A geographic frame with one feature per `(CNTR_ID, NAME_ENGL)` and no
/// geometry column.
pub fn geographic_frame(features: &[(&str, &str)]) -> Frame {
    let rows = features
        .iter()
        .map(|(id, name)| vec![*id, *name])
        .collect::<Vec<_>>();
    Frame::from_text_rows("geographic", &["CNTR_ID", "NAME_ENGL"], &rows)
}
