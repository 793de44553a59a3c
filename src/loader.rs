//! Loading of the statistical and geographic sources.
//!
//! Every entry point checks that its inputs exist before opening anything, so
//! a wrong path always surfaces as [`PipelineError::MissingInput`] rather than
//! as an I/O or parse error from deeper down.

use std::{
    collections::HashSet,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    data::{Value, json_to_cell, parse_cell},
    error::{PipelineError, Result},
    frame::Frame,
    io_utils,
    mapping::GEOMETRY,
    melt,
};

/// Eurostat statistics in long layout, one row per observation.
pub type StatisticalTable = Frame;
/// GISCO features, one row per country with a `geometry` column.
pub type GeoTable = Frame;

pub const STATISTICAL: &str = "statistical";
pub const GEOGRAPHIC: &str = "geographic";

/// File names picked up by [`load_combined`] when no pattern is given.
pub const DEFAULT_COMBINE_PATTERN: &str = r"^estat_nrg_.*\.(csv|tsv)$";

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Field delimiter; resolved from the file extension when `None`.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, JsonValue>>,
    #[serde(default)]
    geometry: Option<JsonValue>,
}

/// Loads both sources with default options.
pub fn load(data_path: &Path, geo_path: &Path) -> Result<(StatisticalTable, GeoTable)> {
    load_with(data_path, geo_path, &LoadOptions::default())
}

pub fn load_with(
    data_path: &Path,
    geo_path: &Path,
    options: &LoadOptions,
) -> Result<(StatisticalTable, GeoTable)> {
    ensure_file(data_path)?;
    ensure_file(geo_path)?;
    let statistical = load_statistical(data_path, options)?;
    let geographic = load_geo(geo_path)?;
    Ok((statistical, geographic))
}

pub fn ensure_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}

/// Reads one delimited statistical file. Wide Eurostat layouts are melted to
/// long layout on the way in.
pub fn load_statistical(path: &Path, options: &LoadOptions) -> Result<StatisticalTable> {
    ensure_file(path)?;
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    let mut frame = Frame::new(STATISTICAL, headers);
    for record in reader.byte_records() {
        let decoded = io_utils::decode_record(&record?, options.encoding)?;
        frame.push_row(decoded.iter().map(|field| parse_cell(field)).collect());
    }

    if melt::is_wide_layout(frame.headers()) {
        debug!("{path:?} uses the wide layout; melting");
        frame = melt::melt_wide(&frame)?;
    }
    info!(
        "Loaded {} statistical row(s) from {:?}",
        frame.row_count(),
        path
    );
    Ok(frame)
}

/// Reads a GeoJSON `FeatureCollection`. Property names become columns (in
/// order of first appearance) followed by `geometry`.
pub fn load_geo(path: &Path) -> Result<GeoTable> {
    ensure_file(path)?;
    let reader = BufReader::new(File::open(path)?);
    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|err| PipelineError::GeoJson {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    if collection.kind != "FeatureCollection" {
        return Err(PipelineError::GeoJson {
            path: path.to_path_buf(),
            reason: format!("expected a FeatureCollection, found '{}'", collection.kind),
        });
    }

    let mut headers = Vec::new();
    let mut seen = HashSet::new();
    for feature in &collection.features {
        for key in feature.properties.iter().flat_map(|props| props.keys()) {
            if key != GEOMETRY && seen.insert(key.clone()) {
                headers.push(key.clone());
            }
        }
    }
    headers.push(GEOMETRY.to_string());

    let mut frame = Frame::new(GEOGRAPHIC, headers.clone());
    for feature in collection.features {
        let props = feature.properties.unwrap_or_default();
        let mut row = headers[..headers.len() - 1]
            .iter()
            .map(|key| props.get(key).and_then(json_to_cell))
            .collect::<Vec<_>>();
        row.push(
            feature
                .geometry
                .filter(|g| !g.is_null())
                .map(Value::Geometry),
        );
        frame.push_row(row);
    }
    info!(
        "Loaded {} geographic feature(s) from {:?}",
        frame.row_count(),
        path
    );
    Ok(frame)
}

/// Loads every file in `dir` whose name matches `pattern` (sorted by name)
/// and concatenates their rows. All files must share the same header.
pub fn load_combined(dir: &Path, pattern: &Regex, options: &LoadOptions) -> Result<StatisticalTable> {
    if !dir.is_dir() {
        return Err(PipelineError::MissingInput {
            path: dir.to_path_buf(),
        });
    }
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.is_match(name))
        })
        .collect::<Vec<PathBuf>>();
    paths.sort();
    if paths.is_empty() {
        return Err(PipelineError::MissingInput {
            path: dir.join(pattern.as_str()),
        });
    }

    let mut combined: Option<Frame> = None;
    for path in &paths {
        let frame = load_statistical(path, options)?;
        match combined.as_mut() {
            None => combined = Some(frame),
            Some(acc) => {
                if acc.headers() != frame.headers() {
                    return Err(PipelineError::HeaderMismatch {
                        path: path.clone(),
                        expected: acc.headers().join(","),
                        found: frame.headers().join(","),
                    });
                }
                for row in frame.into_rows() {
                    acc.push_row(row);
                }
            }
        }
    }
    let combined = combined.unwrap_or_else(|| Frame::new(STATISTICAL, Vec::new()));
    info!(
        "Combined {} statistical file(s) from {:?} into {} row(s)",
        paths.len(),
        dir,
        combined.row_count()
    );
    Ok(combined)
}
