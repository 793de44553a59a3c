//! Merge and reconcile stage: geographic features joined to statistical
//! observations, then renamed, relabelled, cleaned, coerced, normalized and
//! projected into [`EnergyRecord`]s.
//!
//! Each step is a public function over a [`Frame`] so it can be exercised on
//! its own. [`reconcile`] runs them in order and stops at the first error.
//! Rows that do not join and values that do not parse are not errors; they are
//! collected into [`Diagnostics`] and logged.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{
    data::{Value, coerce_float, coerce_integer, round_to_tenth},
    error::{PipelineError, Result},
    frame::{Frame, Row},
    mapping::{
        CODE, COUNTRY, ENERGY_TYPE, FLAG, GEO_KEY, GEOMETRY, ISO3, Mappings, PERCENTAGE, STAT_KEY,
        YEAR,
    },
    normalize::{code_to_flag, normalize_country_code_with},
    output::EnergyRecord,
};

pub const MERGED: &str = "merged";

/// Suffix given to statistical columns whose name the geographic side already
/// uses.
const COLLISION_SUFFIX: &str = "_stat";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    pub matched_rows: usize,
    /// Geographic keys with no statistical observation.
    pub unmatched_geo: Vec<String>,
    /// Statistical keys with no geographic feature.
    pub unmatched_stat: Vec<String>,
    /// Geographic rows dropped because `CNTR_ID` was blank.
    pub missing_key_geo: usize,
    /// Statistical rows dropped because `geo` was blank.
    pub missing_key_stat: usize,
}

impl JoinReport {
    /// True when every row on both sides found a partner.
    pub fn is_complete(&self) -> bool {
        self.unmatched_geo.is_empty()
            && self.unmatched_stat.is_empty()
            && self.missing_key_geo == 0
            && self.missing_key_stat == 0
    }
}

/// A value that could not be read as a number and became missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoercionIssue {
    /// Zero-based row in the merged frame.
    pub row: usize,
    pub column: String,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub join: JoinReport,
    pub coercion: Vec<CoercionIssue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub records: Vec<EnergyRecord>,
    pub diagnostics: Diagnostics,
}

pub fn reconcile(
    statistical: &Frame,
    geographic: &Frame,
    mappings: &Mappings,
) -> Result<Reconciliation> {
    let (frame, diagnostics) = reconcile_frame(statistical, geographic, mappings)?;
    let records = project_records(&frame)?;
    info!("Reconciled {} record(s)", records.len());
    Ok(Reconciliation {
        records,
        diagnostics,
    })
}

/// Steps 1 to 8: everything except the final projection.
pub fn reconcile_frame(
    statistical: &Frame,
    geographic: &Frame,
    mappings: &Mappings,
) -> Result<(Frame, Diagnostics)> {
    let (joined, join) = join_on_country(geographic, statistical, mappings)?;
    let renamed = rename_columns(joined, mappings)?;
    let labelled = map_energy_types(renamed, mappings)?;
    let trimmed = drop_columns(labelled, mappings);
    let (coerced, coercion) = coerce_numeric(trimmed)?;
    let rounded = round_percentage(coerced)?;
    let normalized = normalize_codes(rounded, mappings)?;
    let flagged = derive_flags(normalized)?;

    if !join.is_complete() {
        warn!(
            "Join left {} geographic and {} statistical key(s) unmatched; \
             dropped {} geographic and {} statistical row(s) without a key",
            join.unmatched_geo.len(),
            join.unmatched_stat.len(),
            join.missing_key_geo,
            join.missing_key_stat
        );
    }
    if !coercion.is_empty() {
        warn!("{} value(s) could not be parsed as numbers", coercion.len());
    }
    Ok((flagged, Diagnostics { join, coercion }))
}

struct LookupEntry<'a> {
    raw_key: String,
    row: &'a Row,
    matched: bool,
}

/// Inner join of geographic rows (`CNTR_ID`) with statistical rows (`geo`).
///
/// Keys are compared after country-code normalization, so an `EL`
/// observation meets a `GR` feature. Output rows keep geographic order, then
/// statistical order within a key. Statistical columns whose names clash with
/// geographic ones get a `_stat` suffix.
pub fn join_on_country(
    geographic: &Frame,
    statistical: &Frame,
    mappings: &Mappings,
) -> Result<(Frame, JoinReport)> {
    let geo_idx = geographic.require_column(GEO_KEY)?;
    let stat_idx = statistical.require_column(STAT_KEY)?;

    let mut lookup: HashMap<String, Vec<LookupEntry<'_>>> = HashMap::new();
    let mut missing_key_stat = 0usize;
    for (row_idx, row) in statistical.rows().iter().enumerate() {
        let Some(raw_key) = join_key(statistical, row_idx, stat_idx) else {
            debug!("Statistical row {} has no country code", row_idx + 2);
            missing_key_stat += 1;
            continue;
        };
        lookup
            .entry(normalize_country_code_with(raw_key, mappings))
            .or_default()
            .push(LookupEntry {
                raw_key: raw_key.to_string(),
                row,
                matched: false,
            });
    }

    let mut headers = geographic.headers().to_vec();
    for header in statistical.headers() {
        if geographic.has_column(header) {
            headers.push(format!("{header}{COLLISION_SUFFIX}"));
        } else {
            headers.push(header.clone());
        }
    }
    let mut joined = Frame::new(MERGED, headers);

    let mut unmatched_geo = BTreeSet::new();
    let mut matched_rows = 0usize;
    let mut missing_key_geo = 0usize;
    for (row_idx, geo_row) in geographic.rows().iter().enumerate() {
        let Some(raw_key) = join_key(geographic, row_idx, geo_idx) else {
            debug!("Geographic feature {} has no country code", row_idx + 1);
            missing_key_geo += 1;
            continue;
        };
        let key = normalize_country_code_with(raw_key, mappings);
        match lookup.get_mut(&key) {
            Some(bucket) => {
                for entry in bucket.iter_mut() {
                    entry.matched = true;
                    let mut combined = geo_row.clone();
                    combined.extend(entry.row.iter().cloned());
                    joined.push_row(combined);
                    matched_rows += 1;
                }
            }
            None => {
                unmatched_geo.insert(raw_key.to_string());
            }
        }
    }

    let unmatched_stat = lookup
        .values()
        .flatten()
        .filter(|entry| !entry.matched)
        .map(|entry| entry.raw_key.clone())
        .collect::<BTreeSet<_>>();

    debug!(
        "Joined {} geographic and {} statistical row(s) into {} row(s)",
        geographic.row_count(),
        statistical.row_count(),
        matched_rows
    );
    Ok((
        joined,
        JoinReport {
            matched_rows,
            unmatched_geo: unmatched_geo.into_iter().collect(),
            unmatched_stat: unmatched_stat.into_iter().collect(),
            missing_key_geo,
            missing_key_stat,
        },
    ))
}

/// Non-blank text key of a row; whitespace-only codes count as missing.
fn join_key(frame: &Frame, row: usize, column: usize) -> Option<&str> {
    frame.text(row, column).filter(|key| !key.trim().is_empty())
}

/// Applies the rename table. A rename onto a name the frame already uses is
/// an error, since later lookups would silently pick one of the two columns.
pub fn rename_columns(mut frame: Frame, mappings: &Mappings) -> Result<Frame> {
    for (from, to) in mappings.column_renames() {
        if from != to && frame.has_column(from) && frame.has_column(to) {
            return Err(PipelineError::DuplicateColumn {
                table: frame.name().to_string(),
                column: to.clone(),
            });
        }
        frame.rename_column(from, to);
    }
    Ok(frame)
}

/// Replaces raw energy-balance codes with their labels; unknown codes are
/// left as they are.
pub fn map_energy_types(mut frame: Frame, mappings: &Mappings) -> Result<Frame> {
    let idx = frame.require_column(ENERGY_TYPE)?;
    frame.map_column(idx, |_, cell| match cell {
        Some(Value::Text(code)) => Some(Value::Text(
            mappings
                .energy_label(&code)
                .map(str::to_string)
                .unwrap_or(code),
        )),
        other => other,
    });
    Ok(frame)
}

/// Removes the configured columns that are present.
pub fn drop_columns(mut frame: Frame, mappings: &Mappings) -> Frame {
    for column in mappings.drop_columns() {
        if frame.drop_column(column) {
            debug!("Dropped column '{column}'");
        }
    }
    frame
}

/// Year becomes an integer and the percentage a float. Text that does not
/// parse becomes a missing value and is reported.
pub fn coerce_numeric(mut frame: Frame) -> Result<(Frame, Vec<CoercionIssue>)> {
    let year_idx = frame.require_column(YEAR)?;
    let pct_idx = frame.require_column(PERCENTAGE)?;
    let mut issues = Vec::new();

    frame.map_column(year_idx, |row, cell| match cell {
        Some(Value::Text(raw)) => {
            let parsed = coerce_integer(&raw).filter(|y| i32::try_from(*y).is_ok());
            if parsed.is_none() {
                issues.push(issue(row, YEAR, raw));
            }
            parsed.map(Value::Integer)
        }
        Some(Value::Float(f)) => {
            let parsed = (f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64)
                .then_some(f as i64);
            if parsed.is_none() {
                issues.push(issue(row, YEAR, Value::Float(f).as_display()));
            }
            parsed.map(Value::Integer)
        }
        Some(Value::Integer(i)) => {
            if i32::try_from(i).is_err() {
                issues.push(issue(row, YEAR, i.to_string()));
                return None;
            }
            Some(Value::Integer(i))
        }
        Some(other) => {
            issues.push(issue(row, YEAR, other.as_display()));
            None
        }
        None => None,
    });
    frame.map_column(pct_idx, |row, cell| match cell {
        Some(Value::Text(raw)) => {
            let parsed = coerce_float(&raw);
            if parsed.is_none() {
                issues.push(issue(row, PERCENTAGE, raw));
            }
            parsed.map(Value::Float)
        }
        Some(Value::Integer(i)) => Some(Value::Float(i as f64)),
        Some(Value::Float(f)) => Some(Value::Float(f)),
        Some(other) => {
            issues.push(issue(row, PERCENTAGE, other.as_display()));
            None
        }
        None => None,
    });

    for item in &issues {
        debug!(
            "Row {}: '{}' is not numeric in column '{}'",
            item.row, item.raw, item.column
        );
    }
    Ok((frame, issues))
}

fn issue(row: usize, column: &str, raw: String) -> CoercionIssue {
    CoercionIssue {
        row,
        column: column.to_string(),
        raw,
    }
}

pub fn round_percentage(mut frame: Frame) -> Result<Frame> {
    let idx = frame.require_column(PERCENTAGE)?;
    frame.map_column(idx, |_, cell| match cell {
        Some(Value::Float(f)) => Some(Value::Float(round_to_tenth(f))),
        other => other,
    });
    Ok(frame)
}

/// Canonicalizes both country-code columns so they agree with each other and
/// with the EU membership set.
pub fn normalize_codes(mut frame: Frame, mappings: &Mappings) -> Result<Frame> {
    for column in [CODE, GEO_KEY] {
        let idx = frame.require_column(column)?;
        frame.map_column(idx, |_, cell| match cell {
            Some(Value::Text(code)) => Some(Value::Text(normalize_country_code_with(
                &code, mappings,
            ))),
            other => other,
        });
    }
    Ok(frame)
}

pub fn derive_flags(mut frame: Frame) -> Result<Frame> {
    let code_idx = frame.require_column(CODE)?;
    let flags = frame
        .column_cells(code_idx)
        .map(|cell| {
            let flag = code_to_flag(cell.and_then(Value::as_text).unwrap_or_default());
            Some(Value::Text(flag))
        })
        .collect();
    frame.set_column(FLAG, flags);
    Ok(frame)
}

/// Projects the merged frame onto the output columns. `ISO3_CODE` and
/// `geometry` are pass-through and default to empty when absent.
pub fn project_records(frame: &Frame) -> Result<Vec<EnergyRecord>> {
    let code = frame.require_column(CODE)?;
    let flag = frame.require_column(FLAG)?;
    let country = frame.require_column(COUNTRY)?;
    let energy_type = frame.require_column(ENERGY_TYPE)?;
    let percentage = frame.require_column(PERCENTAGE)?;
    let year = frame.require_column(YEAR)?;
    let cntr_id = frame.require_column(GEO_KEY)?;
    let iso3 = frame.column_index(ISO3);
    let geometry = frame.column_index(GEOMETRY);

    let text = |row: usize, idx: usize| {
        frame
            .cell(row, idx)
            .map(Value::as_display)
            .unwrap_or_default()
    };

    Ok((0..frame.row_count())
        .map(|row| EnergyRecord {
            code: text(row, code),
            flag: text(row, flag),
            country: text(row, country),
            energy_type: text(row, energy_type),
            renewable_percentage: frame.cell(row, percentage).and_then(Value::as_f64),
            year: frame
                .cell(row, year)
                .and_then(Value::as_i64)
                .and_then(|y| i32::try_from(y).ok()),
            cntr_id: text(row, cntr_id),
            iso3: iso3.map(|idx| text(row, idx)).unwrap_or_default(),
            geometry: geometry
                .and_then(|idx| frame.cell(row, idx))
                .map(|cell| match cell {
                    Value::Geometry(g) => g.clone(),
                    other => JsonValue::String(other.as_display()),
                })
                .unwrap_or(JsonValue::Null),
        })
        .collect())
}
