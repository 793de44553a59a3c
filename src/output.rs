//! The record types handed to presentation code, and their CSV/JSON export.
//!
//! [`OUTPUT_COLUMNS`] is the full contract: renderers must not assume any
//! other column exists.

use std::io::Write;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{
    error::Result,
    io_utils,
    mapping::{CODE, COUNTRY, ENERGY_TYPE, FLAG, GEO_KEY, GEOMETRY, ISO3, PERCENTAGE, YEAR},
};

pub const OUTPUT_COLUMNS: [&str; 9] = [
    CODE,
    FLAG,
    COUNTRY,
    ENERGY_TYPE,
    PERCENTAGE,
    YEAR,
    GEO_KEY,
    ISO3,
    GEOMETRY,
];

pub const AGGREGATE_COLUMNS: [&str; 2] = [YEAR, PERCENTAGE];

/// One (country, energy type, year) observation after reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyRecord {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Flag")]
    pub flag: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Energy Type")]
    pub energy_type: String,
    #[serde(rename = "Renewable Percentage")]
    pub renewable_percentage: Option<f64>,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "CNTR_ID")]
    pub cntr_id: String,
    #[serde(rename = "ISO3_CODE")]
    pub iso3: String,
    pub geometry: JsonValue,
}

/// EU-wide mean for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EuYearAggregate {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Renewable Percentage")]
    pub renewable_percentage_mean: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl EnergyRecord {
    /// Cells in [`OUTPUT_COLUMNS`] order, optionally without geometry.
    pub fn to_row(&self, include_geometry: bool) -> Vec<String> {
        let mut row = vec![
            self.code.clone(),
            self.flag.clone(),
            self.country.clone(),
            self.energy_type.clone(),
            self.renewable_percentage
                .map(|v| format!("{v:.1}"))
                .unwrap_or_default(),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            self.cntr_id.clone(),
            self.iso3.clone(),
        ];
        if include_geometry {
            row.push(if self.geometry.is_null() {
                String::new()
            } else {
                self.geometry.to_string()
            });
        }
        row
    }
}

pub fn record_headers(include_geometry: bool) -> Vec<String> {
    OUTPUT_COLUMNS
        .iter()
        .filter(|c| include_geometry || **c != GEOMETRY)
        .map(|c| c.to_string())
        .collect()
}

/// Writes records in the output column order. Geometry is serialized as
/// compact GeoJSON text in CSV.
pub fn write_records<W: Write>(
    writer: W,
    records: &[EnergyRecord],
    format: ExportFormat,
    include_geometry: bool,
) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut csv = io_utils::open_csv_writer(writer, io_utils::DEFAULT_CSV_DELIMITER);
            csv.write_record(record_headers(include_geometry))?;
            for record in records {
                csv.write_record(record.to_row(include_geometry))?;
            }
            csv.flush()?;
        }
        ExportFormat::Json => {
            let values = records
                .iter()
                .map(|record| -> Result<JsonValue> {
                    let mut value = serde_json::to_value(record)?;
                    if !include_geometry && let Some(obj) = value.as_object_mut() {
                        obj.remove(GEOMETRY);
                    }
                    Ok(value)
                })
                .collect::<Result<Vec<_>>>()?;
            write_json(writer, &values)?;
        }
    }
    Ok(())
}

pub fn write_aggregate<W: Write>(
    writer: W,
    aggregate: &[EuYearAggregate],
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut csv = io_utils::open_csv_writer(writer, io_utils::DEFAULT_CSV_DELIMITER);
            csv.write_record(AGGREGATE_COLUMNS)?;
            for row in aggregate {
                csv.write_record([
                    row.year.to_string(),
                    row.renewable_percentage_mean.to_string(),
                ])?;
            }
            csv.flush()?;
        }
        ExportFormat::Json => write_json(writer, aggregate)?,
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
