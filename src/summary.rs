//! Stage summaries for inspecting the pipeline: shape, column names and the
//! first few rows of a frame or record set, rendered as a text table.

use std::fmt::Write as _;

use crate::{
    data::Value,
    frame::Frame,
    output::{self, EnergyRecord, EuYearAggregate},
    stats, table,
};

pub const DEFAULT_SAMPLE_ROWS: usize = 5;
pub const DEFAULT_MAX_CELL: usize = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub sample: Vec<Vec<String>>,
    pub notes: Vec<String>,
}

impl StageSummary {
    pub fn from_frame(stage: &str, frame: &Frame, sample_rows: usize) -> Self {
        let sample = frame
            .rows()
            .iter()
            .take(sample_rows)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            stage: stage.to_string(),
            rows: frame.row_count(),
            columns: frame.headers().to_vec(),
            sample,
            notes: Vec::new(),
        }
    }

    pub fn from_records(stage: &str, records: &[EnergyRecord], sample_rows: usize) -> Self {
        let sample = records
            .iter()
            .take(sample_rows)
            .map(|record| record.to_row(true))
            .collect();
        let mut notes = Vec::new();
        if let Some(s) = stats::summarize_percentages(records) {
            notes.push(format!(
                "Renewable Percentage: count {}, min {:.1}, max {:.1}, mean {:.2}, median {:.2}",
                s.count, s.min, s.max, s.mean, s.median
            ));
        }
        Self {
            stage: stage.to_string(),
            rows: records.len(),
            columns: output::record_headers(true),
            sample,
            notes,
        }
    }

    pub fn from_aggregate(stage: &str, aggregate: &[EuYearAggregate], sample_rows: usize) -> Self {
        Self {
            stage: stage.to_string(),
            rows: aggregate.len(),
            columns: output::AGGREGATE_COLUMNS.map(String::from).to_vec(),
            sample: aggregate
                .iter()
                .take(sample_rows)
                .map(|a| vec![a.year.to_string(), format!("{:.2}", a.renewable_percentage_mean)])
                .collect(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn render(&self, max_cell: Option<usize>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== {} ===", self.stage);
        let _ = writeln!(out, "shape: {} row(s) x {} column(s)", self.rows, self.columns.len());
        let _ = writeln!(out, "columns: {}", self.columns.join(", "));
        for note in &self.notes {
            let _ = writeln!(out, "{note}");
        }
        if !self.sample.is_empty() {
            out.push_str(&table::render_table(&self.columns, &self.sample, max_cell));
        }
        out
    }
}
