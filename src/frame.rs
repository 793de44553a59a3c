//! In-memory table the pipeline steps pass between each other.
//!
//! A [`Frame`] is a named list of headers plus rows of optional [`Value`]
//! cells. Rows always have exactly one cell per header; `None` marks a missing
//! value. The name identifies the frame in [`PipelineError::MissingColumn`]
//! errors ("statistical", "geographic", "merged").

use crate::{
    data::Value,
    error::{PipelineError, Result},
};

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    name: String,
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Frame {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Builds a frame from raw text rows; empty strings become missing cells.
    pub fn from_text_rows<S: AsRef<str>>(
        name: impl Into<String>,
        headers: &[S],
        rows: &[Vec<S>],
    ) -> Self {
        let mut frame = Frame::new(
            name,
            headers.iter().map(|h| h.as_ref().to_string()).collect(),
        );
        for row in rows {
            frame.push_row(
                row.iter()
                    .map(|cell| crate::data::parse_cell(cell.as_ref()))
                    .collect(),
            );
        }
        frame
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::missing_column(&self.name, name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    /// Text of a cell, if the cell is present and holds text.
    pub fn text(&self, row: usize, column: usize) -> Option<&str> {
        self.cell(row, column).and_then(Value::as_text)
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Removes a column if present; returns whether anything was removed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Replaces the column's cells when it exists, otherwise appends it.
    pub fn set_column(&mut self, name: &str, cells: Vec<Option<Value>>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(None);
                }
                self.headers.len() - 1
            }
        };
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row[idx] = cell;
        }
    }

    /// Applies `f` to every cell of column `idx` in place.
    pub fn map_column<F>(&mut self, idx: usize, mut f: F)
    where
        F: FnMut(usize, Option<Value>) -> Option<Value>,
    {
        for (row_idx, row) in self.rows.iter_mut().enumerate() {
            let current = row[idx].take();
            row[idx] = f(row_idx, current);
        }
    }

    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = Option<&Value>> + '_ {
        self.rows.iter().map(move |row| row.get(idx).and_then(Option::as_ref))
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}
