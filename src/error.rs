//! Error type shared by the loader and the reconcile pipeline.
//!
//! Loader failures are fatal and surface to the caller. Row-level problems
//! (unparseable numbers, unmatched join keys) are not errors: they are
//! reported through [`crate::reconcile::Diagnostics`] instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// An input path does not resolve to a readable file. Raised before any
    /// parse is attempted.
    #[error("missing input file {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("{table} table has no '{column}' column")]
    MissingColumn { table: String, column: String },

    /// A rename would give two columns of one table the same name.
    #[error("{table} table already has a '{column}' column")]
    DuplicateColumn { table: String, column: String },

    #[error("header mismatch in {}: expected [{expected}], found [{found}]", path.display())]
    HeaderMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("wide layout row {row}: expected {expected} dimension code(s), found {found}")]
    WideLayout {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("failed to decode text with encoding {0}")]
    Encoding(&'static str),

    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),

    #[error("invalid GeoJSON in {}: {reason}", path.display())]
    GeoJson { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn missing_column(table: &str, column: &str) -> Self {
        PipelineError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
