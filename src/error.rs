use std::io;
use thiserror::Error;

/// Failures while turning an input table into a record store.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: {column} value '{value}' is not a number in [-{bound}, {bound}]")]
    InvalidCoordinate {
        row: usize,
        column: &'static str,
        value: String,
        bound: f64,
    },

    #[error("row {row}: WiFi Channel value '{value}' is neither an integer nor #N/A")]
    InvalidChannel { row: usize, value: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("calculation cancelled")]
    Cancelled,

    #[error("calculation failed, check input validity ({0})")]
    Computation(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("missing columns in {kind} file: {}", .columns.join(", "))]
    MissingColumns {
        kind: &'static str,
        columns: Vec<String>,
    },

    #[error("{kind} file row {row}: {column} value '{value}' is not a valid coordinate")]
    InvalidCoordinate {
        kind: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("unrecognised color '{0}'")]
    Color(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by [`crate::Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no points imported yet")]
    NothingImported,

    #[error("closest points have not been calculated yet")]
    NothingCalculated,

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
