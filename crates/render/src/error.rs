//! Error types for chart rendering

use chrono::NaiveDate;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ganttgen-render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors raised while rendering a chart.
#[derive(Error, Debug, Diagnostic)]
pub enum RenderError {
    /// Nothing to draw.
    #[error("Cannot render an empty plan")]
    #[diagnostic(
        code(ganttgen::render::no_rows),
        help("Add at least one work package or milestone")
    )]
    NoRows,

    /// No row is dated and no explicit window was given.
    #[error("Cannot infer the date window: no row has dates")]
    #[diagnostic(
        code(ganttgen::render::no_dates),
        help("Pass --min-date and --max-date")
    )]
    NoDates,

    /// The window ends before it starts.
    #[error("Date window is empty: {min} is after {max}")]
    #[diagnostic(code(ganttgen::render::invalid_window))]
    InvalidWindow {
        /// Window start.
        min: NaiveDate,
        /// Window end.
        max: NaiveDate,
    },

    /// The output file could not be written.
    #[error("Failed to write chart to {}: {source}", path.display())]
    #[diagnostic(code(ganttgen::render::io))]
    Io {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Create an I/O error for an output path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
