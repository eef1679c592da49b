//! SVG Gantt charts for ganttgen
//!
//! Consumes the render rows produced by `ganttgen-core` and draws a static
//! chart:
//! - labels in a left gutter, indented by nesting depth
//! - work packages as bars coloured by category
//! - milestones as diamonds and nested groups as brackets
//! - orthogonal connectors between dependent work packages
//!
//! Output is deterministic: the same rows and options always give the same
//! bytes.

mod error;
pub mod palette;
pub mod route;
mod svg;
pub mod timeline;

pub use error::{RenderError, Result};

use chrono::NaiveDate;
use ganttgen_core::RenderRow;
use std::path::Path;
use tracing::{info, instrument};

/// Chart settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Title drawn above the chart.
    pub title: String,
    /// First date to show; inferred from the rows when unset.
    pub min_date: Option<NaiveDate>,
    /// Last date to show; inferred from the rows when unset.
    pub max_date: Option<NaiveDate>,
    /// Copyright year in the footer; defaults to the year of the last date.
    pub year: Option<i32>,
    /// Version shown in the footer.
    pub version: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            min_date: None,
            max_date: None,
            year: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl RenderOptions {
    /// Options with a title and defaults for everything else.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Render rows to an SVG string.
///
/// # Errors
///
/// Fails when there are no rows or no usable date window.
pub fn render_svg(rows: &[RenderRow], options: &RenderOptions) -> Result<String> {
    svg::render(rows, options)
}

/// Render rows and write the SVG to `path`, creating parent directories.
///
/// # Errors
///
/// Fails like [`render_svg`], or with [`RenderError::Io`] when the file
/// cannot be written.
#[instrument(skip(rows, options), fields(path = %path.display()))]
pub fn write_svg(rows: &[RenderRow], path: &Path, options: &RenderOptions) -> Result<()> {
    let svg = render_svg(rows, options)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
    }
    std::fs::write(path, svg.as_bytes()).map_err(|e| RenderError::io(path, e))?;

    info!(bytes = svg.len(), "Wrote chart");
    Ok(())
}
