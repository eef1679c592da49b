//! Deterministic category colours.

use ganttgen_core::{RenderRow, RowKind};
use std::collections::{BTreeSet, HashMap};

/// Fallback for rows without a category.
pub const UNCATEGORISED: &str = "#999999";

/// The twenty-colour qualitative palette, in order.
const TAB20: [&str; 20] = [
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896",
    "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2", "#7f7f7f", "#c7c7c7",
    "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];

/// Colour per category key.
///
/// Keys are sorted and assigned palette entries in order, wrapping after
/// twenty; a colour declared on a category row takes precedence.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    colors: HashMap<String, String>,
}

impl Palette {
    /// Build the palette for a set of rows.
    #[must_use]
    pub fn for_rows(rows: &[RenderRow]) -> Self {
        let keys: BTreeSet<&str> = rows.iter().filter_map(|r| r.category.as_deref()).collect();

        let mut colors: HashMap<String, String> = keys
            .into_iter()
            .zip(TAB20.iter().cycle())
            .map(|(key, color)| (key.to_string(), (*color).to_string()))
            .collect();

        for row in rows.iter().filter(|r| r.kind == RowKind::Category) {
            if let Some(color) = &row.color {
                colors.insert(row.id.clone(), color.clone());
            }
        }

        Self { colors }
    }

    /// Colour for a category key.
    #[must_use]
    pub fn color(&self, category: Option<&str>) -> &str {
        category
            .and_then(|c| self.colors.get(c))
            .map_or(UNCATEGORISED, String::as_str)
    }
}
