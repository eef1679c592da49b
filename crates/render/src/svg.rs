//! SVG document assembly.

use crate::palette::Palette;
use crate::route::{Point, Rect, route};
use crate::timeline::{TickStrategy, Window};
use crate::{RenderError, RenderOptions, Result};
use chrono::{Datelike, NaiveDate};
use ganttgen_core::{RenderRow, RowKind};
use std::collections::HashMap;
use tracing::debug;

const ROW_HEIGHT: f64 = 24.0;
const BAR_HEIGHT: f64 = 14.0;
const HEADER_HEIGHT: f64 = 76.0;
const FOOTER_HEIGHT: f64 = 36.0;
const INDENT: f64 = 14.0;
const LABEL_CHAR_WIDTH: f64 = 7.0;
const MIN_GUTTER: f64 = 180.0;
const TARGET_CHART_WIDTH: f64 = 960.0;
const MIN_DAY_WIDTH: f64 = 4.0;
const MAX_DAY_WIDTH: f64 = 28.0;
const BRACKET_WIDTH: f64 = 2.5;
const MILESTONE_HALF_WIDTH: f64 = 7.0;
const CONNECTOR_COLOR: &str = "#3a3a3a";
const MILESTONE_COLOR: &str = "#666666";
/// Clip region covering the date columns, so nothing spills into the labels.
const CLIP_ID: &str = "chart-area";

/// Pixel geometry shared by every element.
struct Layout {
    window: Window,
    gutter: f64,
    day_width: f64,
    width: f64,
    height: f64,
}

impl Layout {
    #[allow(clippy::cast_precision_loss)]
    fn new(rows: &[RenderRow], window: Window) -> Self {
        let gutter = rows
            .iter()
            .map(|r| {
                let label = r.label.chars().count() as f64 * LABEL_CHAR_WIDTH;
                24.0 + r.depth as f64 * INDENT + label
            })
            .fold(MIN_GUTTER, f64::max);

        let days = window.visible_days().max(1) as f64;
        let day_width = (TARGET_CHART_WIDTH / days).clamp(MIN_DAY_WIDTH, MAX_DAY_WIDTH);

        Self {
            window,
            gutter,
            day_width,
            width: gutter + days * day_width + 16.0,
            height: HEADER_HEIGHT + rows.len() as f64 * ROW_HEIGHT + FOOTER_HEIGHT,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn x(&self, date: NaiveDate) -> f64 {
        self.gutter + self.window.offset(date) as f64 * self.day_width
    }

    #[allow(clippy::cast_precision_loss)]
    fn row_top(&self, index: usize) -> f64 {
        HEADER_HEIGHT + index as f64 * ROW_HEIGHT
    }

    fn row_mid(&self, index: usize) -> f64 {
        self.row_top(index) + ROW_HEIGHT / 2.0
    }

    fn chart_bottom(&self) -> f64 {
        self.height - FOOTER_HEIGHT
    }

    #[allow(clippy::cast_precision_loss)]
    fn chart_right(&self) -> f64 {
        self.gutter + self.window.visible_days() as f64 * self.day_width
    }
}

/// Render rows into an SVG document.
pub(crate) fn render(rows: &[RenderRow], options: &RenderOptions) -> Result<String> {
    if rows.is_empty() {
        return Err(RenderError::NoRows);
    }

    let window = Window::resolve(rows, options.min_date, options.max_date)?;
    let layout = Layout::new(rows, window);
    let palette = Palette::for_rows(rows);
    let ticks = TickStrategy::for_span(window.span_days());

    debug!(
        rows = rows.len(),
        width = layout.width,
        height = layout.height,
        ?ticks,
        "Rendering chart"
    );

    let mut svg = String::with_capacity(rows.len() * 256 + 2048);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#,
        w = layout.width,
        h = layout.height,
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<defs><marker id="arrow" viewBox="0 0 8 8" refX="8" refY="4" markerWidth="6" markerHeight="6" orient="auto-start-reverse"><path d="M0,0 L8,4 L0,8 z" fill="{CONNECTOR_COLOR}"/></marker><clipPath id="{CLIP_ID}"><rect width="{:.1}" height="{:.1}" x="{:.1}" y="0"/></clipPath></defs>"#,
        layout.chart_right() - layout.gutter,
        layout.height,
        layout.gutter,
    ));
    svg.push('\n');
    svg.push_str(
        "<style>text { font-family: \"DejaVu Sans\", Arial, sans-serif; font-size: 12px; } \
         .title { font-size: 18px; } .tick { font-size: 10px; fill: #444444; } \
         .footer { font-size: 10px; fill: #666666; } .category { font-weight: bold; }</style>\n",
    );
    svg.push_str(&format!(
        r##"<rect width="{:.0}" height="{:.0}" fill="#ffffff"/>"##,
        layout.width, layout.height
    ));
    svg.push('\n');

    svg.push_str(&format!(
        r#"<text class="title" x="{:.1}" y="26" text-anchor="middle">{}</text>"#,
        layout.width / 2.0,
        xml_escape(&options.title)
    ));
    svg.push('\n');

    push_axis(&mut svg, &layout, ticks);
    push_labels(&mut svg, &layout, rows);
    svg.push_str(&format!("<g clip-path=\"url(#{CLIP_ID})\">\n"));
    push_shapes(&mut svg, &layout, rows, &palette);
    push_connectors(&mut svg, &layout, rows);
    svg.push_str("</g>\n");

    let year = options.year.unwrap_or_else(|| window.max.year());
    svg.push_str(&format!(
        r#"<text class="footer" x="{:.1}" y="{:.1}" text-anchor="end">© {year} ganttgen v{}</text>"#,
        layout.width - 8.0,
        layout.height - 10.0,
        xml_escape(&options.version)
    ));
    svg.push('\n');
    svg.push_str("</svg>\n");

    Ok(svg)
}

fn push_axis(svg: &mut String, layout: &Layout, ticks: TickStrategy) {
    let top = HEADER_HEIGHT - 4.0;
    let bottom = layout.chart_bottom();

    svg.push_str("<g class=\"axis\">\n");
    for date in ticks.ticks(layout.window.start, layout.window.end) {
        let x = layout.x(date);
        svg.push_str(&format!(
            r##"<line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{bottom:.1}" stroke="#bbbbbb" stroke-dasharray="4 3"/>"##
        ));
        svg.push_str(&format!(
            r#"<text class="tick" x="{x:.1}" y="{:.1}" text-anchor="start" transform="rotate(-30 {x:.1} {:.1})">{}</text>"#,
            top - 6.0,
            top - 6.0,
            date.format(ticks.label_format())
        ));
        svg.push('\n');
    }
    svg.push_str("</g>\n");
}

fn push_labels(svg: &mut String, layout: &Layout, rows: &[RenderRow]) {
    for (index, row) in rows.iter().enumerate() {
        let mid = layout.row_mid(index);
        #[allow(clippy::cast_precision_loss)]
        let indent = 12.0 + row.depth as f64 * INDENT;
        let class = if row.kind == RowKind::Category {
            r#" class="category""#
        } else {
            ""
        };
        svg.push_str(&format!(
            r#"<text{class} x="{indent:.1}" y="{mid:.1}" dominant-baseline="middle">{}</text>"#,
            xml_escape(&row.label)
        ));
        svg.push('\n');
    }
}

fn push_shapes(svg: &mut String, layout: &Layout, rows: &[RenderRow], palette: &Palette) {
    for (index, row) in rows.iter().enumerate() {
        let Some(span) = row.span.filter(|&span| layout.window.shows(span)) else {
            continue;
        };
        let mid = layout.row_mid(index);
        let color = palette.color(row.category.as_deref());
        let (x0, x1) = (layout.x(span.start), layout.x(span.end));

        match row.kind {
            RowKind::WorkPackage => {
                svg.push_str(&format!(
                    r#"<rect x="{x0:.1}" y="{:.1}" width="{:.1}" height="{BAR_HEIGHT:.1}" fill="{color}" stroke="black" stroke-width="0.5"><title>{}</title></rect>"#,
                    mid - BAR_HEIGHT / 2.0,
                    x1 - x0,
                    xml_escape(&row.id)
                ));
            }
            RowKind::Milestone => {
                let half_height = BAR_HEIGHT / 1.5;
                svg.push_str(&format!(
                    r#"<polygon points="{:.1},{mid:.1} {x0:.1},{:.1} {:.1},{mid:.1} {x0:.1},{:.1}" fill="{MILESTONE_COLOR}" stroke="black"/>"#,
                    x0 - MILESTONE_HALF_WIDTH,
                    mid - half_height,
                    x0 + MILESTONE_HALF_WIDTH,
                    mid + half_height,
                ));
            }
            RowKind::Group => {
                let cap = BAR_HEIGHT / 2.2;
                svg.push_str(&format!(
                    r#"<path d="M{x0:.1},{:.1} L{x0:.1},{mid:.1} L{x1:.1},{mid:.1} L{x1:.1},{:.1}" fill="none" stroke="{color}" stroke-width="{BRACKET_WIDTH}"/>"#,
                    mid + cap,
                    mid + cap,
                ));
            }
            // Category headings are labels only.
            RowKind::Category => continue,
        }
        svg.push('\n');
    }
}

fn push_connectors(svg: &mut String, layout: &Layout, rows: &[RenderRow]) {
    let bars: HashMap<&str, (Rect, bool)> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.kind == RowKind::WorkPackage)
        .filter_map(|(index, r)| {
            let span = r.span?;
            let mid = layout.row_mid(index);
            let rect = Rect {
                x0: layout.x(span.start),
                x1: layout.x(span.end),
                y0: mid - BAR_HEIGHT / 2.0,
                y1: mid + BAR_HEIGHT / 2.0,
            };
            Some((r.id.as_str(), (rect, layout.window.shows(span))))
        })
        .collect();

    // Stable obstacle order keeps output byte-identical between runs.
    let obstacles: Vec<Rect> = rows
        .iter()
        .filter_map(|r| bars.get(r.id.as_str()).map(|&(rect, _)| rect))
        .collect();

    svg.push_str("<g class=\"connectors\">\n");
    for row in rows.iter().filter(|r| r.kind == RowKind::WorkPackage) {
        let Some(&(to, to_shown)) = bars.get(row.id.as_str()) else {
            continue;
        };
        for dep in &row.depends_on {
            let Some(&(from, from_shown)) = bars.get(dep.as_str()) else {
                continue;
            };
            if !from_shown && !to_shown {
                continue;
            }
            let points = route(from, to, &obstacles);
            svg.push_str(&format!(
                r#"<polyline points="{}" fill="none" stroke="{CONNECTOR_COLOR}" stroke-width="0.9" marker-end="url(#arrow)"/>"#,
                format_points(&points)
            ));
            svg.push('\n');
        }
    }
    svg.push_str("</g>\n");
}

fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
