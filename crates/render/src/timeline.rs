//! Date window and axis ticks.

use crate::{RenderError, Result};
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use ganttgen_core::{DateSpan, RenderRow};

/// Days of breathing room added before the first and after the last date.
pub const WINDOW_PAD_DAYS: u64 = 7;

/// Visible date range of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Earliest plan date (unpadded).
    pub min: NaiveDate,
    /// Latest plan date (unpadded).
    pub max: NaiveDate,
    /// First visible day.
    pub start: NaiveDate,
    /// Day after the last visible day.
    pub end: NaiveDate,
}

impl Window {
    /// Resolve the window from explicit bounds, falling back to the rows.
    ///
    /// # Errors
    ///
    /// Fails with [`RenderError::NoDates`] when a bound is missing and no
    /// row has dates, and with [`RenderError::InvalidWindow`] when the
    /// bounds are reversed.
    pub fn resolve(
        rows: &[RenderRow],
        min_date: Option<NaiveDate>,
        max_date: Option<NaiveDate>,
    ) -> Result<Self> {
        let spans = rows.iter().filter_map(|r| r.span);
        let min = match min_date {
            Some(date) => date,
            None => spans
                .clone()
                .map(|s| s.start)
                .min()
                .ok_or(RenderError::NoDates)?,
        };
        let max = match max_date {
            Some(date) => date,
            None => spans.map(|s| s.end).max().ok_or(RenderError::NoDates)?,
        };

        if min > max {
            return Err(RenderError::InvalidWindow { min, max });
        }

        let pad = Days::new(WINDOW_PAD_DAYS);
        Ok(Self {
            min,
            max,
            start: min.checked_sub_days(pad).unwrap_or(min),
            end: max.checked_add_days(pad).unwrap_or(max),
        })
    }

    /// Days covered by the plan itself, counting both ends.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.max - self.min).num_days() + 1
    }

    /// Visible days including padding.
    #[must_use]
    pub fn visible_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Whole days from the first visible day to `date`.
    #[must_use]
    pub fn offset(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }

    /// Whether any of `span` falls inside the visible days. Zero-length
    /// spans count when they sit on or between the edges.
    #[must_use]
    pub fn shows(&self, span: DateSpan) -> bool {
        if span.start == span.end {
            self.start <= span.start && span.start <= self.end
        } else {
            span.start < self.end && span.end > self.start
        }
    }
}

/// Spacing of the major axis ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStrategy {
    /// First of every month, labelled `Jan 2024`.
    Monthly,
    /// Every other Monday.
    BiweeklyMondays,
    /// Every Monday.
    WeeklyMondays,
    /// Every second day.
    EveryOtherDay,
}

impl TickStrategy {
    /// Pick a spacing that keeps labels from overlapping.
    #[must_use]
    pub const fn for_span(span_days: i64) -> Self {
        if span_days > 180 {
            Self::Monthly
        } else if span_days > 90 {
            Self::BiweeklyMondays
        } else if span_days > 45 {
            Self::WeeklyMondays
        } else {
            Self::EveryOtherDay
        }
    }

    /// `strftime` pattern for tick labels.
    #[must_use]
    pub const fn label_format(self) -> &'static str {
        match self {
            Self::Monthly => "%b %Y",
            _ => "%b %d",
        }
    }

    /// Tick dates inside `[start, end)`.
    #[must_use]
    pub fn ticks(self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let (first, step) = match self {
            Self::Monthly => {
                let first_of_month = start.with_day(1).unwrap_or(start);
                let first = if first_of_month < start {
                    first_of_month.checked_add_months(Months::new(1))
                } else {
                    Some(first_of_month)
                };
                let mut ticks = Vec::new();
                let mut current = first;
                while let Some(date) = current.filter(|d| *d < end) {
                    ticks.push(date);
                    current = date.checked_add_months(Months::new(1));
                }
                return ticks;
            }
            Self::BiweeklyMondays => (next_monday(start), 14),
            Self::WeeklyMondays => (next_monday(start), 7),
            Self::EveryOtherDay => (Some(start), 2),
        };

        let mut ticks = Vec::new();
        let mut current = first;
        while let Some(date) = current.filter(|d| *d < end) {
            ticks.push(date);
            current = date.checked_add_days(Days::new(step));
        }
        ticks
    }
}

fn next_monday(date: NaiveDate) -> Option<NaiveDate> {
    let ahead = (7 - date.weekday().num_days_from_monday()) % 7;
    let monday = date.checked_add_days(Days::new(u64::from(ahead)))?;
    debug_assert_eq!(monday.weekday(), Weekday::Mon);
    Some(monday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ganttgen_core::RowKind;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn row(start: &str, end: &str) -> RenderRow {
        RenderRow {
            order: 0,
            id: "a".into(),
            label: "A".into(),
            depth: 0,
            kind: RowKind::WorkPackage,
            span: Some(DateSpan::new(date(start), date(end))),
            category: None,
            depends_on: vec![],
            color: None,
        }
    }

    #[test]
    fn test_window_from_rows_is_padded() {
        let window = Window::resolve(&[row("2024-03-10", "2024-03-20")], None, None).unwrap();
        assert_eq!(window.min, date("2024-03-10"));
        assert_eq!(window.max, date("2024-03-20"));
        assert_eq!(window.start, date("2024-03-03"));
        assert_eq!(window.end, date("2024-03-27"));
        assert_eq!(window.span_days(), 11);
    }

    #[test]
    fn test_explicit_bounds_win() {
        let rows = [row("2024-03-10", "2024-03-20")];
        let window =
            Window::resolve(&rows, Some(date("2024-01-01")), Some(date("2024-12-31"))).unwrap();
        assert_eq!(window.min, date("2024-01-01"));
        assert_eq!(window.max, date("2024-12-31"));
    }

    #[test]
    fn test_shows_spans_touching_the_window() {
        let rows = [row("2024-03-10", "2024-03-20")];
        let window = Window::resolve(&rows, None, None).unwrap();
        let span = |start: &str, end: &str| DateSpan::new(date(start), date(end));

        assert!(window.shows(span("2024-03-01", "2024-03-04")));
        assert!(!window.shows(span("2024-02-20", "2024-03-03")));
        assert!(!window.shows(span("2024-03-27", "2024-04-02")));
        assert!(window.shows(span("2024-03-27", "2024-03-27")));
        assert!(!window.shows(span("2024-03-02", "2024-03-02")));
    }

    #[test]
    fn test_window_errors() {
        let mut undated = row("2024-03-10", "2024-03-20");
        undated.span = None;
        assert!(matches!(
            Window::resolve(&[undated], None, None),
            Err(RenderError::NoDates)
        ));
        assert!(matches!(
            Window::resolve(&[], Some(date("2024-02-01")), Some(date("2024-01-01"))),
            Err(RenderError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_tick_strategy_thresholds() {
        assert_eq!(TickStrategy::for_span(181), TickStrategy::Monthly);
        assert_eq!(TickStrategy::for_span(180), TickStrategy::BiweeklyMondays);
        assert_eq!(TickStrategy::for_span(91), TickStrategy::BiweeklyMondays);
        assert_eq!(TickStrategy::for_span(90), TickStrategy::WeeklyMondays);
        assert_eq!(TickStrategy::for_span(46), TickStrategy::WeeklyMondays);
        assert_eq!(TickStrategy::for_span(45), TickStrategy::EveryOtherDay);
    }

    #[test]
    fn test_ticks() {
        // 2024-03-06 is a Wednesday.
        let weekly = TickStrategy::WeeklyMondays.ticks(date("2024-03-06"), date("2024-03-26"));
        assert_eq!(
            weekly,
            vec![date("2024-03-11"), date("2024-03-18"), date("2024-03-25")]
        );

        let monthly = TickStrategy::Monthly.ticks(date("2024-01-15"), date("2024-04-01"));
        assert_eq!(monthly, vec![date("2024-02-01"), date("2024-03-01")]);

        let daily = TickStrategy::EveryOtherDay.ticks(date("2024-03-01"), date("2024-03-06"));
        assert_eq!(
            daily,
            vec![date("2024-03-01"), date("2024-03-03"), date("2024-03-05")]
        );
    }
}
