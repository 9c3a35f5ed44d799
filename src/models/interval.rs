//! Interval policy: maps a named window to a concrete time range plus the
//! granularity and styling hints the rest of the pipeline needs.
//!
//! [`IntervalSpec::compute`] is a pure function of the window, the reference
//! instant, and the pair's optional inception date. It targets roughly 200
//! samples per window regardless of span, so the charts stay comparable
//! across windows.

use std::num::NonZeroU32;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use crate::models::window::TimeWindow;

/// Target number of candles per window; granularity is derived from it.
const TARGET_SAMPLES: i64 = 200;

/// Errors from the interval policy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    /// The window collapsed below one second per sample, so no usable
    /// granularity exists. The cycle skips the window instead of crashing.
    #[error("{window} window spans only {seconds}s, too short to chart")]
    DegenerateSpan { window: TimeWindow, seconds: i64 },
}

/// A concrete time range for one window, derived from "now".
///
/// Owned by a single cycle's processing of one (pair, window) and discarded
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSpec {
    pub window: TimeWindow,
    /// Range start (inclusive). Always strictly before `end`.
    pub start: DateTime<Utc>,
    /// Range end, equal to the reference instant.
    pub end: DateTime<Utc>,
    /// Seconds per candle, `floor((end - start) / 200)`. Never zero.
    pub granularity: NonZeroU32,
    /// chrono strftime specifier for axis labels at this window's resolution.
    pub label_format: &'static str,
    /// Rendering-only bar width scalar in day units; finer granularity gets
    /// a smaller width. Meaningless outside the renderer.
    pub bar_width: f64,
    /// For `Year` windows clamped to a young market's inception date: whole
    /// months actually covered, capped at 12. `None` when no clamp applied.
    pub elapsed_months: Option<u32>,
}

impl IntervalSpec {
    /// Derive the interval for `window` ending at `now`.
    ///
    /// `Year` windows are clamped to `inception` when the market has less
    /// than a year of history, and the reported span follows the clamp.
    pub fn compute(
        window: TimeWindow,
        now: DateTime<Utc>,
        inception: Option<NaiveDate>,
    ) -> Result<Self, IntervalError> {
        let end = now;
        let mut start = end - span(window);
        let mut elapsed_months = None;

        if window == TimeWindow::Year
            && let Some(listed) = inception
        {
            let listed = listed.and_time(NaiveTime::MIN).and_utc();
            if listed > start {
                start = listed;
                elapsed_months =
                    Some(whole_months_between(start.date_naive(), end.date_naive()).min(12));
            }
        }

        let seconds = (end - start).num_seconds();
        let granularity = u32::try_from(seconds / TARGET_SAMPLES)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(IntervalError::DegenerateSpan { window, seconds })?;

        Ok(Self {
            window,
            start,
            end,
            granularity,
            label_format: label_format(window),
            bar_width: bar_width(window),
            elapsed_months,
        })
    }

    /// Human-readable span for chart titles, e.g. "past week" or
    /// "past 7 months" for a clamped year window.
    pub fn span_label(&self) -> String {
        match (self.window, self.elapsed_months) {
            (TimeWindow::Year, Some(1)) => "past month".to_string(),
            (TimeWindow::Year, Some(m)) if m < 12 => format!("past {m} months"),
            (window, _) => format!("past {window}"),
        }
    }
}

fn span(window: TimeWindow) -> Duration {
    match window {
        TimeWindow::Hour => Duration::minutes(60),
        TimeWindow::Day => Duration::days(1),
        TimeWindow::Week => Duration::days(7),
        TimeWindow::Month => Duration::days(30),
        TimeWindow::Year => Duration::days(365),
    }
}

const fn label_format(window: TimeWindow) -> &'static str {
    match window {
        TimeWindow::Hour | TimeWindow::Day => "%-I:%M",
        TimeWindow::Week => "%a",
        TimeWindow::Month => "%-m - %-d",
        TimeWindow::Year => "%b",
    }
}

const fn bar_width(window: TimeWindow) -> f64 {
    match window {
        TimeWindow::Hour => 0.00008,
        TimeWindow::Day => 0.001,
        TimeWindow::Week => 0.005,
        TimeWindow::Month => 0.008,
        TimeWindow::Year => 0.02,
    }
}

/// Whole calendar months elapsed between two dates.
fn whole_months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut months =
        (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }
    months.max(0) as u32
}
