//! Named lookback windows for which charts and summaries are produced.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An unsupported time-window identifier.
///
/// This is a configuration or programming error, never retried.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported time window: {0}")]
pub struct InvalidWindow(pub String);

/// A named, fixed lookback span.
///
/// Each window gets its own chart and summary per cycle. The default cycle
/// set is [`TimeWindow::CYCLE_ORDER`]; `Hour` is available for pairs that
/// opt into it via configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeWindow {
    /// Fixed processing order for a cycle when a pair does not override it.
    pub const CYCLE_ORDER: [TimeWindow; 4] = [
        TimeWindow::Day,
        TimeWindow::Week,
        TimeWindow::Month,
        TimeWindow::Year,
    ];

    /// Lowercase label used in summary text and file names.
    pub const fn label(self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = InvalidWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(TimeWindow::Hour),
            "day" => Ok(TimeWindow::Day),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            "year" => Ok(TimeWindow::Year),
            other => Err(InvalidWindow(other.to_string())),
        }
    }
}
