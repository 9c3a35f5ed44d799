//! Summary calculator: descriptive statistics for one (pair, window).
//!
//! Internal figures keep four decimal places; the display text rounds
//! harder, and display values are never fed back into further math.

use thiserror::Error;
use tracing::warn;

use crate::models::{candle::Candle, window::TimeWindow};

/// Errors from the summary calculator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    /// Zero candles in range; there is nothing to summarize.
    #[error("no candles in range")]
    InsufficientData,

    /// All volumes in range are zero, so VWAP is undefined.
    #[error("total traded volume in range is zero")]
    DegenerateVolume,

    /// A price used as a division basis is zero, which would poison the
    /// percent figures.
    #[error("degenerate {0} price of zero in range")]
    DegeneratePrice(&'static str),
}

/// Derived, read-only statistics for one window's candle sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub window: TimeWindow,
    /// Close of the chronologically oldest candle in range.
    ///
    /// Deliberately the close, not the open tick: the figure every consumer
    /// of the posted text has always been built on. Do not "fix" this to
    /// the first candle's open field.
    pub open_price: f64,
    /// Close of the chronologically newest candle.
    pub close_price: f64,
    /// `(close - open) * 100 / open`, rounded to 4 decimals.
    pub percent_change: f64,
    /// Minimum low across the sequence.
    pub low: f64,
    /// Maximum high across the sequence.
    pub high: f64,
    /// `(high - low) * 100 / low`, rounded to 4 decimals.
    pub range_percent: f64,
    /// Volume-weighted average close. `None` when total volume is zero;
    /// VWAP-dependent chart overlays are omitted in that case.
    pub vwap: Option<f64>,
    /// Stable one-line text contract, embedded in the post body and chart.
    pub display_text: String,
}

impl Summary {
    /// Summarize a normalized, ascending candle sequence.
    pub fn compute(window: TimeWindow, candles: &[Candle]) -> Result<Self, SummaryError> {
        let first = candles.first().ok_or(SummaryError::InsufficientData)?;
        let last = &candles[candles.len() - 1];

        let open_price = first.close;
        let close_price = last.close;
        if open_price == 0.0 {
            return Err(SummaryError::DegeneratePrice("open"));
        }

        let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let high = candles
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        if low == 0.0 {
            return Err(SummaryError::DegeneratePrice("low"));
        }

        let percent_change = round4((close_price - open_price) * 100.0 / open_price);
        let range_percent = round4((high - low) * 100.0 / low);

        let vwap = match vwap(candles) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%window, error = %err, "vwap unavailable, overlay will be omitted");
                None
            }
        };

        let display_text =
            format!("\n{window}: {open_price:.0} -> {close_price:.0} {percent_change:.0}%");

        Ok(Self {
            window,
            open_price,
            close_price,
            percent_change,
            low,
            high,
            range_percent,
            vwap,
            display_text,
        })
    }
}

/// Volume-weighted average price over the sequence.
///
/// Signals [`SummaryError::DegenerateVolume`] rather than dividing by zero;
/// callers may substitute the close price as a fallback center value.
pub fn vwap(candles: &[Candle]) -> Result<f64, SummaryError> {
    if candles.is_empty() {
        return Err(SummaryError::InsufficientData);
    }
    let total_volume: f64 = candles.iter().map(|c| c.volume).sum();
    if total_volume == 0.0 {
        return Err(SummaryError::DegenerateVolume);
    }
    let weighted: f64 = candles.iter().map(|c| c.close * c.volume).sum();
    Ok(weighted / total_volume)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
