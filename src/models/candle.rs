//! Canonical in-memory representation of an OHLCV candle.
//!
//! This is the normalized unit produced by [`crate::normalize`] and consumed
//! by the summary calculator and the renderer, regardless of which exchange
//! the raw rows came from.

use chrono::{DateTime, Utc};

use crate::models::window::TimeWindow;

/// A single normalized OHLCV sample.
///
/// Sequences of candles are always sorted ascending by [`Candle::time`].
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// The timestamp for this candle (UTC). Display-time-zone conversion
    /// happens only at the rendering edge.
    pub time: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the candle interval.
    pub high: f64,

    /// Lowest price during the candle interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the candle interval.
    pub volume: f64,
}

impl Candle {
    /// Whether the candle carries values a downstream consumer can trust.
    ///
    /// Prices must be finite and non-negative, `high >= low`, and volume
    /// non-negative. Normalization rejects the whole batch when any row
    /// fails this check.
    pub fn is_sane(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
            && self.open >= 0.0
            && self.low >= 0.0
            && self.close >= 0.0
            && self.high >= self.low
            && self.volume >= 0.0
    }
}

/// A complete candle sequence for one (pair, window), self-describing so the
/// renderer does not need extra context.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    /// The trading pair identifier (e.g., "BTC-USD").
    pub pair: String,
    /// The lookback window the candles cover.
    pub window: TimeWindow,
    /// The candles, sorted ascending by time.
    pub candles: Vec<Candle>,
}
