//! Provider abstraction for market data sources.
//!
//! [`MarketDataSource`] is the seam between the candle pipeline and any
//! concrete exchange API. The trait is async and object-safe so the
//! orchestration layer can hold a `dyn MarketDataSource` and tests can
//! substitute canned data.

pub mod coinbase;
pub mod errors;

use async_trait::async_trait;

use crate::models::{candle::Candle, interval::IntervalSpec};
use crate::providers::errors::ProviderError;

/// A source of normalized OHLCV candles for a trading pair.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch candles for `pair` covering `spec`'s range at its granularity,
    /// returned sorted ascending by time.
    async fn candles(&self, pair: &str, spec: &IntervalSpec) -> Result<Vec<Candle>, ProviderError>;
}
