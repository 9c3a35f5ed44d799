//! Coinbase Exchange candles source.
//!
//! Public market data, no credentials required. One request per (pair,
//! window); the endpoint caps responses at 300 candles, which the ~200
//! samples-per-window interval policy stays under.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::models::{candle::Candle, interval::IntervalSpec};
use crate::normalize::normalize;
use crate::providers::{MarketDataSource, errors::ProviderError};

const BASE_URL: &str = "https://api.exchange.coinbase.com";
const USER_AGENT: &str = concat!("candlecast/", env!("CARGO_PKG_VERSION"));

pub struct CoinbaseSource {
    client: Client,
    base_url: String,
}

impl CoinbaseSource {
    /// Creates a source pointed at the public Coinbase Exchange API.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(BASE_URL)
    }

    /// Creates a source against an alternate base URL, for tests or proxies.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        // Coinbase rejects requests without a User-Agent.
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MarketDataSource for CoinbaseSource {
    async fn candles(&self, pair: &str, spec: &IntervalSpec) -> Result<Vec<Candle>, ProviderError> {
        let url = format!("{}/products/{}/candles", self.base_url, pair);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("granularity", spec.granularity.get().to_string()),
                ("start", spec.start.to_rfc3339()),
                ("end", spec.end.to_rfc3339()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !response.status().is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown API error".to_string());
            return Err(ProviderError::Upstream(message));
        }

        // Some error conditions still come back 200 with a message object,
        // so payload-shape detection lives in the normalizer.
        let payload = response.json::<Value>().await?;
        normalize(&payload)
    }
}
