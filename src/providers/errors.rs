use thiserror::Error;

/// Errors that can occur while fetching or decoding market data.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An error during the API request itself (network failure, timeout,
    /// undecodable body).
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The source throttled us. The cycle skips this (pair, window) and
    /// does not retry within the same cycle.
    #[error("market data source rate limited the request")]
    RateLimited,

    /// The source returned an error payload instead of candle rows.
    #[error("market data source error: {0}")]
    Upstream(String),

    /// A candle row failed numeric coercion or sanity checks. The whole
    /// batch is rejected; partial data would skew the statistics.
    #[error("malformed candle data: {0}")]
    MalformedData(String),
}
