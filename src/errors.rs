use thiserror::Error;

use crate::models::interval::IntervalError;
use crate::models::window::InvalidWindow;
use crate::providers::errors::ProviderError;
use crate::publish::PublishError;
use crate::render::RenderError;
use crate::summary::SummaryError;

/// The unified error type for the `candlecast` crate.
///
/// Each pipeline stage has its own error enum; this type exists so the
/// orchestration layer can carry any of them through one channel.
#[derive(Debug, Error)]
pub enum Error {
    /// An unsupported time-window identifier was supplied.
    #[error(transparent)]
    Window(#[from] InvalidWindow),

    /// The interval policy could not produce a usable spec.
    #[error(transparent)]
    Interval(#[from] IntervalError),

    /// An error from the market-data source (network, rate limit, payload).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The summary calculator rejected the candle sequence.
    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// Chart rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The publishing collaborator failed.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
