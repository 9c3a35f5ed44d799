//! Periodically fetches OHLCV candles for configured trading pairs, renders
//! candlestick charts over several time windows, and republishes the images
//! plus a combined price summary to a social account.
//!
//! The pipeline for one (pair, window) is: interval policy
//! ([`models::interval`]) -> fetch + normalize ([`providers`], [`normalize`])
//! -> summarize ([`summary`]) -> render ([`render`]) -> publish
//! ([`publish`]), orchestrated by [`cycle`] and paced by [`scheduler`].

pub mod cli;
pub mod config;
pub mod cycle;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod publish;
pub mod render;
pub mod scheduler;
pub mod summary;

pub use errors::Error;
