use std::path::PathBuf;

use clap::Parser;

/// Fetches OHLCV candles, renders candlestick charts, and republishes them
/// with a price summary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config file (candlecast.toml)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Publish to each pair's configured account. Without this flag the run
    /// is a dry run: charts and summaries are produced, the publisher is
    /// never contacted.
    #[arg(long)]
    pub publish: bool,

    /// Run a single cycle immediately and exit instead of looping on the
    /// cadence boundary.
    #[arg(long)]
    pub once: bool,

    /// Override the configured chart output directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}
