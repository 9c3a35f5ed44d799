//! TOML-backed run configuration.
//!
//! A config file names one or more trading pairs, each with optional
//! publishing credentials (a pair without them is chart-only), an optional
//! market inception date for year-window clamping, and an optional window
//! override. Pair order is preserved; cycles process pairs in file order.
//!
//! ```toml
//! output_dir = "charts"
//! timezone = "Europe/Warsaw"
//! cadence_minutes = 5
//!
//! [pairs.BTC-USD]
//! display_name = "Bitcoin"
//! inception = "2015-07-20"
//!
//! [pairs.BTC-USD.publish]
//! base_url = "https://mastodon.example"
//! token_env = "CANDLECAST_TOKEN_BTC"
//! ```
//!
//! Access tokens never live in the file; each publish block names the
//! environment variable holding the token instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::window::TimeWindow;

/// Top-level configuration, loaded once before any cycle begins.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory chart images are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// IANA time zone used for chart axis labels only; all candle math
    /// stays in UTC.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Wall-clock cadence the scheduler aligns cycles to.
    #[serde(default = "default_cadence")]
    pub cadence_minutes: u32,

    /// Pair id (e.g. "BTC-USD") -> per-pair configuration, in file order.
    pub pairs: IndexMap<String, PairConfig>,
}

/// One tradable pair plus its own publishing setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairConfig {
    /// Human-readable name for logs; defaults to the pair id.
    pub display_name: Option<String>,

    /// First listing date on the exchange (quoted `"YYYY-MM-DD"`). Clamps
    /// the year window for young markets.
    pub inception: Option<NaiveDate>,

    /// Window override; omitted means day/week/month/year.
    pub windows: Option<Vec<TimeWindow>>,

    /// Publishing target. A pair without one renders charts only.
    pub publish: Option<PublishConfig>,
}

/// Where and as whom a pair's cycle output is published.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Base URL of the Mastodon-compatible server.
    pub base_url: String,
    /// Name of the environment variable holding the access token.
    pub token_env: String,
}

impl Config {
    /// Parse the configured display time zone.
    pub fn display_tz(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("unknown timezone {:?}: {e}", self.timezone))
    }
}

impl PairConfig {
    /// The windows this pair's cycle walks, in fixed order.
    pub fn windows_or_default(&self) -> Vec<TimeWindow> {
        self.windows
            .clone()
            .unwrap_or_else(|| TimeWindow::CYCLE_ORDER.to_vec())
    }
}

/// Load and normalize configuration from a file path.
pub fn load_path(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    load_str(&content).with_context(|| format!("in config file {}", path.display()))
}

/// Parse and normalize configuration from a TOML string.
///
/// Normalization trims and uppercases pair ids, preserving order, and
/// rejects configurations no cycle could run: no pairs, duplicate pair ids
/// after normalization, an empty window override, or a zero cadence.
pub fn load_str(content: &str) -> anyhow::Result<Config> {
    let mut config: Config = toml::from_str(content).context("parsing TOML")?;

    if config.pairs.is_empty() {
        bail!("no pairs configured");
    }
    if config.cadence_minutes == 0 {
        bail!("cadence_minutes must be > 0");
    }

    let mut pairs = IndexMap::with_capacity(config.pairs.len());
    for (key, pair) in std::mem::take(&mut config.pairs) {
        let id = key.trim().to_uppercase();
        if id.is_empty() {
            bail!("empty pair id");
        }
        if let Some(windows) = &pair.windows
            && windows.is_empty()
        {
            bail!("pair {id}: windows override must not be empty");
        }
        if pairs.insert(id.clone(), pair).is_some() {
            bail!("duplicate pair id after normalization: {id}");
        }
    }
    config.pairs = pairs;

    config.display_tz()?;
    Ok(config)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("charts")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_cadence() -> u32 {
    5
}
