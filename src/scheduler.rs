//! Paces repeated cycles against wall-clock boundaries.
//!
//! Cycles start on multiples of the configured cadence (e.g. :00, :05,
//! :10 for five minutes) rather than a fixed delay after the previous
//! cycle, so post timestamps stay aligned. The loop stays alive across any
//! cycle's errors; [`crate::cycle::run_cycle`] never lets one escape.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::config::Config;
use crate::cycle::run_cycle;
use crate::providers::MarketDataSource;
use crate::publish::PublisherFactory;
use crate::render::Renderer;

/// The next wall-clock instant aligned to `cadence_minutes`.
///
/// An instant already on a boundary schedules the following one, so
/// back-to-back cycles never run.
pub fn next_boundary(now: DateTime<Utc>, cadence_minutes: u32) -> DateTime<Utc> {
    let period = i64::from(cadence_minutes) * 60;
    let next = (now.timestamp() / period + 1) * period;
    now + Duration::seconds(next - now.timestamp())
}

/// Run cycles forever, one per cadence boundary.
pub async fn run_forever(
    source: &dyn MarketDataSource,
    renderer: &dyn Renderer,
    factory: &dyn PublisherFactory,
    config: &Config,
    publish_mode: bool,
) {
    loop {
        let boundary = next_boundary(Utc::now(), config.cadence_minutes);
        info!(boundary = %boundary, "waiting for next cycle boundary");
        let wait = (boundary - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let report = run_cycle(source, renderer, factory, config, publish_mode, Utc::now()).await;
        info!(
            rendered = report.rendered_count(),
            skipped = report.skipped_count(),
            published = report.published_count(),
            "cycle complete"
        );
    }
}
