//! Per-cycle orchestration: fetch -> normalize -> summarize -> render ->
//! publish, once per configured pair and window.
//!
//! Failure containment is the whole point of this module. A stage error
//! skips that window only; a publish error is terminal for that pair only;
//! nothing here ever aborts the cycle or escapes to the scheduling loop.
//! Every stage returns its typed result and the loop pattern-matches on it,
//! rather than signalling skips through sentinel values.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::{Config, PairConfig};
use crate::errors::Error;
use crate::models::candle::CandleSeries;
use crate::models::interval::IntervalSpec;
use crate::models::window::TimeWindow;
use crate::providers::MarketDataSource;
use crate::publish::{PostRef, PublishError, Publisher, PublisherFactory};
use crate::render::Renderer;
use crate::summary::Summary;

/// Cooperative pause between per-window image uploads, strictly to stay
/// under the publishing collaborator's media rate limit.
pub const UPLOAD_PAUSE: Duration = Duration::from_millis(500);

/// The pipeline stage a window was skipped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Interval,
    Fetch,
    Summarize,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Interval => "interval",
            Stage::Fetch => "fetch",
            Stage::Summarize => "summarize",
            Stage::Render => "render",
        })
    }
}

/// What happened to one (pair, window).
#[derive(Debug)]
pub enum WindowOutcome {
    /// Chart written; summary contributes to the combined post text.
    Rendered { image: PathBuf, summary: Summary },
    /// Recoverable error at some stage; the window was skipped.
    Skipped { stage: Stage, error: Error },
}

#[derive(Debug)]
pub struct WindowReport {
    pub window: TimeWindow,
    pub outcome: WindowOutcome,
}

/// Terminal state of one pair's cycle.
#[derive(Debug)]
pub enum PairOutcome {
    /// New post created; `deleted` previous posts were removed first.
    Published { post: PostRef, deleted: usize },
    /// Dry run or no publish target configured; charts were written only.
    DryRun { rendered: usize },
    /// Every window was skipped; nothing to publish or keep.
    NothingToRender,
    /// The publish step failed. Terminal for this pair only.
    PublishFailed(String),
}

#[derive(Debug)]
pub struct PairReport {
    pub pair: String,
    pub windows: Vec<WindowReport>,
    pub outcome: PairOutcome,
}

impl PairReport {
    pub fn rendered_count(&self) -> usize {
        self.windows
            .iter()
            .filter(|w| matches!(w.outcome, WindowOutcome::Rendered { .. }))
            .count()
    }
}

/// Outcome of one full pass over all configured pairs.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub pairs: Vec<PairReport>,
}

impl CycleReport {
    pub fn published_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| matches!(p.outcome, PairOutcome::Published { .. }))
            .count()
    }

    pub fn rendered_count(&self) -> usize {
        self.pairs.iter().map(PairReport::rendered_count).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.pairs
            .iter()
            .flat_map(|p| &p.windows)
            .filter(|w| matches!(w.outcome, WindowOutcome::Skipped { .. }))
            .count()
    }
}

/// Run one full cycle over every configured pair.
///
/// In dry-run mode (`publish_mode == false`) the factory is never consulted
/// and no publisher exists anywhere in the call graph.
pub async fn run_cycle(
    source: &dyn MarketDataSource,
    renderer: &dyn Renderer,
    factory: &dyn PublisherFactory,
    config: &Config,
    publish_mode: bool,
    now: DateTime<Utc>,
) -> CycleReport {
    let mut report = CycleReport::default();

    for (pair, pair_cfg) in &config.pairs {
        let publisher = match (publish_mode, pair_cfg.publish.as_ref()) {
            (true, Some(publish_cfg)) => match factory.publisher_for(pair, publish_cfg) {
                Ok(publisher) => Some(publisher),
                Err(err) => {
                    error!(pair = %pair, error = %err, "publisher unavailable, rendering only");
                    let mut pair_report = run_pair(source, renderer, pair, pair_cfg, None, now).await;
                    pair_report.outcome = PairOutcome::PublishFailed(err.to_string());
                    report.pairs.push(pair_report);
                    continue;
                }
            },
            _ => None,
        };

        let pair_report =
            run_pair(source, renderer, pair, pair_cfg, publisher.as_deref(), now).await;
        report.pairs.push(pair_report);
    }

    report
}

/// Run one pair's cycle: every window in order, then the publish step.
pub async fn run_pair(
    source: &dyn MarketDataSource,
    renderer: &dyn Renderer,
    pair: &str,
    pair_cfg: &PairConfig,
    publisher: Option<&dyn Publisher>,
    now: DateTime<Utc>,
) -> PairReport {
    let mut windows = Vec::new();
    let mut combined_text = String::new();
    let mut images = Vec::new();

    for window in pair_cfg.windows_or_default() {
        match run_window(source, renderer, pair, pair_cfg, window, now).await {
            Ok((image, summary)) => {
                combined_text.push_str(&summary.display_text);
                images.push(image.clone());
                windows.push(WindowReport {
                    window,
                    outcome: WindowOutcome::Rendered { image, summary },
                });
            }
            Err((stage, error)) => {
                warn!(pair = %pair, window = %window, stage = %stage, error = %error, "window skipped");
                windows.push(WindowReport {
                    window,
                    outcome: WindowOutcome::Skipped { stage, error },
                });
            }
        }
    }

    let outcome = if images.is_empty() {
        PairOutcome::NothingToRender
    } else if let Some(publisher) = publisher {
        match publish_pair(publisher, combined_text.trim_start_matches('\n'), &images).await {
            Ok((post, deleted)) => {
                info!(pair = %pair, post = %post.0, deleted, "published");
                PairOutcome::Published { post, deleted }
            }
            Err(err) => {
                error!(pair = %pair, error = %err, "publish failed");
                PairOutcome::PublishFailed(err.to_string())
            }
        }
    } else {
        PairOutcome::DryRun {
            rendered: images.len(),
        }
    };

    PairReport {
        pair: pair.to_string(),
        windows,
        outcome,
    }
}

/// One (pair, window) through the pipeline, reporting which stage failed.
async fn run_window(
    source: &dyn MarketDataSource,
    renderer: &dyn Renderer,
    pair: &str,
    pair_cfg: &PairConfig,
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Result<(PathBuf, Summary), (Stage, Error)> {
    let spec = IntervalSpec::compute(window, now, pair_cfg.inception)
        .map_err(|e| (Stage::Interval, e.into()))?;

    let candles = source
        .candles(pair, &spec)
        .await
        .map_err(|e| (Stage::Fetch, e.into()))?;

    let summary =
        Summary::compute(window, &candles).map_err(|e| (Stage::Summarize, e.into()))?;

    let series = CandleSeries {
        pair: pair.to_string(),
        window,
        candles,
    };
    let image = renderer
        .render(&series, &spec, &summary)
        .map_err(|e| (Stage::Render, e.into()))?;

    Ok((image, summary))
}

/// Upload images (with a pause between them), clear the previous posts, and
/// create the new one.
async fn publish_pair(
    publisher: &dyn Publisher,
    text: &str,
    images: &[PathBuf],
) -> Result<(PostRef, usize), PublishError> {
    let mut media = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(UPLOAD_PAUSE).await;
        }
        media.push(publisher.upload_media(image).await?);
    }
    let deleted = publisher.delete_previous().await?;
    let post = publisher.post(text, &media).await?;
    Ok((post, deleted))
}
