//! Failure-containment tests for the publisher cycle, using mock
//! collaborators behind the same traits the binary wires up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use candlecast::config::{Config, PairConfig, PublishConfig};
use candlecast::cycle::{PairOutcome, Stage, WindowOutcome, run_cycle, run_pair};
use candlecast::models::candle::{Candle, CandleSeries};
use candlecast::models::interval::IntervalSpec;
use candlecast::models::window::TimeWindow;
use candlecast::providers::MarketDataSource;
use candlecast::providers::errors::ProviderError;
use candlecast::publish::{MediaRef, PostRef, PublishError, Publisher, PublisherFactory};
use candlecast::render::{RenderError, Renderer};
use candlecast::summary::Summary;

fn now() -> DateTime<Utc> {
    "2024-06-15T12:00:00Z".parse().unwrap()
}

fn pair_cfg(windows: &[TimeWindow], publish: Option<PublishConfig>) -> PairConfig {
    PairConfig {
        display_name: None,
        inception: None,
        windows: Some(windows.to_vec()),
        publish,
    }
}

fn publish_cfg() -> PublishConfig {
    PublishConfig {
        base_url: "https://mastodon.example".to_string(),
        token_env: "UNUSED".to_string(),
    }
}

fn config(pairs: Vec<(&str, PairConfig)>) -> Config {
    let toml = "[pairs.PLACEHOLDER]";
    let mut config = candlecast::config::load_str(toml).unwrap();
    config.pairs = pairs
        .into_iter()
        .map(|(id, cfg)| (id.to_string(), cfg))
        .collect::<IndexMap<_, _>>();
    config
}

/// Returns three well-formed candles inside the requested range, or a rate
/// limit for windows listed as throttled.
struct CannedSource {
    throttled: Vec<(String, TimeWindow)>,
    empty: bool,
}

impl CannedSource {
    fn ok() -> Self {
        Self {
            throttled: vec![],
            empty: false,
        }
    }
}

#[async_trait]
impl MarketDataSource for CannedSource {
    async fn candles(&self, pair: &str, spec: &IntervalSpec) -> Result<Vec<Candle>, ProviderError> {
        if self
            .throttled
            .iter()
            .any(|(p, w)| p == pair && *w == spec.window)
        {
            return Err(ProviderError::RateLimited);
        }
        if self.empty {
            return Ok(vec![]);
        }
        let mid = spec.start + (spec.end - spec.start) / 2;
        Ok([spec.start, mid, spec.end]
            .into_iter()
            .map(|time| Candle {
                time,
                open: 100.0,
                high: 110.0,
                low: 95.0,
                close: 105.0,
                volume: 2.0,
            })
            .collect())
    }
}

/// Counts invocations; never touches the filesystem.
#[derive(Default)]
struct CountingRenderer {
    calls: AtomicUsize,
}

impl Renderer for CountingRenderer {
    fn render(
        &self,
        series: &CandleSeries,
        _spec: &IntervalSpec,
        _summary: &Summary,
    ) -> Result<PathBuf, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PathBuf::from(format!(
            "{}-{}.svg",
            series.pair.to_lowercase(),
            series.window
        )))
    }
}

#[derive(Default)]
struct MockPublisherState {
    uploads: AtomicUsize,
    deletes: AtomicUsize,
    posts: AtomicUsize,
}

struct MockPublisher {
    state: Arc<MockPublisherState>,
    fail_post: bool,
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn upload_media(&self, image: &Path) -> Result<MediaRef, PublishError> {
        self.state.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(MediaRef(image.display().to_string()))
    }

    async fn delete_previous(&self) -> Result<usize, PublishError> {
        self.state.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }

    async fn post(&self, _text: &str, media: &[MediaRef]) -> Result<PostRef, PublishError> {
        if self.fail_post {
            return Err(PublishError::Api("boom".to_string()));
        }
        self.state.posts.fetch_add(1, Ordering::SeqCst);
        Ok(PostRef(format!("post-{}", media.len())))
    }
}

/// Hands out a mock publisher per pair; `fail_post_for` pairs get one whose
/// post call fails.
struct MockFactory {
    state: Arc<MockPublisherState>,
    constructed: AtomicUsize,
    fail_post_for: Vec<String>,
}

impl MockFactory {
    fn new(fail_post_for: &[&str]) -> Self {
        Self {
            state: Arc::default(),
            constructed: AtomicUsize::new(0),
            fail_post_for: fail_post_for.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PublisherFactory for MockFactory {
    fn publisher_for(
        &self,
        pair: &str,
        _cfg: &PublishConfig,
    ) -> Result<Box<dyn Publisher>, PublishError> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPublisher {
            state: Arc::clone(&self.state),
            fail_post: self.fail_post_for.iter().any(|p| p == pair),
        }))
    }
}

#[tokio::test]
async fn rate_limited_window_does_not_block_the_rest() {
    let source = CannedSource {
        throttled: vec![("BTC-USD".to_string(), TimeWindow::Day)],
        empty: false,
    };
    let renderer = CountingRenderer::default();
    let cfg = pair_cfg(&[TimeWindow::Day, TimeWindow::Week], None);

    let report = run_pair(&source, &renderer, "BTC-USD", &cfg, None, now()).await;

    assert!(matches!(
        report.windows[0].outcome,
        WindowOutcome::Skipped {
            stage: Stage::Fetch,
            ..
        }
    ));
    assert!(matches!(
        report.windows[1].outcome,
        WindowOutcome::Rendered { .. }
    ));
    assert!(matches!(report.outcome, PairOutcome::DryRun { rendered: 1 }));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dry_run_never_contacts_the_publisher() {
    let source = CannedSource::ok();
    let renderer = CountingRenderer::default();
    let factory = MockFactory::new(&[]);
    let config = config(vec![(
        "BTC-USD",
        pair_cfg(&[TimeWindow::Day, TimeWindow::Week], Some(publish_cfg())),
    )]);

    let report = run_cycle(&source, &renderer, &factory, &config, false, now()).await;

    assert_eq!(factory.constructed.load(Ordering::SeqCst), 0);
    assert_eq!(factory.state.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(factory.state.posts.load(Ordering::SeqCst), 0);
    // The renderer still ran for every window.
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    assert!(matches!(
        report.pairs[0].outcome,
        PairOutcome::DryRun { rendered: 2 }
    ));
}

#[tokio::test]
async fn publish_failure_on_one_pair_does_not_block_the_next() {
    let source = CannedSource::ok();
    let renderer = CountingRenderer::default();
    let factory = MockFactory::new(&["BTC-USD"]);
    let config = config(vec![
        (
            "BTC-USD",
            pair_cfg(&[TimeWindow::Day], Some(publish_cfg())),
        ),
        (
            "ETH-USD",
            pair_cfg(&[TimeWindow::Day], Some(publish_cfg())),
        ),
    ]);

    let report = run_cycle(&source, &renderer, &factory, &config, true, now()).await;

    assert!(matches!(
        report.pairs[0].outcome,
        PairOutcome::PublishFailed(_)
    ));
    assert!(matches!(
        report.pairs[1].outcome,
        PairOutcome::Published { .. }
    ));
    // Both pairs rendered regardless of the first one's publish failure.
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.published_count(), 1);
}

#[tokio::test]
async fn published_pair_uploads_then_deletes_then_posts() {
    let source = CannedSource::ok();
    let renderer = CountingRenderer::default();
    let factory = MockFactory::new(&[]);
    let config = config(vec![(
        "BTC-USD",
        pair_cfg(&[TimeWindow::Day], Some(publish_cfg())),
    )]);

    let report = run_cycle(&source, &renderer, &factory, &config, true, now()).await;

    match &report.pairs[0].outcome {
        PairOutcome::Published { deleted, .. } => assert_eq!(*deleted, 1),
        other => panic!("expected Published, got {other:?}"),
    }
    assert_eq!(factory.state.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(factory.state.deletes.load(Ordering::SeqCst), 1);
    assert_eq!(factory.state.posts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_candles_mean_nothing_to_render() {
    let source = CannedSource {
        throttled: vec![],
        empty: true,
    };
    let renderer = CountingRenderer::default();
    let cfg = pair_cfg(&[TimeWindow::Day, TimeWindow::Week], None);

    let report = run_pair(&source, &renderer, "BTC-USD", &cfg, None, now()).await;

    assert!(matches!(report.outcome, PairOutcome::NothingToRender));
    assert!(report.windows.iter().all(|w| matches!(
        w.outcome,
        WindowOutcome::Skipped {
            stage: Stage::Summarize,
            ..
        }
    )));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
}

/// A factory failure (e.g. missing credential) still renders the charts and
/// records the pair as failed.
struct RefusingFactory;

impl PublisherFactory for RefusingFactory {
    fn publisher_for(
        &self,
        _pair: &str,
        cfg: &PublishConfig,
    ) -> Result<Box<dyn Publisher>, PublishError> {
        Err(PublishError::MissingCredential(cfg.token_env.clone()))
    }
}

#[tokio::test]
async fn missing_credential_fails_the_pair_but_still_renders() {
    let source = CannedSource::ok();
    let renderer = CountingRenderer::default();
    let config = config(vec![(
        "BTC-USD",
        pair_cfg(&[TimeWindow::Day], Some(publish_cfg())),
    )]);

    let report = run_cycle(&source, &renderer, &RefusingFactory, &config, true, now()).await;

    assert!(matches!(
        report.pairs[0].outcome,
        PairOutcome::PublishFailed(_)
    ));
    assert_eq!(report.pairs[0].rendered_count(), 1);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}
