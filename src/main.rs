use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use candlecast::cli::Cli;
use candlecast::config;
use candlecast::cycle::run_cycle;
use candlecast::providers::coinbase::CoinbaseSource;
use candlecast::publish::MastodonFactory;
use candlecast::render::SvgRenderer;
use candlecast::scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = config::load_path(&cli.config)?;
    if let Some(out_dir) = cli.out_dir {
        config.output_dir = out_dir;
    }

    let source = CoinbaseSource::new()?;
    let renderer = SvgRenderer::new(config.output_dir.clone(), config.display_tz()?);
    let factory = MastodonFactory;

    info!(
        pairs = config.pairs.len(),
        publish = cli.publish,
        out_dir = %config.output_dir.display(),
        "starting"
    );

    if cli.once {
        let report = run_cycle(&source, &renderer, &factory, &config, cli.publish, Utc::now()).await;
        info!(
            rendered = report.rendered_count(),
            skipped = report.skipped_count(),
            published = report.published_count(),
            "cycle complete"
        );
    } else {
        scheduler::run_forever(&source, &renderer, &factory, &config, cli.publish).await;
    }
    Ok(())
}
