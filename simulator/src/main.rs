use std::sync::Arc;

use clap::Parser;

use common::logger::init_logger;
use market::metrics::Counters;
use market::source::{PriceSource, SeededPriceSource, UniformPriceSource};
use market::telemetry::TracingSink;
use simulator::{cli::Cli, config::AppConfig, supervisor::Supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = AppConfig::from_env()?;
    cli.apply(&mut cfg)?;

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("price-store", cfg.json_logs || is_production);

    tracing::info!("Starting price store simulator...");

    let counters = Counters::default();
    let sink = Arc::new(
        TracingSink::new(counters.clone()).with_slow_thresholds(cfg.slow_batch, cfg.slow_query),
    );

    let source: Arc<dyn PriceSource> = match cfg.price_seed {
        Some(seed) => Arc::new(SeededPriceSource::new(seed)),
        None => Arc::new(UniformPriceSource),
    };

    let supervisor = Supervisor::start(&cfg, source, sink)?;

    match cfg.run_for {
        Some(limit) => {
            tokio::select! {
                res = tokio::signal::ctrl_c() => res?,
                _ = tokio::time::sleep(limit) => {
                    tracing::info!(secs = limit.as_secs(), "run duration elapsed");
                }
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }
    tracing::info!("Shutdown signal received");

    // Joining blocks on OS threads; keep it off the async workers.
    tokio::task::spawn_blocking(move || supervisor.stop()).await??;

    let totals = counters.snapshot();
    tracing::info!(
        batches = totals.batches,
        updates_applied = totals.updates_applied,
        updates_skipped = totals.updates_skipped,
        queries = totals.queries,
        query_hits = totals.query_hits,
        query_misses = totals.query_misses,
        slow_iterations = totals.slow_iterations,
        "final counters"
    );

    Ok(())
}
