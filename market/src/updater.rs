//! Batch price updater.
//!
//! Each batch generates a fresh price for every assigned symbol and then
//! applies them one at a time through [`ConcurrentPriceMap::update`]. Only
//! individual updates are atomic: readers may observe a batch half applied,
//! and an interrupted batch leaves a prefix of its updates in place.
//! Symbols missing from the store are skipped, not treated as errors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use common::logger::{TraceId, root_span};
use store::{ConcurrentPriceMap, Symbol};

use crate::shutdown::Shutdown;
use crate::source::{PriceBand, PriceSource};
use crate::telemetry::{Report, TelemetrySink};

#[derive(Clone, Debug, PartialEq)]
pub struct BatchOutcome {
    pub applied: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl From<BatchOutcome> for Report {
    fn from(o: BatchOutcome) -> Self {
        Report::Batch {
            applied: o.applied,
            skipped: o.skipped,
            elapsed: o.elapsed,
        }
    }
}

pub struct BatchUpdater {
    map: Arc<ConcurrentPriceMap>,
    source: Arc<dyn PriceSource>,
    band: PriceBand,
    symbols: Vec<Symbol>,
}

impl BatchUpdater {
    /// Updater over every symbol currently in the store.
    pub fn new(
        map: Arc<ConcurrentPriceMap>,
        source: Arc<dyn PriceSource>,
        band: PriceBand,
    ) -> Self {
        let symbols = map.symbols();
        Self::for_symbols(map, source, band, symbols)
    }

    /// Updater over an explicit subset, used when several updaters split
    /// the key set between them.
    pub fn for_symbols(
        map: Arc<ConcurrentPriceMap>,
        source: Arc<dyn PriceSource>,
        band: PriceBand,
        symbols: Vec<Symbol>,
    ) -> Self {
        Self {
            map,
            source,
            band,
            symbols,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Generate and apply one batch.
    pub fn run_batch(&self) -> BatchOutcome {
        let started = Instant::now();
        let PriceBand { base, spread } = self.band;

        let batch: Vec<(&Symbol, f64)> = self
            .symbols
            .iter()
            .map(|s| (s, self.source.next_price(s, base, spread)))
            .collect();

        let mut applied = 0;
        let mut skipped = 0;
        for (symbol, price) in batch {
            if self.map.update(symbol.as_str(), price) {
                applied += 1;
            } else {
                skipped += 1;
                debug!(%symbol, "symbol not in store; update skipped");
            }
        }

        BatchOutcome {
            applied,
            skipped,
            elapsed: started.elapsed(),
        }
    }

    /// Run batches every `interval` until `shutdown` fires.
    pub fn run(&self, sink: &dyn TelemetrySink, interval: Duration, shutdown: &Shutdown) {
        info!(
            symbols = self.symbols.len(),
            interval_ms = interval.as_millis() as u64,
            "batch updater started"
        );

        while !shutdown.is_triggered() {
            let trace_id = TraceId::default();
            let outcome = root_span("batch_update", &trace_id).in_scope(|| self.run_batch());
            sink.record(&outcome.into());

            if shutdown.sleep(interval) {
                break;
            }
        }

        info!("batch updater stopped");
    }
}
