//! Point-query reader.
//!
//! A reader repeatedly looks up its symbol and reports the loaded price, or
//! its absence. Readers never mutate the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use store::{ConcurrentPriceMap, Symbol};

use crate::shutdown::Shutdown;
use crate::telemetry::{Report, TelemetrySink};

#[derive(Clone, Debug, PartialEq)]
pub struct QueryOutcome {
    pub symbol: Symbol,
    pub price: Option<f64>,
    pub elapsed: Duration,
}

impl From<QueryOutcome> for Report {
    fn from(o: QueryOutcome) -> Self {
        Report::Query {
            symbol: o.symbol,
            price: o.price,
            elapsed: o.elapsed,
        }
    }
}

#[derive(Clone)]
pub struct QueryReader {
    map: Arc<ConcurrentPriceMap>,
    symbol: Symbol,
}

impl QueryReader {
    pub fn new(map: Arc<ConcurrentPriceMap>, symbol: Symbol) -> Self {
        Self { map, symbol }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// One lookup. Absence is a normal outcome.
    pub fn query(&self) -> QueryOutcome {
        let started = Instant::now();
        let price = self.map.find(self.symbol.as_str()).map(|cell| cell.load());

        QueryOutcome {
            symbol: self.symbol.clone(),
            price,
            elapsed: started.elapsed(),
        }
    }

    /// Query every `interval` until `shutdown` fires.
    pub fn run(&self, sink: &dyn TelemetrySink, interval: Duration, shutdown: &Shutdown) {
        run_readers(std::slice::from_ref(self), sink, interval, shutdown);
    }
}

/// Poll several readers from the calling thread, one query each per
/// iteration, until `shutdown` fires.
pub fn run_readers(
    readers: &[QueryReader],
    sink: &dyn TelemetrySink,
    interval: Duration,
    shutdown: &Shutdown,
) {
    let symbols: Vec<&str> = readers.iter().map(|r| r.symbol.as_str()).collect();
    info!(
        ?symbols,
        interval_ms = interval.as_millis() as u64,
        "query reader started"
    );

    while !shutdown.is_triggered() {
        for reader in readers {
            sink.record(&reader.query().into());
        }

        if shutdown.sleep(interval) {
            break;
        }
    }

    info!(?symbols, "query reader stopped");
}
