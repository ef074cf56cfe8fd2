//! Per-iteration reporting.
//!
//! Every updater batch and every reader query produces one [`Report`]:
//! operation kind, symbol, value-or-absence and duration. Sinks are
//! best-effort; nothing in the worker loops depends on a sink succeeding.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use common::logger::flag_if_slow;
use store::Symbol;

use crate::metrics::{Counters, bump};

#[derive(Clone, Debug, PartialEq)]
pub enum Report {
    Batch {
        applied: usize,
        skipped: usize,
        elapsed: Duration,
    },
    Query {
        symbol: Symbol,
        /// `None` when the symbol is not in the store.
        price: Option<f64>,
        elapsed: Duration,
    },
}

impl Report {
    pub fn elapsed(&self) -> Duration {
        match self {
            Report::Batch { elapsed, .. } | Report::Query { elapsed, .. } => *elapsed,
        }
    }
}

pub trait TelemetrySink: Send + Sync {
    fn record(&self, report: &Report);
}

/// Logs reports as structured `tracing` events and keeps [`Counters`].
#[derive(Clone)]
pub struct TracingSink {
    counters: Counters,
    slow_batch: Duration,
    slow_query: Duration,
}

impl TracingSink {
    pub fn new(counters: Counters) -> Self {
        Self {
            counters,
            slow_batch: Duration::from_millis(5),
            slow_query: Duration::from_millis(1),
        }
    }

    /// Iterations slower than these thresholds log a `performance` warning.
    pub fn with_slow_thresholds(mut self, batch: Duration, query: Duration) -> Self {
        self.slow_batch = batch;
        self.slow_query = query;
        self
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl TelemetrySink for TracingSink {
    fn record(&self, report: &Report) {
        match report {
            Report::Batch {
                applied,
                skipped,
                elapsed,
            } => {
                bump(&self.counters.batches, 1);
                bump(&self.counters.updates_applied, *applied as u64);
                bump(&self.counters.updates_skipped, *skipped as u64);

                info!(
                    applied,
                    skipped,
                    latency_us = elapsed.as_micros() as u64,
                    "batch update applied"
                );
                if flag_if_slow("batch_update", self.slow_batch, *elapsed) {
                    bump(&self.counters.slow_iterations, 1);
                }
            }
            Report::Query {
                symbol,
                price,
                elapsed,
            } => {
                bump(&self.counters.queries, 1);
                let latency_us = elapsed.as_micros() as u64;

                match price {
                    Some(price) => {
                        bump(&self.counters.query_hits, 1);
                        info!(%symbol, price, latency_us, "price query");
                    }
                    None => {
                        bump(&self.counters.query_misses, 1);
                        info!(%symbol, latency_us, "symbol not found");
                    }
                }
                if flag_if_slow("price_query", self.slow_query, *elapsed) {
                    bump(&self.counters.slow_iterations, 1);
                }
            }
        }
    }
}

/// Keeps every report in memory.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, report: &Report) {
        self.reports.lock().push(report.clone());
    }
}
