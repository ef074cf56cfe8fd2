use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub batches: Arc<AtomicU64>,
    pub updates_applied: Arc<AtomicU64>,
    pub updates_skipped: Arc<AtomicU64>,

    pub queries: Arc<AtomicU64>,
    pub query_hits: Arc<AtomicU64>,
    pub query_misses: Arc<AtomicU64>,

    pub slow_iterations: Arc<AtomicU64>,
}

/// Plain-number copy of [`Counters`] at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub batches: u64,
    pub updates_applied: u64,
    pub updates_skipped: u64,
    pub queries: u64,
    pub query_hits: u64,
    pub query_misses: u64,
    pub slow_iterations: u64,
}

impl Counters {
    pub fn snapshot(&self) -> CountersSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CountersSnapshot {
            batches: get(&self.batches),
            updates_applied: get(&self.updates_applied),
            updates_skipped: get(&self.updates_skipped),
            queries: get(&self.queries),
            query_hits: get(&self.query_hits),
            query_misses: get(&self.query_misses),
            slow_iterations: get(&self.slow_iterations),
        }
    }
}

pub(crate) fn bump(c: &AtomicU64, by: u64) {
    c.fetch_add(by, Ordering::Relaxed);
}
