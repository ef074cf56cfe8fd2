//! Worker supervisor.
//!
//! Startup order:
//!   1. validate configuration (nothing is spawned on error),
//!   2. build and seed the price map while it is still exclusively owned,
//!   3. share it behind an `Arc` and spawn the updater and reader threads.
//!
//! Seeding finishes before the first `thread::spawn`, and spawning a thread
//! happens-before everything that thread does, so every worker sees the
//! complete seed.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use market::reader::{QueryReader, run_readers};
use market::shutdown::{self, ShutdownTrigger};
use market::source::PriceSource;
use market::telemetry::TelemetrySink;
use market::updater::BatchUpdater;
use store::{ConcurrentPriceMap, Symbol};

use crate::config::AppConfig;
use crate::error::AppError;

pub struct Supervisor {
    map: Arc<ConcurrentPriceMap>,
    trigger: ShutdownTrigger,
    workers: Vec<JoinHandle<()>>,
}

impl Supervisor {
    pub fn start(
        cfg: &AppConfig,
        source: Arc<dyn PriceSource>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Result<Self, AppError> {
        cfg.validate()?;

        let mut map = ConcurrentPriceMap::with_shards(cfg.shard_count);
        map.seed(cfg.seeds.iter().map(|(s, p)| (s.as_str(), *p)))?;

        let query_symbols = cfg
            .query_symbols
            .iter()
            .map(Symbol::new)
            .collect::<Result<Vec<_>, _>>()?;

        let (trigger, signal) = shutdown::channel();
        let mut sup = Self {
            map: Arc::new(map),
            trigger,
            workers: Vec::new(),
        };

        for (i, symbols) in round_robin(sup.map.symbols(), cfg.updaters)
            .into_iter()
            .enumerate()
        {
            let updater = BatchUpdater::for_symbols(
                Arc::clone(&sup.map),
                Arc::clone(&source),
                cfg.price_band,
                symbols,
            );
            let sink = Arc::clone(&sink);
            let signal = signal.clone();
            let interval = cfg.batch_interval;

            sup.spawn(format!("updater-{i}"), move || {
                updater.run(&*sink, interval, &signal)
            })?;
        }

        for (i, symbols) in round_robin(query_symbols, cfg.reader_threads())
            .into_iter()
            .enumerate()
        {
            let readers: Vec<QueryReader> = symbols
                .into_iter()
                .map(|s| QueryReader::new(Arc::clone(&sup.map), s))
                .collect();
            let sink = Arc::clone(&sink);
            let signal = signal.clone();
            let interval = cfg.query_interval;

            sup.spawn(format!("reader-{i}"), move || {
                run_readers(&readers, &*sink, interval, &signal)
            })?;
        }

        info!(
            symbols = sup.map.len(),
            shards = sup.map.shard_count(),
            workers = sup.workers.len(),
            max_workers = cfg.max_workers,
            "price store workers started"
        );

        Ok(sup)
    }

    pub fn map(&self) -> &Arc<ConcurrentPriceMap> {
        &self.map
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Signal every worker to stop and wait for all of them.
    ///
    /// All workers are joined even if one of them panicked; the first
    /// panicked worker is reported.
    pub fn stop(mut self) -> Result<(), AppError> {
        self.trigger.trigger();

        let mut first_panic = None;
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "worker thread panicked");
                first_panic.get_or_insert(name);
            }
        }

        info!("price store workers stopped");
        match first_panic {
            Some(name) => Err(AppError::WorkerPanicked(name)),
            None => Ok(()),
        }
    }

    fn spawn<F>(&mut self, name: String, f: F) -> Result<(), AppError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new().name(name).spawn(f)?;
        self.workers.push(handle);
        Ok(())
    }
}

impl Drop for Supervisor {
    /// Workers never outlive an abandoned supervisor (e.g. a failed start).
    fn drop(&mut self) {
        self.trigger.trigger();
    }
}

/// Deal `items` into at most `groups` non-empty groups.
fn round_robin<T>(items: Vec<T>, groups: usize) -> Vec<Vec<T>> {
    let groups = groups.min(items.len());
    if groups == 0 {
        return Vec::new();
    }
    let mut out: Vec<Vec<T>> = (0..groups).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        out[i % groups].push(item);
    }
    out
}
