use std::str::FromStr;
use std::thread;
use std::time::Duration;

use market::source::PriceBand;

use crate::error::ConfigError;

const DEFAULT_SEEDS: &str = "AAPL=150.0,GOOGL=2800.0,AMZN=3400.0,MSFT=299.0,TSLA=720.0";
const DEFAULT_QUERY_SYMBOLS: &str = "AAPL,GOOGL,MSFT";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    // =========================
    // Store
    // =========================
    /// Initial (symbol, price) pairs, in seed order.
    pub seeds: Vec<(String, f64)>,

    /// Number of lock shards in the price map (rounded up to a power of two).
    ///
    /// More shards means fewer symbols behind each lock; lookups and updates
    /// only ever take shared locks, so this mostly matters for late inserts.
    pub shard_count: usize,

    // =========================
    // Workers
    // =========================
    /// Cap on worker threads (updaters + readers).
    ///
    /// Defaults to available hardware parallelism, never below 2 so a
    /// single-core host can still run one updater and one reader.
    pub max_workers: usize,

    /// Number of batch updater threads. Symbols are split round-robin
    /// between them, so no symbol is written by two updaters.
    pub updaters: usize,

    /// Symbols polled by query readers. Readers share the threads left over
    /// after the updaters.
    pub query_symbols: Vec<String>,

    /// Pause between two batches of one updater.
    pub batch_interval: Duration,

    /// Pause between two polls of one reader thread.
    pub query_interval: Duration,

    // =========================
    // Price generation
    // =========================
    /// Generated prices are uniform over `[base - spread, base + spread]`.
    pub price_band: PriceBand,

    /// Fixed RNG seed for reproducible runs; `None` uses a thread-local RNG.
    pub price_seed: Option<u64>,

    // =========================
    // Telemetry
    // =========================
    /// Batches slower than this log a performance warning.
    pub slow_batch: Duration,

    /// Queries slower than this log a performance warning.
    pub slow_query: Duration,

    /// Emit JSON log lines instead of the human readable format.
    pub json_logs: bool,

    /// Stop on its own after this long; `None` runs until Ctrl-C.
    pub run_for: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());

        Self {
            seeds: parse_seeds(DEFAULT_SEEDS).unwrap_or_default(),
            shard_count: 64,

            max_workers: cores.max(2),
            updaters: 1,
            query_symbols: parse_list(DEFAULT_QUERY_SYMBOLS),
            batch_interval: Duration::from_millis(50),
            query_interval: Duration::from_secs(1),

            price_band: PriceBand::default(),
            price_seed: None,

            slow_batch: Duration::from_millis(5),
            slow_query: Duration::from_millis(1),
            json_logs: false,
            run_for: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("PRICE_SEEDS") {
            cfg.seeds = parse_seeds(&raw)?;
        }
        if let Some(raw) = lookup("QUERY_SYMBOLS") {
            cfg.query_symbols = parse_list(&raw);
        }
        if let Some(raw) = lookup("SHARD_COUNT") {
            cfg.shard_count = parse_value("SHARD_COUNT", &raw)?;
        }
        if let Some(raw) = lookup("MAX_WORKERS") {
            cfg.max_workers = parse_value("MAX_WORKERS", &raw)?;
        }
        if let Some(raw) = lookup("UPDATERS") {
            cfg.updaters = parse_value("UPDATERS", &raw)?;
        }
        if let Some(raw) = lookup("BATCH_INTERVAL_MS") {
            cfg.batch_interval = Duration::from_millis(parse_value("BATCH_INTERVAL_MS", &raw)?);
        }
        if let Some(raw) = lookup("QUERY_INTERVAL_MS") {
            cfg.query_interval = Duration::from_millis(parse_value("QUERY_INTERVAL_MS", &raw)?);
        }
        if let Some(raw) = lookup("PRICE_BASE") {
            cfg.price_band.base = parse_value("PRICE_BASE", &raw)?;
        }
        if let Some(raw) = lookup("PRICE_SPREAD") {
            cfg.price_band.spread = parse_value("PRICE_SPREAD", &raw)?;
        }
        if let Some(raw) = lookup("PRICE_SEED") {
            cfg.price_seed = Some(parse_value("PRICE_SEED", &raw)?);
        }
        if let Some(raw) = lookup("SLOW_BATCH_US") {
            cfg.slow_batch = Duration::from_micros(parse_value("SLOW_BATCH_US", &raw)?);
        }
        if let Some(raw) = lookup("SLOW_QUERY_US") {
            cfg.slow_query = Duration::from_micros(parse_value("SLOW_QUERY_US", &raw)?);
        }

        Ok(cfg)
    }

    /// Reject configurations the store or the workers cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seeds.is_empty() {
            return Err(ConfigError::EmptySeed);
        }
        if self.shard_count == 0 {
            return Err(ConfigError::ZeroShards);
        }
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidConcurrencyLimit);
        }
        if self.updaters == 0 {
            return Err(ConfigError::NoUpdaters);
        }
        if self.updaters > self.max_workers
            || (!self.query_symbols.is_empty() && self.updaters >= self.max_workers)
        {
            return Err(ConfigError::NoReaderCapacity {
                max_workers: self.max_workers,
                updaters: self.updaters,
            });
        }
        if self.batch_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("batch interval"));
        }
        if self.query_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("query interval"));
        }

        let PriceBand { base, spread } = self.price_band;
        let (low, high) = (base - spread, base + spread);
        if !base.is_finite()
            || !spread.is_finite()
            || spread < 0.0
            || !low.is_finite()
            || !high.is_finite()
            || !(high - low).is_finite()
        {
            return Err(ConfigError::InvalidPriceBand { base, spread });
        }

        Ok(())
    }

    /// Threads available to query readers once updaters are placed.
    pub fn reader_threads(&self) -> usize {
        self.query_symbols
            .len()
            .min(self.max_workers.saturating_sub(self.updaters))
    }
}

/// Parse `AAPL=150.0,GOOGL=2800.0`. Blank input yields an empty list.
pub fn parse_seeds(raw: &str) -> Result<Vec<(String, f64)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (symbol, price) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidSeedEntry(entry.to_string()))?;
            let price: f64 = price
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidSeedEntry(entry.to_string()))?;
            Ok((symbol.trim().to_string(), price))
        })
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
