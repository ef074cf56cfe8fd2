use thiserror::Error;

use store::StoreError;

/// Startup misconfiguration. Always raised before any worker starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("no seed prices configured")]
    EmptySeed,

    #[error("malformed seed entry {0:?}; expected SYMBOL=PRICE")]
    InvalidSeedEntry(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("concurrency limit must be at least 1")]
    InvalidConcurrencyLimit,

    #[error("at least one batch updater is required")]
    NoUpdaters,

    #[error("concurrency limit {max_workers} leaves no thread for query readers after {updaters} updater(s)")]
    NoReaderCapacity { max_workers: usize, updaters: usize },

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("invalid price band: base {base}, spread {spread}")]
    InvalidPriceBand { base: f64, spread: f64 },

    #[error("shard count must be at least 1")]
    ZeroShards,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker thread {0} panicked")]
    WorkerPanicked(String),
}
