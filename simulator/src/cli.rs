use std::time::Duration;

use clap::Parser;

use crate::config::{AppConfig, parse_seeds};
use crate::error::ConfigError;

/// Command-line overrides. Anything left unset keeps the value from the
/// environment (or its default).
#[derive(Debug, Parser)]
#[command(name = "price-store", version)]
pub struct Cli {
    /// Initial prices, e.g. `AAPL=150.0,GOOGL=2800.0`
    #[arg(long)]
    pub seeds: Option<String>,

    /// Symbols polled by query readers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub query: Option<Vec<String>>,

    /// Cap on worker threads (updaters + readers)
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Number of batch updater threads
    #[arg(long)]
    pub updaters: Option<usize>,

    #[arg(long)]
    pub batch_interval_ms: Option<u64>,

    #[arg(long)]
    pub query_interval_ms: Option<u64>,

    /// Centre of the generated price range
    #[arg(long)]
    pub base_price: Option<f64>,

    /// Half-width of the generated price range
    #[arg(long)]
    pub spread: Option<f64>,

    /// Fixed RNG seed for reproducible prices
    #[arg(long)]
    pub price_seed: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    pub run_for_secs: Option<u64>,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    pub fn apply(self, cfg: &mut AppConfig) -> Result<(), ConfigError> {
        if let Some(raw) = self.seeds {
            cfg.seeds = parse_seeds(&raw)?;
        }
        if let Some(symbols) = self.query {
            cfg.query_symbols = symbols
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(n) = self.max_workers {
            cfg.max_workers = n;
        }
        if let Some(n) = self.updaters {
            cfg.updaters = n;
        }
        if let Some(ms) = self.batch_interval_ms {
            cfg.batch_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.query_interval_ms {
            cfg.query_interval = Duration::from_millis(ms);
        }
        if let Some(base) = self.base_price {
            cfg.price_band.base = base;
        }
        if let Some(spread) = self.spread {
            cfg.price_band.spread = spread;
        }
        if let Some(seed) = self.price_seed {
            cfg.price_seed = Some(seed);
        }
        if let Some(secs) = self.run_for_secs {
            cfg.run_for = Some(Duration::from_secs(secs));
        }
        cfg.json_logs |= self.json_logs;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "price-store",
            "--seeds",
            "AAPL=150.0,GOOGL=2800.0",
            "--query",
            "AAPL,MSFT",
            "--max-workers",
            "3",
            "--batch-interval-ms",
            "5",
            "--run-for-secs",
            "2",
            "--json-logs",
        ])
        .unwrap();

        let mut cfg = AppConfig::default();
        cli.apply(&mut cfg).unwrap();

        assert_eq!(cfg.seeds.len(), 2);
        assert_eq!(cfg.query_symbols, ["AAPL", "MSFT"]);
        assert_eq!(cfg.max_workers, 3);
        assert_eq!(cfg.batch_interval, Duration::from_millis(5));
        assert_eq!(cfg.run_for, Some(Duration::from_secs(2)));
        assert!(cfg.json_logs);
    }

    #[test]
    fn no_flags_keep_config_untouched() {
        let cli = Cli::try_parse_from(["price-store"]).unwrap();

        let mut cfg = AppConfig::default();
        cli.apply(&mut cfg).unwrap();

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn bad_seed_flag_is_a_config_error() {
        let cli = Cli::try_parse_from(["price-store", "--seeds", "AAPL"]).unwrap();

        let mut cfg = AppConfig::default();
        assert_eq!(
            cli.apply(&mut cfg),
            Err(ConfigError::InvalidSeedEntry("AAPL".into()))
        );
    }
}
