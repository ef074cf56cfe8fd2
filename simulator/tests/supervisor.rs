use std::sync::Arc;
use std::thread;
use std::time::Duration;

use market::metrics::Counters;
use market::source::{PriceBand, PriceSource, SeededPriceSource};
use market::telemetry::{MemorySink, Report, TelemetrySink, TracingSink};
use simulator::config::AppConfig;
use simulator::error::{AppError, ConfigError};
use simulator::supervisor::Supervisor;
use store::StoreError;

fn fast_config() -> AppConfig {
    AppConfig {
        max_workers: 3,
        batch_interval: Duration::from_millis(2),
        query_interval: Duration::from_millis(2),
        ..AppConfig::default()
    }
}

fn seeded_source() -> Arc<dyn PriceSource> {
    Arc::new(SeededPriceSource::new(1))
}

#[test]
fn starts_reports_and_stops() {
    let sink = Arc::new(MemorySink::new());
    let sup = Supervisor::start(&fast_config(), seeded_source(), sink.clone()).unwrap();

    // one updater + two reader threads for three query symbols
    assert_eq!(sup.worker_count(), 3);
    assert_eq!(sup.map().len(), 5);

    thread::sleep(Duration::from_millis(50));
    let map = Arc::clone(sup.map());
    sup.stop().unwrap();

    let reports = sink.reports();
    assert!(reports.iter().any(|r| matches!(r, Report::Batch { applied: 5, .. })));
    for symbol in ["AAPL", "GOOGL", "MSFT"] {
        let answered = reports.iter().any(|r| match r {
            Report::Query { symbol: s, price, .. } => s.as_str() == symbol && price.is_some(),
            _ => false,
        });
        assert!(answered, "no query report for {symbol}");
    }

    // every seeded symbol has been rewritten into the default band
    for (_, price) in map.snapshot() {
        assert!((50.0..=150.0).contains(&price), "price {price} outside band");
    }
}

#[test]
fn unknown_query_symbols_report_absence() {
    let cfg = AppConfig {
        query_symbols: vec!["NFLX".into()],
        ..fast_config()
    };
    let counters = Counters::default();
    let sink: Arc<dyn TelemetrySink> = Arc::new(TracingSink::new(counters.clone()));

    let sup = Supervisor::start(&cfg, seeded_source(), sink).unwrap();
    thread::sleep(Duration::from_millis(20));
    let map = Arc::clone(sup.map());
    sup.stop().unwrap();

    let totals = counters.snapshot();
    assert!(totals.queries > 0);
    assert_eq!(totals.query_hits, 0);
    assert_eq!(totals.query_misses, totals.queries);
    // queries never insert
    assert!(!map.contains("NFLX"));
}

#[test]
fn multiple_updaters_split_the_key_set() {
    let cfg = AppConfig {
        max_workers: 4,
        updaters: 2,
        query_symbols: vec![],
        price_band: PriceBand {
            base: 10.0,
            spread: 0.0,
        },
        ..fast_config()
    };
    let sink = Arc::new(MemorySink::new());

    let sup = Supervisor::start(&cfg, seeded_source(), sink.clone()).unwrap();
    assert_eq!(sup.worker_count(), 2);
    thread::sleep(Duration::from_millis(30));
    let map = Arc::clone(sup.map());
    sup.stop().unwrap();

    // 5 symbols dealt round-robin: batches of 3 and 2
    let reports = sink.reports();
    assert!(reports.iter().any(|r| matches!(r, Report::Batch { applied: 3, .. })));
    assert!(reports.iter().any(|r| matches!(r, Report::Batch { applied: 2, .. })));
    assert!(map.snapshot().iter().all(|(_, p)| *p == 10.0));
}

#[test]
fn misconfiguration_fails_before_any_worker_starts() {
    let sink = Arc::new(MemorySink::new());

    let empty = AppConfig {
        seeds: vec![],
        ..fast_config()
    };
    assert!(matches!(
        Supervisor::start(&empty, seeded_source(), sink.clone()),
        Err(AppError::Config(ConfigError::EmptySeed))
    ));

    let no_limit = AppConfig {
        max_workers: 0,
        ..fast_config()
    };
    assert!(matches!(
        Supervisor::start(&no_limit, seeded_source(), sink.clone()),
        Err(AppError::Config(ConfigError::InvalidConcurrencyLimit))
    ));

    let duplicate = AppConfig {
        seeds: vec![("AAPL".into(), 1.0), ("AAPL".into(), 2.0)],
        ..fast_config()
    };
    assert!(matches!(
        Supervisor::start(&duplicate, seeded_source(), sink.clone()),
        Err(AppError::Store(StoreError::DuplicateSymbol(_)))
    ));

    let bad_query = AppConfig {
        query_symbols: vec!["BRK B".into()],
        ..fast_config()
    };
    assert!(matches!(
        Supervisor::start(&bad_query, seeded_source(), sink.clone()),
        Err(AppError::Store(StoreError::InvalidSymbol(_)))
    ));

    let unbounded_band = AppConfig {
        price_band: PriceBand {
            base: 0.0,
            spread: f64::MAX,
        },
        ..fast_config()
    };
    assert!(matches!(
        Supervisor::start(&unbounded_band, seeded_source(), sink.clone()),
        Err(AppError::Config(ConfigError::InvalidPriceBand { .. }))
    ));

    assert!(sink.is_empty());
}
