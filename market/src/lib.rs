//! Market simulation workers over the shared price store.
//!
//! - [`updater::BatchUpdater`] generates and applies batches of prices.
//! - [`reader::QueryReader`] polls single symbols.
//! - [`source::PriceSource`] is the pluggable price generator.
//! - [`telemetry::TelemetrySink`] receives one report per worker iteration.
//! - [`shutdown`] carries the stop signal into worker threads.

pub mod metrics;
pub mod reader;
pub mod shutdown;
pub mod source;
pub mod telemetry;
pub mod updater;
