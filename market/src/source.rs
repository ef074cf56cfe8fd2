//! Price generation.
//!
//! The store does not care where prices come from: an updater only needs a
//! [`PriceSource`] that turns `(symbol, base, spread)` into a price. The
//! default draws uniformly from `[base - spread, base + spread]`.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use store::Symbol;

/// Centre and half-width of the generated price range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceBand {
    pub base: f64,
    pub spread: f64,
}

impl Default for PriceBand {
    fn default() -> Self {
        Self {
            base: 100.0,
            spread: 50.0,
        }
    }
}

pub trait PriceSource: Send + Sync {
    fn next_price(&self, symbol: &Symbol, base: f64, spread: f64) -> f64;
}

impl<F> PriceSource for F
where
    F: Fn(&Symbol, f64, f64) -> f64 + Send + Sync,
{
    fn next_price(&self, symbol: &Symbol, base: f64, spread: f64) -> f64 {
        self(symbol, base, spread)
    }
}

/// Uniform prices from the calling thread's RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformPriceSource;

impl PriceSource for UniformPriceSource {
    fn next_price(&self, _symbol: &Symbol, base: f64, spread: f64) -> f64 {
        draw(&mut rand::thread_rng(), base, spread)
    }
}

/// Uniform prices from a fixed seed, reproducible across runs.
pub struct SeededPriceSource {
    rng: Mutex<StdRng>,
}

impl SeededPriceSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl PriceSource for SeededPriceSource {
    fn next_price(&self, _symbol: &Symbol, base: f64, spread: f64) -> f64 {
        draw(&mut *self.rng.lock(), base, spread)
    }
}

/// Falls back to `base` whenever the band is not a finite, non-empty range.
fn draw<R: Rng + ?Sized>(rng: &mut R, base: f64, spread: f64) -> f64 {
    let (low, high) = (base - spread, base + spread);

    // Also covers a NaN base or spread.
    if !(spread > 0.0) || !low.is_finite() || !high.is_finite() || !(high - low).is_finite() {
        return base;
    }
    rng.gen_range(low..=high)
}
