use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic holder for one symbol's current price.
///
/// The value lives as its IEEE-754 bit pattern in a single `AtomicU64`, so a
/// load always observes exactly one complete prior store. Stores publish with
/// `Release` and loads use `Acquire`; concurrent stores resolve last-write-wins.
pub struct PriceCell {
    bits: AtomicU64,
}

impl PriceCell {
    pub fn new(initial: f64) -> Self {
        Self {
            bits: AtomicU64::new(initial.to_bits()),
        }
    }

    /// Current price. Never blocks.
    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Replace the current price. Never blocks.
    #[inline]
    pub fn store(&self, price: f64) {
        self.bits.store(price.to_bits(), Ordering::Release);
    }
}

impl Default for PriceCell {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Debug for PriceCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceCell")
            .field("price", &self.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn store_then_load_returns_latest() {
        let cell = PriceCell::new(150.0);
        assert_eq!(cell.load(), 150.0);

        cell.store(151.25);
        assert_eq!(cell.load(), 151.25);

        assert_eq!(PriceCell::default().load(), 0.0);
    }

    #[test]
    fn preserves_exact_bit_patterns() {
        let cell = PriceCell::new(-0.0);
        assert!(cell.load().is_sign_negative());

        let nan = f64::from_bits(0x7ff8_0000_dead_beef);
        cell.store(nan);
        assert_eq!(cell.load().to_bits(), nan.to_bits());
    }

    /// Writers alternate between two values whose halves differ completely,
    /// so any torn read would show up as a third bit pattern.
    #[test]
    fn concurrent_loads_never_observe_torn_values() {
        let a = f64::from_bits(0x0000_0001_0000_0001);
        let b = f64::from_bits(0x4000_0000_4000_0000);
        let initial = 1.0;
        let cell = Arc::new(PriceCell::new(initial));

        let writers: Vec<_> = [a, b]
            .into_iter()
            .map(|v| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    for _ in 0..50_000 {
                        cell.store(v);
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..2)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    for _ in 0..50_000 {
                        let bits = cell.load().to_bits();
                        assert!(
                            bits == a.to_bits() || bits == b.to_bits() || bits == initial.to_bits(),
                            "torn read: {bits:#x}"
                        );
                    }
                })
            })
            .collect();

        for h in writers.into_iter().chain(readers) {
            h.join().unwrap();
        }
    }
}
