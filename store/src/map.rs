use std::collections::hash_map::{Entry, RandomState};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::cell::PriceCell;
use crate::error::StoreError;
use crate::symbol::Symbol;

/// Shared handle to a cell owned by the map.
///
/// The same cell is returned for a symbol for the lifetime of the map, even
/// when the owning shard rehashes.
pub type CellHandle = Arc<PriceCell>;

const SHARDS_PER_THREAD: usize = 4;

struct Slot {
    /// Global insertion sequence, used to report keys in seed order.
    seq: u64,
    cell: CellHandle,
}

/// Cache-line aligned so neighbouring shard locks do not false-share.
#[repr(align(64))]
#[derive(Default)]
struct Shard {
    entries: RwLock<HashMap<Symbol, Slot>>,
}

/// Sharded symbol → price map.
///
/// Access discipline:
/// - `find`, `get`, `update` take a shared lock on a single shard, so they
///   never wait for each other, whatever keys they touch.
/// - `insert` takes one shard's exclusive lock for the duration of a hash map
///   insert; operations on other shards are unaffected.
/// - While an `insert` holds that lock, `find` on other keys of the same
///   shard waits for it.
/// - `seed` requires `&mut self` and therefore runs before the map is shared.
///
/// Entries are never removed.
pub struct ConcurrentPriceMap {
    shards: Box<[Shard]>,
    hasher: RandomState,
    len: AtomicUsize,
    next_seq: AtomicU64,
    seeded: bool,
}

impl ConcurrentPriceMap {
    /// Empty map sized from the available hardware parallelism.
    pub fn new() -> Self {
        let threads = thread::available_parallelism().map_or(1, |n| n.get());
        Self::with_shards(threads * SHARDS_PER_THREAD)
    }

    /// Empty map with `shards` rounded up to a power of two (minimum 1).
    pub fn with_shards(shards: usize) -> Self {
        let n = shards.max(1).next_power_of_two();
        Self {
            shards: (0..n).map(|_| Shard::default()).collect(),
            hasher: RandomState::new(),
            len: AtomicUsize::new(0),
            next_seq: AtomicU64::new(0),
            seeded: false,
        }
    }

    /// `new()` followed by `seed(entries)`.
    pub fn seeded<I, S>(entries: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        map.seed(entries)?;
        Ok(map)
    }

    /// Establish the initial key set and prices.
    ///
    /// The whole list is validated before anything is inserted, so on error
    /// the map is left untouched. May only be called once.
    #[instrument(skip(self, entries), target = "store")]
    pub fn seed<I, S>(&mut self, entries: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        if self.seeded {
            return Err(StoreError::AlreadySeeded);
        }

        let mut validated = Vec::new();
        let mut seen = HashSet::new();
        for (raw, price) in entries {
            let symbol = Symbol::new(raw)?;
            if !price.is_finite() {
                return Err(StoreError::InvalidPrice { symbol, price });
            }
            if !seen.insert(symbol.clone()) {
                return Err(StoreError::DuplicateSymbol(symbol));
            }
            validated.push((symbol, price));
        }

        if validated.is_empty() {
            return Err(StoreError::EmptySeed);
        }

        let count = validated.len();
        for (symbol, price) in validated {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let idx = self.shard_index(symbol.as_str());
            let shard = self.shards[idx].entries.get_mut();
            if let Entry::Vacant(v) = shard.entry(symbol) {
                v.insert(Slot {
                    seq,
                    cell: Arc::new(PriceCell::new(price)),
                });
                *self.len.get_mut() += 1;
            }
        }
        self.seeded = true;

        info!(count, shards = self.shards.len(), "price store seeded");
        Ok(())
    }

    /// Handle to the symbol's cell, or `None` when the symbol is unknown.
    pub fn find(&self, symbol: &str) -> Option<CellHandle> {
        self.shard(symbol)
            .entries
            .read()
            .get(symbol)
            .map(|slot| Arc::clone(&slot.cell))
    }

    /// Current price of `symbol`, if known.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.shard(symbol)
            .entries
            .read()
            .get(symbol)
            .map(|slot| slot.cell.load())
    }

    /// Store `price` into an existing symbol's cell.
    ///
    /// Returns `false` and does nothing for unknown symbols; update never
    /// inserts.
    pub fn update(&self, symbol: &str, price: f64) -> bool {
        match self.shard(symbol).entries.read().get(symbol) {
            Some(slot) => {
                slot.cell.store(price);
                true
            }
            None => false,
        }
    }

    /// Add a symbol after seeding.
    ///
    /// Returns `false` and leaves the existing cell untouched when the
    /// symbol is already present.
    pub fn insert(&self, symbol: Symbol, price: f64) -> bool {
        let mut entries = self.shard(symbol.as_str()).entries.write();
        match entries.entry(symbol) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                debug!(target: "store", symbol = %v.key(), price, "symbol inserted");
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                v.insert(Slot {
                    seq,
                    cell: Arc::new(PriceCell::new(price)),
                });
                self.len.fetch_add(1, Ordering::Release);
                true
            }
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.shard(symbol).entries.read().contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Known symbols in insertion order (seeded symbols first, in seed order).
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut keyed = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            let entries = shard.entries.read();
            keyed.extend(entries.iter().map(|(s, slot)| (slot.seq, s.clone())));
        }
        keyed.sort_unstable_by_key(|(seq, _)| *seq);
        keyed.into_iter().map(|(_, s)| s).collect()
    }

    /// Current price of every symbol, in insertion order.
    ///
    /// Each price is an independent load; there is no cross-key atomicity.
    pub fn snapshot(&self) -> Vec<(Symbol, f64)> {
        let mut keyed = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            let entries = shard.entries.read();
            keyed.extend(
                entries
                    .iter()
                    .map(|(s, slot)| (slot.seq, s.clone(), Arc::clone(&slot.cell))),
            );
        }
        keyed.sort_unstable_by_key(|(seq, _, _)| *seq);
        keyed
            .into_iter()
            .map(|(_, s, cell)| (s, cell.load()))
            .collect()
    }

    fn shard(&self, symbol: &str) -> &Shard {
        &self.shards[self.shard_index(symbol)]
    }

    fn shard_index(&self, symbol: &str) -> usize {
        // shard count is a power of two
        (self.hasher.hash_one(symbol) as usize) & (self.shards.len() - 1)
    }
}

impl Default for ConcurrentPriceMap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConcurrentPriceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentPriceMap")
            .field("len", &self.len())
            .field("shards", &self.shards.len())
            .field("seeded", &self.seeded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_seed() -> Vec<(&'static str, f64)> {
        vec![
            ("AAPL", 150.0),
            ("GOOGL", 2800.0),
            ("AMZN", 3400.0),
            ("MSFT", 299.0),
            ("TSLA", 720.0),
        ]
    }

    #[test]
    fn seed_then_find_returns_initial_prices() {
        let map = ConcurrentPriceMap::seeded(reference_seed()).unwrap();

        assert_eq!(map.len(), 5);
        for (symbol, price) in reference_seed() {
            assert_eq!(map.find(symbol).map(|c| c.load()), Some(price));
        }
        assert!(map.find("NFLX").is_none());
    }

    #[test]
    fn symbols_keep_seed_order() {
        let map = ConcurrentPriceMap::seeded(reference_seed()).unwrap();
        let names: Vec<String> = map.symbols().iter().map(|s| s.to_string()).collect();

        assert_eq!(names, ["AAPL", "GOOGL", "AMZN", "MSFT", "TSLA"]);
    }

    #[test]
    fn update_unknown_symbol_is_a_no_op() {
        let map = ConcurrentPriceMap::seeded(reference_seed()).unwrap();
        let before = map.snapshot();

        assert!(!map.update("UNKNOWN", 1.0));
        assert!(!map.contains("UNKNOWN"));
        assert_eq!(map.snapshot(), before);
    }

    #[test]
    fn update_stores_into_existing_cell() {
        let map = ConcurrentPriceMap::seeded(reference_seed()).unwrap();
        let handle = map.find("MSFT").unwrap();

        assert!(map.update("MSFT", 301.5));
        assert_eq!(handle.load(), 301.5);
        assert_eq!(map.get("MSFT"), Some(301.5));
    }

    #[test]
    fn find_returns_the_same_cell_across_rehashing() {
        // Single shard so every insert lands in (and grows) the same table.
        let map = ConcurrentPriceMap::with_shards(1);
        assert!(map.insert(Symbol::new("AAPL").unwrap(), 150.0));
        let first = map.find("AAPL").unwrap();

        for i in 0..1_000 {
            map.insert(Symbol::new(format!("SYM{i}")).unwrap(), i as f64);
        }

        let again = map.find("AAPL").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn seed_rejects_misconfiguration_without_side_effects() {
        let mut map = ConcurrentPriceMap::with_shards(4);

        let empty: Vec<(&str, f64)> = vec![];
        assert_eq!(map.seed(empty), Err(StoreError::EmptySeed));

        let dup = vec![("AAPL", 1.0), ("MSFT", 2.0), ("AAPL", 3.0)];
        assert_eq!(
            map.seed(dup),
            Err(StoreError::DuplicateSymbol(Symbol::new("AAPL").unwrap()))
        );

        assert!(matches!(
            map.seed(vec![("AAPL", f64::NAN)]),
            Err(StoreError::InvalidPrice { .. })
        ));
        assert!(matches!(
            map.seed(vec![("", 1.0)]),
            Err(StoreError::InvalidSymbol(_))
        ));

        assert!(map.is_empty());

        map.seed(reference_seed()).unwrap();
        assert_eq!(map.seed(reference_seed()), Err(StoreError::AlreadySeeded));
    }

    #[test]
    fn insert_never_overwrites() {
        let map = ConcurrentPriceMap::seeded(reference_seed()).unwrap();

        assert!(!map.insert(Symbol::new("AAPL").unwrap(), 1.0));
        assert_eq!(map.get("AAPL"), Some(150.0));

        assert!(map.insert(Symbol::new("NVDA").unwrap(), 480.0));
        assert_eq!(map.get("NVDA"), Some(480.0));
        assert_eq!(map.len(), 6);
        assert_eq!(map.symbols().last().map(|s| s.as_str()), Some("NVDA"));
    }

    #[test]
    fn shard_count_is_a_power_of_two() {
        assert_eq!(ConcurrentPriceMap::with_shards(0).shard_count(), 1);
        assert_eq!(ConcurrentPriceMap::with_shards(5).shard_count(), 8);
        assert!(ConcurrentPriceMap::new().shard_count().is_power_of_two());
    }
}
