//! In-memory price store.
//!
//! A [`ConcurrentPriceMap`] maps [`Symbol`]s to independently synchronised
//! [`PriceCell`]s. Lookups and updates only ever take a shared lock on one
//! shard, so readers and writers of different keys never wait on each other.

pub mod cell;
pub mod error;
pub mod map;
pub mod symbol;

pub use cell::PriceCell;
pub use error::StoreError;
pub use map::{CellHandle, ConcurrentPriceMap};
pub use symbol::Symbol;
