use thiserror::Error;

use crate::symbol::Symbol;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("seed list is empty; the store needs at least one symbol")]
    EmptySeed,

    #[error("symbol {0} appears more than once in the seed list")]
    DuplicateSymbol(Symbol),

    #[error("initial price {price} for {symbol} is not a finite number")]
    InvalidPrice { symbol: Symbol, price: f64 },

    #[error("invalid symbol {0:?}: must be non-empty and contain no whitespace")]
    InvalidSymbol(String),

    #[error("store has already been seeded")]
    AlreadySeeded,
}
