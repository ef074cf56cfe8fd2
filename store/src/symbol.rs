use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;

/// Immutable instrument identifier, e.g. `AAPL`.
///
/// Backed by a shared buffer so cloning a symbol into every batch is cheap.
/// Hashes exactly like the underlying `str`, which lets the map be queried
/// with a plain `&str`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, StoreError> {
        let raw = raw.as_ref();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return Err(StoreError::InvalidSymbol(raw.to_string()));
        }
        Ok(Self(Arc::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = StoreError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}
