//! Identifiers for remote functions and calls

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a function owned by one realm
///
/// Minted from the function's debug name plus a per-simulator counter so the
/// id stays human-readable in traces while remaining unique within one
/// simulator instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FnId(String);

impl FnId {
    /// Creates a function id from a debug name and a mint counter
    ///
    /// Anonymous functions get the `<anonymous>` placeholder.
    pub fn mint(name: Option<&str>, counter: u64) -> Self {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => "<anonymous>",
        };
        Self(format!("{}_{}", name, counter))
    }

    /// Creates a function id from a raw string (e.g. decoded from the wire)
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fn({})", self.0)
    }
}

/// Identifier for one invocation of a remote function
///
/// Per-sender monotonically increasing; never reused while the sender's
/// subject is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(u64);

impl CallId {
    /// The first call id a fresh sender allocates
    pub fn first() -> Self {
        Self(1)
    }

    /// Creates a call id from a raw counter value
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the next call id in sequence
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw counter value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Call({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_id_mint_named() {
        let id = FnId::mint(Some("greet"), 3);
        assert_eq!(id.as_str(), "greet_3");
    }

    #[test]
    fn test_fn_id_mint_anonymous() {
        let id = FnId::mint(None, 1);
        assert_eq!(id.as_str(), "<anonymous>_1");

        let id = FnId::mint(Some(""), 2);
        assert_eq!(id.as_str(), "<anonymous>_2");
    }

    #[test]
    fn test_call_id_sequence() {
        let first = CallId::first();
        assert_eq!(first.as_u64(), 1);
        assert_eq!(first.next().as_u64(), 2);
        assert!(first < first.next());
    }

    #[test]
    fn test_fn_id_display() {
        let id = FnId::mint(Some("greet"), 1);
        assert_eq!(format!("{}", id), "Fn(greet_1)");
    }
}
