//! Interned identifiers for member, variable, and signal names.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name: a member, a parameter, a local variable, a label.
///
/// Stored as a `u32` key into an [`Interner`], so copies are free and
/// equality is a single integer comparison. Ordering follows interning order,
/// which keeps ordered maps keyed by `Ident` deterministic within a session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw key.
    ///
    /// Meant for deserialization and tests; normal code interns through
    /// [`Interner::get_or_intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw key of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32`, which always fits a `usize` on the 32-bit and
// 64-bit targets we build for. `try_from_usize` rejects keys above `u32::MAX`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// One interner lives for a whole transformation session. Members are
/// lowered on a thread pool, so interning must work through `&self`.
#[derive(Debug)]
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a string and returns its [`Ident`], reusing an existing key
    /// when the string was seen before.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its string.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// Returns every interned string in key order.
    ///
    /// Position `i` of the result is the string behind `Ident::from_raw(i)`.
    pub fn strings(&self) -> Vec<String> {
        (0..self.len() as u32)
            .map(|raw| self.resolve(Ident(raw)).to_string())
            .collect()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_names_resolve() {
        let interner = Interner::new();
        let id = interner.get_or_intern("Primes::IsPrime");
        assert_eq!(interner.resolve(id), "Primes::IsPrime");
    }

    #[test]
    fn reinterning_returns_same_key() {
        let interner = Interner::new();
        let a = interner.get_or_intern("divisor");
        let b = interner.get_or_intern("divisor");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn get_does_not_intern() {
        let interner = Interner::new();
        assert!(interner.get("missing").is_none());
        assert!(interner.is_empty());
        let id = interner.get_or_intern("present");
        assert_eq!(interner.get("present"), Some(id));
    }

    #[test]
    fn strings_follow_key_order() {
        let interner = Interner::new();
        let a = interner.get_or_intern("a");
        let b = interner.get_or_intern("b");
        let strings = interner.strings();
        assert_eq!(strings[a.as_raw() as usize], "a");
        assert_eq!(strings[b.as_raw() as usize], "b");
    }

    #[test]
    fn ordering_follows_interning_order() {
        let interner = Interner::new();
        let first = interner.get_or_intern("zeta");
        let second = interner.get_or_intern("alpha");
        assert!(first < second);
    }

    #[test]
    fn serde_roundtrip() {
        let id = Ident(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
