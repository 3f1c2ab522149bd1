//! The persistent binding environment.
//!
//! A thin wrapper around the `im` crate's persistent hash map, keyed by
//! term values ([`Var`]s and whole references) with structural equality.
//! Every mutation returns a new environment; parents are never touched,
//! so each derivation of the proof search owns an O(1) copy.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::BuildHasherDefault;

use crate::value::Value;

// A fixed-seed hasher keeps hashing and iteration order stable across
// runs (determinism requirement of the evaluator).
type Map = im::HashMap<Value, Value, BuildHasherDefault<DefaultHasher>>;

/// Persistent map from term value to bound value.
///
/// Cloning is O(1); `put` and `update` return new maps sharing structure
/// with the original.
#[derive(Clone, Default)]
pub struct Bindings(Map);

impl Bindings {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up the binding for `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a new environment with `key` bound to `value`.
    #[must_use]
    pub fn put(&self, key: Value, value: Value) -> Self {
        Self(self.0.update(key, value))
    }

    /// Returns a new environment merging `other` into this one.
    ///
    /// Entries in `other` win on collision.
    #[must_use]
    pub fn update(&self, other: &Self) -> Self {
        Self(other.0.clone().union(self.0.clone()))
    }

    /// Returns an iterator over the bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.0.iter()
    }
}

impl PartialEq for Bindings {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Bindings {}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}
