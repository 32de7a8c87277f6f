//! Identity-keyed associative storage.

use std::collections::HashMap;
use std::fmt;

use super::{Identified, IdentityToken};

/// A map whose keys are compared by identity, not by value equality.
///
/// Every operation resolves the key to its [`IdentityToken`] first, so two
/// distinct objects with identical content always occupy two distinct slots.
/// The map stores tokens only; it never keeps the key objects alive.
pub struct IdentityKeyedMap<V> {
    map: HashMap<IdentityToken, V>,
}

impl<V> IdentityKeyedMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Returns the value stored for `key`, if any.
    pub fn get<K: Identified + ?Sized>(&self, key: &K) -> Option<&V> {
        self.map.get(&key.identity())
    }

    /// Returns a mutable reference to the value stored for `key`, if any.
    pub fn get_mut<K: Identified + ?Sized>(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(&key.identity())
    }

    /// Stores `value` for `key`, returning the value it replaced.
    pub fn put<K: Identified + ?Sized>(&mut self, key: &K, value: V) -> Option<V> {
        self.map.insert(key.identity(), value)
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove<K: Identified + ?Sized>(&mut self, key: &K) -> Option<V> {
        self.map.remove(&key.identity())
    }

    /// Returns `true` if an entry exists for `key`.
    pub fn contains<K: Identified + ?Sized>(&self, key: &K) -> bool {
        self.map.contains_key(&key.identity())
    }

    /// Iterates over the identity tokens of all keys, in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &IdentityToken> {
        self.map.keys()
    }

    /// Iterates over all stored values, in arbitrary order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.map.values()
    }

    /// Calls `visitor` once per entry.
    pub fn visit(&self, mut visitor: impl FnMut(&IdentityToken, &V)) {
        for (token, value) in &self.map {
            visitor(token, value);
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<V> Default for IdentityKeyedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for IdentityKeyedMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}
