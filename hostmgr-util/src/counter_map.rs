// Copyright 2025 The Hostmgr Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Counter map keyed by an arbitrary tag.

use std::collections::HashMap;
use std::hash::Hash;

/// A map from keys to counts. Only keys that have been incremented appear
/// in the map, so callers get sparse tallies without zero entries.
#[derive(Debug, Clone)]
pub struct CounterMap<K: Eq + Hash> {
    counters: HashMap<K, u32>,
    total: u64,
}

impl<K: Eq + Hash> Default for CounterMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> CounterMap<K> {
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
            total: 0,
        }
    }

    /// Increment the count for a key. Returns the new count.
    pub fn increment(&mut self, key: K) -> u32 {
        self.total += 1;
        let count = self.counters.entry(key).or_insert(0);
        *count += 1;
        *count
    }

    /// Get the count for a key (0 if not present).
    pub fn get(&self, key: &K) -> u32 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u32)> {
        self.counters.iter().map(|(k, v)| (k, *v))
    }
}

impl<K: Eq + Hash> IntoIterator for CounterMap<K> {
    type Item = (K, u32);
    type IntoIter = std::collections::hash_map::IntoIter<K, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.counters.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment() {
        let mut map = CounterMap::new();
        assert_eq!(map.increment("a"), 1);
        assert_eq!(map.increment("a"), 2);
        assert_eq!(map.increment("b"), 1);
        assert_eq!(map.total(), 3);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_empty() {
        let map: CounterMap<&str> = CounterMap::new();
        assert!(map.is_empty());
        assert_eq!(map.total(), 0);
        assert_eq!(map.get(&"x"), 0);
    }

    #[test]
    fn test_into_iter_is_sparse() {
        let mut map = CounterMap::new();
        map.increment("seen");
        let collected: HashMap<&str, u32> = map.into_iter().collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[&"seen"], 1);
    }
}
