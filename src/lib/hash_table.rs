//! A separately chained hash table.
//!
//! Keys carry no intrinsic order here, so `range` and `traverse` gather
//! every entry and sort before returning.

use std::mem;

use log::debug;

use crate::config::HashTableConfig;
use crate::container::OrderedContainer;
use crate::error::Result;
use crate::key::BucketHash;

/// Hash map with chained buckets that doubles its bucket array when the
/// load factor would be reached.
pub struct HashTable<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    length: usize,
    load_factor: f64,
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<Vec<(K, V)>> {
    (0..capacity).map(|_| Vec::new()).collect()
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table with 16 buckets and a 0.75 load factor.
    pub fn new() -> Self {
        Self::build(HashTableConfig::default())
    }

    /// Creates an empty table after validating `config`.
    pub fn try_with_config(config: HashTableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: HashTableConfig) -> Self {
        HashTable {
            buckets: empty_buckets(config.initial_capacity),
            length: 0,
            load_factor: config.load_factor,
        }
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Growth threshold for `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: BucketHash + Ord, V> HashTable<K, V> {
    fn bucket_of(&self, key: &K) -> usize {
        key.bucket(self.buckets.len())
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Inserts a key-value pair, returning the old value if the key was
    /// already present. Growth is only considered for new keys.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let idx = self.bucket_of(&key);
        if let Some((_, slot)) = self.buckets[idx].iter_mut().find(|(k, _)| *k == key) {
            return Some(mem::replace(slot, value));
        }

        let mut capacity = self.buckets.len();
        while (self.length + 1) as f64 >= self.load_factor * capacity as f64 {
            capacity *= 2;
        }
        if capacity != self.buckets.len() {
            self.resize(capacity);
        }

        let idx = self.bucket_of(&key);
        self.buckets[idx].push((key, value));
        self.length += 1;
        None
    }

    fn resize(&mut self, capacity: usize) {
        debug!(
            "hash table grows {} -> {} buckets at {} entries",
            self.buckets.len(),
            capacity,
            self.length
        );
        let old = mem::replace(&mut self.buckets, empty_buckets(capacity));
        for (k, v) in old.into_iter().flatten() {
            let idx = k.bucket(capacity);
            self.buckets[idx].push((k, v));
        }
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.bucket_of(key);
        let bucket = &mut self.buckets[idx];
        let pos = bucket.iter().position(|(k, _)| k == key)?;
        self.length -= 1;
        Some(bucket.swap_remove(pos).1)
    }

    fn sorted_entries(&self) -> Vec<(&K, &V)> {
        let mut all: Vec<(&K, &V)> = self
            .buckets
            .iter()
            .flatten()
            .map(|(k, v)| (k, v))
            .collect();
        all.sort_unstable_by(|a, b| a.0.cmp(b.0));
        all
    }

    /// Returns every entry with `min <= key <= max`, sorted by key.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        let mut out: Vec<(&K, &V)> = self
            .buckets
            .iter()
            .flatten()
            .filter(|(k, _)| min <= k && k <= max)
            .map(|(k, v)| (k, v))
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Calls `f` for every entry in ascending key order.
    pub fn traverse<F: FnMut(&K, &V)>(&self, mut f: F) {
        for (k, v) in self.sorted_entries() {
            f(k, v);
        }
    }
}

impl<K: BucketHash + Ord, V> OrderedContainer<K, V> for HashTable<K, V> {
    fn name(&self) -> &'static str {
        "hash table"
    }

    fn len(&self) -> usize {
        self.length
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        HashTable::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        HashTable::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        HashTable::traverse(self, visitor)
    }
}
