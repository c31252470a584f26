//! Sorted vector baseline: binary search to locate, shift to insert or
//! remove.

use std::mem;

use crate::container::OrderedContainer;

/// Entries kept contiguous and sorted by key.
pub struct SortedArray<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> SortedArray<K, V> {
    /// Creates an empty array.
    pub fn new() -> Self {
        SortedArray {
            entries: Vec::new(),
        }
    }

    /// Returns the number of elements in the array.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the array contains no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Calls `f` for every entry in ascending key order.
    pub fn traverse<F: FnMut(&K, &V)>(&self, mut f: F) {
        for (k, v) in &self.entries {
            f(k, v);
        }
    }
}

impl<K, V> Default for SortedArray<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> SortedArray<K, V> {
    fn find(&self, key: &K) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.cmp(key))
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let idx = self.find(key).ok()?;
        Some(&self.entries[idx].1)
    }

    /// Inserts a key-value pair, returning the old value if the key was
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.find(&key) {
            Ok(idx) => Some(mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (key, value));
                None
            }
        }
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.find(key).ok()?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns every entry with `min <= key <= max` in ascending order.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        if min > max {
            return Vec::new();
        }
        let lo = self.entries.partition_point(|(k, _)| k < min);
        let hi = self.entries.partition_point(|(k, _)| k <= max);
        self.entries[lo..hi].iter().map(|(k, v)| (k, v)).collect()
    }
}

impl<K: Ord, V> OrderedContainer<K, V> for SortedArray<K, V> {
    fn name(&self) -> &'static str {
        "sorted array"
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        SortedArray::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        SortedArray::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        SortedArray::traverse(self, visitor)
    }
}
