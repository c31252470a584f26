//! A skip list map with configurable promotion probability.
//!
//! Nodes live in a slab arena. Each node owns one forward link per level it
//! was promoted to; the header is the `head` array, which spans
//! `max_level` levels. A predecessor of `None` means the header.

use std::mem;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slab::Slab;

use crate::config::SkipListConfig;
use crate::container::OrderedContainer;
use crate::error::Result;

type NodeId = usize;

struct SkipNode<K, V> {
    key: K,
    value: V,
    forward: Vec<Option<NodeId>>,
}

/// An ordered map with expected `O(log n)` operations.
///
/// - `K`: Key type, must implement `Ord`
/// - `V`: Value type
/// - `R`: Source of randomness for level selection
pub struct SkipList<K, V, R = StdRng> {
    nodes: Slab<SkipNode<K, V>>,
    /// `head[i]` is the first node at level `i`.
    head: Vec<Option<NodeId>>,
    /// Number of levels in use, at least 1.
    level: usize,
    length: usize,
    probability: f64,
    rng: R,
}

impl<K, V> SkipList<K, V, StdRng> {
    /// Creates an empty skip list with the default configuration and an
    /// entropy-seeded generator.
    pub fn new() -> Self {
        let config = SkipListConfig::default();
        Self::build(config, StdRng::from_entropy())
    }

    /// Creates an empty skip list with an entropy-seeded generator.
    pub fn try_with_config(config: SkipListConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, StdRng::from_entropy()))
    }
}

impl<K, V> Default for SkipList<K, V, StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, R> SkipList<K, V, R> {
    /// Creates an empty skip list that draws levels from `rng`.
    pub fn with_rng(config: SkipListConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: SkipListConfig, rng: R) -> Self {
        SkipList {
            nodes: Slab::new(),
            head: vec![None; config.max_level],
            level: 1,
            length: 0,
            probability: config.probability,
            rng,
        }
    }

    /// Returns the number of elements in the list.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the list contains no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of levels currently in use.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Highest level a node may reach.
    pub fn max_level(&self) -> usize {
        self.head.len()
    }

    fn next_of(&self, pred: Option<NodeId>, level: usize) -> Option<NodeId> {
        match pred {
            None => self.head[level],
            Some(id) => self.nodes[id].forward[level],
        }
    }

    fn set_next(&mut self, pred: Option<NodeId>, level: usize, target: Option<NodeId>) {
        match pred {
            None => self.head[level] = target,
            Some(id) => self.nodes[id].forward[level] = target,
        }
    }

    /// Calls `f` for every entry in ascending key order.
    pub fn traverse<F: FnMut(&K, &V)>(&self, mut f: F) {
        let mut cur = self.head[0];
        while let Some(id) = cur {
            let node = &self.nodes[id];
            f(&node.key, &node.value);
            cur = node.forward[0];
        }
    }
}

impl<K: Ord, V, R: Rng> SkipList<K, V, R> {
    /// Flips coins until one fails or `max_level` is reached.
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level() && self.rng.gen_bool(self.probability) {
            level += 1;
        }
        level
    }

    /// Last node with a key below `key` on every level in use.
    fn predecessors(&self, key: &K) -> Vec<Option<NodeId>> {
        let mut update = vec![None; self.max_level()];
        let mut pred = None;
        for level in (0..self.level).rev() {
            while let Some(next) = self.next_of(pred, level) {
                if self.nodes[next].key < *key {
                    pred = Some(next);
                } else {
                    break;
                }
            }
            update[level] = pred;
        }
        update
    }

    /// First node with a key `>= key`.
    fn lower_bound(&self, key: &K) -> Option<NodeId> {
        let mut pred = None;
        for level in (0..self.level).rev() {
            while let Some(next) = self.next_of(pred, level) {
                if self.nodes[next].key < *key {
                    pred = Some(next);
                } else {
                    break;
                }
            }
        }
        self.next_of(pred, 0)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let node = &self.nodes[self.lower_bound(key)?];
        (node.key == *key).then_some(&node.value)
    }

    /// Inserts a key-value pair, returning the old value if the key was
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let update = self.predecessors(&key);
        if let Some(id) = self.next_of(update[0], 0) {
            let node = &mut self.nodes[id];
            if node.key == key {
                return Some(mem::replace(&mut node.value, value));
            }
        }

        let height = self.random_level();
        if height > self.level {
            // Levels above the old top have the header as predecessor,
            // which `update` already holds as None.
            debug!("skip list level {} -> {}", self.level, height);
            self.level = height;
        }

        let forward = (0..height).map(|l| self.next_of(update[l], l)).collect();
        let id = self.nodes.insert(SkipNode {
            key,
            value,
            forward,
        });
        for (level, &pred) in update.iter().enumerate().take(height) {
            self.set_next(pred, level, Some(id));
        }
        self.length += 1;
        None
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let update = self.predecessors(key);
        let id = match self.next_of(update[0], 0) {
            Some(id) if self.nodes[id].key == *key => id,
            _ => return None,
        };

        let node = self.nodes.remove(id);
        for (level, &next) in node.forward.iter().enumerate() {
            self.set_next(update[level], level, next);
        }
        self.length -= 1;

        let old_level = self.level;
        while self.level > 1 && self.head[self.level - 1].is_none() {
            self.level -= 1;
        }
        if self.level != old_level {
            debug!("skip list level {} -> {}", old_level, self.level);
        }
        Some(node.value)
    }

    /// Returns every entry with `min <= key <= max` in ascending order.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if min > max {
            return out;
        }
        let mut cur = self.lower_bound(min);
        while let Some(id) = cur {
            let node = &self.nodes[id];
            if node.key > *max {
                break;
            }
            out.push((&node.key, &node.value));
            cur = node.forward[0];
        }
        out
    }
}

impl<K: Ord, V, R: Rng> OrderedContainer<K, V> for SkipList<K, V, R> {
    fn name(&self) -> &'static str {
        "skip list"
    }

    fn len(&self) -> usize {
        self.length
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        SkipList::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        SkipList::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        SkipList::traverse(self, visitor)
    }
}
