//! The contract every container satisfies, and a factory over all of them.

use std::fmt;
use std::str::FromStr;

use crate::bplus_tree::BPlusTree;
use crate::btree_map::BTree;
use crate::config::ContainerConfig;
use crate::error::{ContainerError, Result};
use crate::key::BucketHash;
use crate::{AvlTree, Bst, HashTable, RbTree, SkipList, SortedArray};

/// Insert/search/delete/range/traverse over unique keys.
///
/// A container is single threaded; callers wanting parallelism give each
/// worker its own instance. `range` and `traverse` produce the whole result
/// before returning.
pub trait OrderedContainer<K, V> {
    /// Short human readable name used in logs.
    fn name(&self) -> &'static str;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Returns true if the container holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `key` or replaces its value. Returns true if a new entry was
    /// created, false if an existing value was overwritten.
    fn insert(&mut self, key: K, value: V) -> bool;

    /// Returns the value stored for `key`.
    fn search(&self, key: &K) -> Option<&V>;

    /// Removes `key`. Returns false if it was not present.
    fn delete(&mut self, key: &K) -> bool;

    /// All entries with `min <= key <= max`, ascending.
    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)>;

    /// Calls `visitor` once per entry in ascending key order.
    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V));

    /// Returns true if `key` is present.
    fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Exports every entry in ascending order. Inserting the result into an
    /// empty container of any kind reproduces the same contents.
    fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        self.traverse(&mut |k, v| out.push((k.clone(), v.clone())));
        out
    }
}

/// The structures this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// [`RbTree`]
    RedBlackTree,
    /// [`AvlTree`]
    AvlTree,
    /// [`Bst`]
    Bst,
    /// [`BTree`]
    BTree,
    /// [`BPlusTree`]
    BPlusTree,
    /// [`SkipList`]
    SkipList,
    /// [`HashTable`]
    HashTable,
    /// [`SortedArray`]
    SortedArray,
}

impl ContainerKind {
    /// Every kind, in a stable order.
    pub const ALL: [ContainerKind; 8] = [
        ContainerKind::RedBlackTree,
        ContainerKind::AvlTree,
        ContainerKind::Bst,
        ContainerKind::BTree,
        ContainerKind::BPlusTree,
        ContainerKind::SkipList,
        ContainerKind::HashTable,
        ContainerKind::SortedArray,
    ];

    /// The name accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::RedBlackTree => "rbtree",
            ContainerKind::AvlTree => "avl",
            ContainerKind::Bst => "bst",
            ContainerKind::BTree => "btree",
            ContainerKind::BPlusTree => "bplustree",
            ContainerKind::SkipList => "skiplist",
            ContainerKind::HashTable => "hashtable",
            ContainerKind::SortedArray => "sortedarray",
        }
    }

    /// Builds an empty container of this kind.
    ///
    /// B-Tree and B+-Tree use their default order. Every kind can be built,
    /// so the key must also be [`BucketHash`] for the hash table; use a
    /// structure's own constructor for an `Ord` key without one.
    pub fn build<K, V>(self, config: &ContainerConfig) -> Result<Box<dyn OrderedContainer<K, V>>>
    where
        K: Ord + Clone + BucketHash + 'static,
        V: 'static,
    {
        config.validate()?;
        let container: Box<dyn OrderedContainer<K, V>> = match self {
            ContainerKind::RedBlackTree => Box::new(RbTree::new()),
            ContainerKind::AvlTree => Box::new(AvlTree::new()),
            ContainerKind::Bst => Box::new(Bst::new()),
            ContainerKind::BTree => {
                let tree: BTree<K, V> = BTree::new();
                Box::new(tree)
            }
            ContainerKind::BPlusTree => {
                let tree: BPlusTree<K, V> = BPlusTree::new();
                Box::new(tree)
            }
            ContainerKind::SkipList => Box::new(SkipList::try_with_config(config.skip_list)?),
            ContainerKind::HashTable => Box::new(HashTable::try_with_config(config.hash_table)?),
            ContainerKind::SortedArray => Box::new(SortedArray::new()),
        };
        Ok(container)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerKind {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.to_ascii_lowercase();
        ContainerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| ContainerError::UnknownKind(s.to_string()))
    }
}
