//! A B-Tree map implementation.
//!
//! Values live next to their keys at every level. Inserts split full nodes
//! on the way down so the descent never has to back up; deletes borrow from
//! a sibling or merge with it on the way back up so every non-root node
//! keeps at least `ORDER / 2 - 1` keys.

use std::borrow::Borrow;

use log::debug;

use crate::btree_iter::Iter;
use crate::btree_node::Node;
use crate::container::OrderedContainer;

/// A B-Tree map with ordered keys. `ORDER` is the maximum number of
/// children per node and must be at least 4.
pub struct BTree<K, V, const ORDER: usize = 5> {
    root: Option<Box<Node<K, V, ORDER>>>,
    length: usize,
}

impl<K, V, const ORDER: usize> BTree<K, V, ORDER> {
    /// Creates a new empty BTree.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Node::<K, V, ORDER>::ORDER_OK;
        BTree {
            root: None,
            length: 0,
        }
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of levels; 0 for an empty tree.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            height += 1;
            current = node.child(0);
        }
        height
    }

    /// Iterates over the entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V, ORDER> {
        Iter::new(self.root.as_deref())
    }
}

impl<K, V, const ORDER: usize> Default for BTree<K, V, ORDER> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K, V, const ORDER: usize> IntoIterator for &'a BTree<K, V, ORDER> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, ORDER>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, const ORDER: usize> BTree<K, V, ORDER>
where
    K: Ord,
{
    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q: ?Sized + Ord>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match node.find_slot(key) {
                Ok(idx) => return Some(node.value(idx)),
                Err(idx) => current = node.child(idx),
            }
        }
        None
    }

    /// Inserts a key-value pair into the map.
    /// Returns the old value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.root.as_ref().map_or(false, |r| r.is_full()) {
            // Root split: the tree grows a level.
            let mut new_root = Box::new(Node::new());
            new_root.children[0] = self.root.take();
            new_root.split_child(0);
            self.root = Some(new_root);
            debug!("btree root split, height now {}", self.height());
        }

        let root = self.root.get_or_insert_with(|| Box::new(Node::new()));
        let old = Self::insert_non_full(root, key, value);
        if old.is_none() {
            self.length += 1;
        }
        old
    }

    fn insert_non_full(node: &mut Node<K, V, ORDER>, key: K, value: V) -> Option<V> {
        let mut idx = match node.find_slot(&key) {
            Ok(i) => return Some(node.replace_value(i, value)),
            Err(i) => i,
        };

        if node.child(idx).map_or(false, |c| c.is_full()) {
            node.split_child(idx);
            // The promoted median now sits at idx.
            match key.cmp(node.key(idx)) {
                std::cmp::Ordering::Equal => return Some(node.replace_value(idx, value)),
                std::cmp::Ordering::Greater => idx += 1,
                std::cmp::Ordering::Less => {}
            }
        }

        match node.children[idx].as_deref_mut() {
            Some(child) => Self::insert_non_full(child, key, value),
            None => {
                // Leaf
                node.insert_at(idx, key, value);
                None
            }
        }
    }

    /// Removes a key from the map, returning the value if it was present.
    pub fn remove<Q: ?Sized + Ord>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
    {
        let root = self.root.as_deref_mut()?;
        let ret = Self::remove_recursive(root, key);
        if ret.is_some() {
            self.length -= 1;
        }

        // Clean up root if empty
        if self.root.as_ref().map_or(false, |r| r.length == 0) {
            let old_root = self.root.take();
            self.root = old_root.and_then(|mut r| r.children[0].take());
            if self.root.is_some() {
                debug!("btree root collapsed, height now {}", self.height());
            }
        }
        ret
    }

    fn remove_recursive<Q: ?Sized + Ord>(node: &mut Node<K, V, ORDER>, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
    {
        match node.find_slot(key) {
            Ok(i) => match node.children[i + 1].as_deref_mut() {
                None => Some(node.remove_at(i).1),
                Some(right) => {
                    // Internal node: replace with successor
                    let (succ_k, succ_v) = Self::remove_smallest(right);
                    let (_, old_val) = node.replace_entry(i, succ_k, succ_v);
                    Self::fix_underflow(node, i + 1);
                    Some(old_val)
                }
            },
            Err(i) => {
                let child = node.children[i].as_deref_mut()?;
                let ret = Self::remove_recursive(child, key);
                if ret.is_some() {
                    Self::fix_underflow(node, i);
                }
                ret
            }
        }
    }

    fn remove_smallest(node: &mut Node<K, V, ORDER>) -> (K, V) {
        match node.children[0].as_deref_mut() {
            None => node.remove_at(0),
            Some(child) => {
                let ret = Self::remove_smallest(child);
                Self::fix_underflow(node, 0);
                ret
            }
        }
    }

    fn fix_underflow(node: &mut Node<K, V, ORDER>, child_idx: usize) {
        let min = Node::<K, V, ORDER>::MIN_KEYS;
        if node.child_len(child_idx) >= min {
            return;
        }

        // Try rotate from left sibling
        if child_idx > 0 && node.child_len(child_idx - 1) > min {
            node.rotate_right(child_idx);
            return;
        }

        // Try rotate from right sibling
        if child_idx < node.length && node.child_len(child_idx + 1) > min {
            node.rotate_left(child_idx);
            return;
        }

        // Merge with a sibling
        if child_idx > 0 {
            node.merge_children(child_idx - 1);
        } else {
            node.merge_children(child_idx);
        }
    }

    /// Returns every entry with `min <= key <= max` in ascending order.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if min <= max {
            if let Some(root) = self.root.as_deref() {
                Self::range_into(root, min, max, &mut out);
            }
        }
        out
    }

    fn range_into<'a>(
        node: &'a Node<K, V, ORDER>,
        min: &K,
        max: &K,
        out: &mut Vec<(&'a K, &'a V)>,
    ) {
        let start = match node.find_slot(min) {
            Ok(i) | Err(i) => i,
        };
        for i in start..=node.length {
            if let Some(child) = node.child(i) {
                Self::range_into(child, min, max, out);
            }
            if i < node.length {
                let k = node.key(i);
                if k > max {
                    return;
                }
                out.push((k, node.value(i)));
            }
        }
    }
}

impl<K: Ord, V, const ORDER: usize> OrderedContainer<K, V> for BTree<K, V, ORDER> {
    fn name(&self) -> &'static str {
        "B-tree"
    }

    fn len(&self) -> usize {
        self.length
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        BTree::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        BTree::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        for (k, v) in self.iter() {
            visitor(k, v);
        }
    }
}
