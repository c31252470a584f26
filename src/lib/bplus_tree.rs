//! A B+-Tree map.
//!
//! Values are stored only in leaves. Internal nodes hold separator keys: a
//! key `k` routes to the first child whose separator is greater than `k`,
//! so every key in `children[i + 1]` is `>= keys[i]`. Leaves are chained
//! through `next` in key order, which lets a range scan descend once and
//! then walk sideways.
//!
//! Nodes live in a slab arena and refer to each other by id. The tree owns
//! every node; a leaf's `next` id is a traversal link only.

use std::mem;

use log::debug;
use slab::Slab;

use crate::container::OrderedContainer;

type NodeId = usize;

struct Leaf<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    next: Option<NodeId>,
}

struct Internal<K> {
    keys: Vec<K>,
    children: Vec<NodeId>,
}

enum Node<K, V> {
    Leaf(Leaf<K, V>),
    Internal(Internal<K>),
}

impl<K, V> Node<K, V> {
    fn key_count(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.keys.len(),
            Node::Internal(n) => n.keys.len(),
        }
    }
}

/// Index of the child that may hold `key`: the number of separators
/// that are `<= key`.
fn child_index<K: Ord>(keys: &[K], key: &K) -> usize {
    keys.partition_point(|k| k <= key)
}

/// A B+-Tree map with ordered keys. `ORDER` is the maximum number of
/// children per internal node and must be at least 4.
pub struct BPlusTree<K, V, const ORDER: usize = 5> {
    nodes: Slab<Node<K, V>>,
    root: NodeId,
    length: usize,
}

// Root-to-leaf descents made on this thread.
#[cfg(test)]
thread_local! {
    static DESCENTS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

impl<K, V, const ORDER: usize> BPlusTree<K, V, ORDER> {
    const MAX_KEYS: usize = ORDER - 1;
    // Smaller halves of a leaf split and an internal split respectively.
    const LEAF_MIN_KEYS: usize = (ORDER - 1) / 2;
    const INTERNAL_MIN_KEYS: usize = ORDER / 2 - 1;
    const ORDER_OK: () = assert!(ORDER >= 4, "B+-Tree order must be at least 4");

    /// Creates a new empty tree.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::ORDER_OK;
        let mut nodes = Slab::new();
        let root = nodes.insert(Self::empty_leaf());
        BPlusTree {
            nodes,
            root,
            length: 0,
        }
    }

    fn empty_leaf() -> Node<K, V> {
        Node::Leaf(Leaf {
            keys: Vec::with_capacity(ORDER),
            values: Vec::with_capacity(ORDER),
            next: None,
        })
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of levels, counting the root leaf of an empty tree as one.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut id = self.root;
        while let Node::Internal(n) = &self.nodes[id] {
            height += 1;
            id = n.children[0];
        }
        height
    }

    fn children_of(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id] {
            Node::Internal(n) => &n.children,
            Node::Leaf(_) => &[],
        }
    }

    fn min_keys(&self, id: NodeId) -> usize {
        match &self.nodes[id] {
            Node::Leaf(_) => Self::LEAF_MIN_KEYS,
            Node::Internal(_) => Self::INTERNAL_MIN_KEYS,
        }
    }

    fn leftmost_leaf(&self) -> &Leaf<K, V> {
        let mut id = self.root;
        loop {
            match &self.nodes[id] {
                Node::Leaf(leaf) => return leaf,
                Node::Internal(n) => id = n.children[0],
            }
        }
    }

    /// Calls `f` for every entry in ascending key order by walking the leaf
    /// chain.
    pub fn traverse<F: FnMut(&K, &V)>(&self, mut f: F) {
        let mut leaf = self.leftmost_leaf();
        loop {
            for (k, v) in leaf.keys.iter().zip(&leaf.values) {
                f(k, v);
            }
            match leaf.next.map(|id| &self.nodes[id]) {
                Some(Node::Leaf(next)) => leaf = next,
                _ => break,
            }
        }
    }
}

impl<K, V, const ORDER: usize> Default for BPlusTree<K, V, ORDER> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V, const ORDER: usize> BPlusTree<K, V, ORDER> {
    /// Descends from the root to the leaf whose key range covers `key`.
    fn find_leaf(&self, key: &K) -> &Leaf<K, V> {
        #[cfg(test)]
        DESCENTS.with(|d| d.set(d.get() + 1));
        let mut id = self.root;
        loop {
            match &self.nodes[id] {
                Node::Leaf(leaf) => return leaf,
                Node::Internal(n) => id = n.children[child_index(&n.keys, key)],
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let leaf = self.find_leaf(key);
        let idx = leaf.keys.binary_search(key).ok()?;
        Some(&leaf.values[idx])
    }

    /// Inserts a key-value pair into the tree.
    /// Returns the old value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.nodes[self.root].key_count() >= Self::MAX_KEYS {
            let old_root = self.root;
            let mut children = Vec::with_capacity(ORDER);
            children.push(old_root);
            self.root = self.nodes.insert(Node::Internal(Internal {
                keys: Vec::with_capacity(ORDER),
                children,
            }));
            self.split_child(self.root, 0);
            debug!("bplus tree root split, height now {}", self.height());
        }

        let mut id = self.root;
        loop {
            let (mut idx, child) = match &mut self.nodes[id] {
                Node::Leaf(leaf) => {
                    let old = match leaf.keys.binary_search(&key) {
                        Ok(i) => Some(mem::replace(&mut leaf.values[i], value)),
                        Err(i) => {
                            leaf.keys.insert(i, key);
                            leaf.values.insert(i, value);
                            None
                        }
                    };
                    if old.is_none() {
                        self.length += 1;
                    }
                    return old;
                }
                Node::Internal(n) => {
                    let idx = child_index(&n.keys, &key);
                    (idx, n.children[idx])
                }
            };

            if self.nodes[child].key_count() >= Self::MAX_KEYS {
                self.split_child(id, idx);
                // The new separator sits at idx; keys equal to it go right.
                if let Node::Internal(n) = &self.nodes[id] {
                    if key >= n.keys[idx] {
                        idx += 1;
                    }
                }
            }
            id = self.children_of(id)[idx];
        }
    }

    /// Splits the full child at `idx` of internal node `parent`.
    ///
    /// A leaf keeps its lower half and the right leaf's first key is copied
    /// up as the separator. An internal node moves its median key up.
    fn split_child(&mut self, parent: NodeId, idx: usize) {
        let child = self.children_of(parent)[idx];
        let (sep, right) = match &mut self.nodes[child] {
            Node::Leaf(leaf) => {
                let mid = leaf.keys.len() / 2;
                let mut keys = Vec::with_capacity(ORDER);
                keys.extend(leaf.keys.drain(mid..));
                let mut values = Vec::with_capacity(ORDER);
                values.extend(leaf.values.drain(mid..));
                let sep = keys[0].clone();
                let right = Leaf {
                    keys,
                    values,
                    next: leaf.next,
                };
                (sep, Node::Leaf(right))
            }
            Node::Internal(n) => {
                let mid = n.keys.len() / 2;
                let sep = n.keys.remove(mid);
                let mut keys = Vec::with_capacity(ORDER);
                keys.extend(n.keys.drain(mid..));
                let mut children = Vec::with_capacity(ORDER);
                children.extend(n.children.drain(mid + 1..));
                (sep, Node::Internal(Internal { keys, children }))
            }
        };
        let right_id = self.nodes.insert(right);
        if let Node::Leaf(leaf) = &mut self.nodes[child] {
            leaf.next = Some(right_id);
        }
        if let Node::Internal(p) = &mut self.nodes[parent] {
            p.keys.insert(idx, sep);
            p.children.insert(idx + 1, right_id);
        }
    }

    /// Removes a key from the tree, returning the value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let ret = self.remove_from(self.root, key);
        if ret.is_some() {
            self.length -= 1;
        }

        let collapse = match &self.nodes[self.root] {
            Node::Internal(n) if n.keys.is_empty() => Some(n.children[0]),
            _ => None,
        };
        if let Some(child) = collapse {
            self.nodes.remove(self.root);
            self.root = child;
            debug!("bplus tree root collapsed, height now {}", self.height());
        }
        ret
    }

    fn remove_from(&mut self, id: NodeId, key: &K) -> Option<V> {
        let (idx, child) = match &mut self.nodes[id] {
            Node::Leaf(leaf) => {
                let i = leaf.keys.binary_search(key).ok()?;
                leaf.keys.remove(i);
                return Some(leaf.values.remove(i));
            }
            Node::Internal(n) => {
                let idx = child_index(&n.keys, key);
                (idx, n.children[idx])
            }
        };
        let ret = self.remove_from(child, key)?;
        self.fix_underflow(id, idx);
        Some(ret)
    }

    fn fix_underflow(&mut self, parent: NodeId, idx: usize) {
        let siblings = self.children_of(parent);
        let child = siblings[idx];
        let left = idx.checked_sub(1).map(|i| siblings[i]);
        let right = siblings.get(idx + 1).copied();

        if self.nodes[child].key_count() >= self.min_keys(child) {
            return;
        }
        if let Some(l) = left {
            if self.nodes[l].key_count() > self.min_keys(l) {
                self.borrow_from_left(parent, idx, l, child);
                return;
            }
        }
        if let Some(r) = right {
            if self.nodes[r].key_count() > self.min_keys(r) {
                self.borrow_from_right(parent, idx, child, r);
                return;
            }
        }
        if left.is_some() {
            self.merge(parent, idx - 1);
        } else if right.is_some() {
            self.merge(parent, idx);
        }
    }

    fn set_separator(&mut self, parent: NodeId, idx: usize, key: K) -> Option<K> {
        match &mut self.nodes[parent] {
            Node::Internal(p) => Some(mem::replace(&mut p.keys[idx], key)),
            Node::Leaf(_) => None,
        }
    }

    /// Moves the last entry of `left` to the front of `child`.
    fn borrow_from_left(&mut self, parent: NodeId, idx: usize, left: NodeId, child: NodeId) {
        match &mut self.nodes[left] {
            Node::Leaf(l) => {
                let (Some(k), Some(v)) = (l.keys.pop(), l.values.pop()) else {
                    return;
                };
                self.set_separator(parent, idx - 1, k.clone());
                if let Node::Leaf(c) = &mut self.nodes[child] {
                    c.keys.insert(0, k);
                    c.values.insert(0, v);
                }
            }
            Node::Internal(l) => {
                let (Some(k), Some(grandchild)) = (l.keys.pop(), l.children.pop()) else {
                    return;
                };
                let sep = self.set_separator(parent, idx - 1, k);
                if let (Node::Internal(c), Some(sep)) = (&mut self.nodes[child], sep) {
                    c.keys.insert(0, sep);
                    c.children.insert(0, grandchild);
                }
            }
        }
    }

    /// Moves the first entry of `right` to the back of `child`.
    fn borrow_from_right(&mut self, parent: NodeId, idx: usize, child: NodeId, right: NodeId) {
        match &mut self.nodes[right] {
            Node::Leaf(r) => {
                let k = r.keys.remove(0);
                let v = r.values.remove(0);
                let new_first = r.keys[0].clone();
                self.set_separator(parent, idx, new_first);
                if let Node::Leaf(c) = &mut self.nodes[child] {
                    c.keys.push(k);
                    c.values.push(v);
                }
            }
            Node::Internal(r) => {
                let k = r.keys.remove(0);
                let grandchild = r.children.remove(0);
                let sep = self.set_separator(parent, idx, k);
                if let (Node::Internal(c), Some(sep)) = (&mut self.nodes[child], sep) {
                    c.keys.push(sep);
                    c.children.push(grandchild);
                }
            }
        }
    }

    /// Folds child `idx + 1` of `parent` into child `idx`.
    fn merge(&mut self, parent: NodeId, idx: usize) {
        let (sep, left, right) = match &mut self.nodes[parent] {
            Node::Internal(p) => {
                let sep = p.keys.remove(idx);
                let right = p.children.remove(idx + 1);
                (sep, p.children[idx], right)
            }
            Node::Leaf(_) => return,
        };
        let right = self.nodes.remove(right);
        match (&mut self.nodes[left], right) {
            (Node::Leaf(l), Node::Leaf(r)) => {
                // Separators are only copies in a B+-Tree; the leaf keeps
                // the real key.
                l.keys.extend(r.keys);
                l.values.extend(r.values);
                l.next = r.next;
            }
            (Node::Internal(l), Node::Internal(r)) => {
                l.keys.push(sep);
                l.keys.extend(r.keys);
                l.children.extend(r.children);
            }
            _ => unreachable!("siblings at different depths"),
        }
    }

    /// Returns every entry with `min <= key <= max` in ascending order.
    ///
    /// Descends once to the leaf holding `min`, then follows the leaf chain.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if min > max {
            return out;
        }
        let mut leaf = self.find_leaf(min);
        let mut i = leaf.keys.partition_point(|k| k < min);
        loop {
            while i < leaf.keys.len() {
                if &leaf.keys[i] > max {
                    return out;
                }
                out.push((&leaf.keys[i], &leaf.values[i]));
                i += 1;
            }
            match leaf.next.map(|id| &self.nodes[id]) {
                Some(Node::Leaf(next)) => {
                    leaf = next;
                    i = 0;
                }
                _ => return out,
            }
        }
    }
}

impl<K: Ord + Clone, V, const ORDER: usize> OrderedContainer<K, V> for BPlusTree<K, V, ORDER> {
    fn name(&self) -> &'static str {
        "B+-tree"
    }

    fn len(&self) -> usize {
        self.length
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        BPlusTree::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        BPlusTree::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        BPlusTree::traverse(self, visitor)
    }
}
