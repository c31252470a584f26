//! A red-black tree.
//!
//! Nodes live in a slab arena and refer to each other by index. Slot 0 is a
//! keyless sentinel that is always black and stands in for every empty child
//! slot, so the fix-up loops never branch on "missing". Parent links are
//! plain indices and own nothing; the arena owns every node.

use std::cmp::Ordering;
use std::mem;

use slab::Slab;

use crate::container::OrderedContainer;

const NIL: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

struct Node<K, V> {
    // None only for the sentinel.
    entry: Option<(K, V)>,
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
}

impl<K, V> Node<K, V> {
    fn sentinel() -> Self {
        Node {
            entry: None,
            color: Color::Black,
            parent: NIL,
            left: NIL,
            right: NIL,
        }
    }
}

/// A red-black tree map with ordered keys.
pub struct RbTree<K, V> {
    nodes: Slab<Node<K, V>>,
    root: usize,
    length: usize,
}

impl<K, V> RbTree<K, V> {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let nil = nodes.insert(Node::sentinel());
        debug_assert_eq!(nil, NIL);
        RbTree {
            nodes,
            root: NIL,
            length: 0,
        }
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    fn color(&self, n: usize) -> Color {
        self.nodes[n].color
    }

    #[inline]
    fn parent(&self, n: usize) -> usize {
        self.nodes[n].parent
    }

    #[inline]
    fn left(&self, n: usize) -> usize {
        self.nodes[n].left
    }

    #[inline]
    fn right(&self, n: usize) -> usize {
        self.nodes[n].right
    }

    #[inline]
    fn entry(&self, n: usize) -> (&K, &V) {
        match &self.nodes[n].entry {
            Some((k, v)) => (k, v),
            None => unreachable!("sentinel has no entry"),
        }
    }

    fn minimum(&self, mut n: usize) -> usize {
        while self.left(n) != NIL {
            n = self.left(n);
        }
        n
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.right(x);
        let y_left = self.left(y);
        self.nodes[x].right = y_left;
        if y_left != NIL {
            self.nodes[y_left].parent = x;
        }
        let xp = self.parent(x);
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if x == self.left(xp) {
            self.nodes[xp].left = y;
        } else {
            self.nodes[xp].right = y;
        }
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.left(x);
        let y_right = self.right(y);
        self.nodes[x].left = y_right;
        if y_right != NIL {
            self.nodes[y_right].parent = x;
        }
        let xp = self.parent(x);
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if x == self.right(xp) {
            self.nodes[xp].right = y;
        } else {
            self.nodes[xp].left = y;
        }
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while self.color(self.parent(z)) == Color::Red {
            let p = self.parent(z);
            let g = self.parent(p);
            if p == self.left(g) {
                let uncle = self.right(g);
                if self.color(uncle) == Color::Red {
                    self.nodes[p].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    z = g;
                } else {
                    if z == self.right(p) {
                        // Inner child: turn it into an outer one first.
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.nodes[p].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.left(g);
                if self.color(uncle) == Color::Red {
                    self.nodes[p].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    z = g;
                } else {
                    if z == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z);
                    let g = self.parent(p);
                    self.nodes[p].color = Color::Black;
                    self.nodes[g].color = Color::Red;
                    self.rotate_left(g);
                }
            }
        }
        let root = self.root;
        self.nodes[root].color = Color::Black;
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v`.
    /// `v` may be the sentinel, whose parent is then set as scratch state
    /// for the delete fix-up.
    fn transplant(&mut self, u: usize, v: usize) {
        let up = self.parent(u);
        if up == NIL {
            self.root = v;
        } else if u == self.left(up) {
            self.nodes[up].left = v;
        } else {
            self.nodes[up].right = v;
        }
        self.nodes[v].parent = up;
    }

    fn delete_fixup(&mut self, mut x: usize) {
        while x != self.root && self.color(x) == Color::Black {
            let p = self.parent(x);
            if x == self.left(p) {
                let mut w = self.right(p);
                if self.color(w) == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_left(p);
                    w = self.right(self.parent(x));
                }
                if self.color(self.left(w)) == Color::Black
                    && self.color(self.right(w)) == Color::Black
                {
                    self.nodes[w].color = Color::Red;
                    x = self.parent(x);
                } else {
                    if self.color(self.right(w)) == Color::Black {
                        let wl = self.left(w);
                        self.nodes[wl].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_right(w);
                        w = self.right(self.parent(x));
                    }
                    let p = self.parent(x);
                    self.nodes[w].color = self.color(p);
                    self.nodes[p].color = Color::Black;
                    let wr = self.right(w);
                    self.nodes[wr].color = Color::Black;
                    self.rotate_left(p);
                    x = self.root;
                }
            } else {
                let mut w = self.left(p);
                if self.color(w) == Color::Red {
                    self.nodes[w].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_right(p);
                    w = self.left(self.parent(x));
                }
                if self.color(self.left(w)) == Color::Black
                    && self.color(self.right(w)) == Color::Black
                {
                    self.nodes[w].color = Color::Red;
                    x = self.parent(x);
                } else {
                    if self.color(self.left(w)) == Color::Black {
                        let wr = self.right(w);
                        self.nodes[wr].color = Color::Black;
                        self.nodes[w].color = Color::Red;
                        self.rotate_left(w);
                        w = self.left(self.parent(x));
                    }
                    let p = self.parent(x);
                    self.nodes[w].color = self.color(p);
                    self.nodes[p].color = Color::Black;
                    let wl = self.left(w);
                    self.nodes[wl].color = Color::Black;
                    self.rotate_right(p);
                    x = self.root;
                }
            }
        }
        self.nodes[x].color = Color::Black;
        self.nodes[NIL].parent = NIL;
    }

    /// Calls `f` for every entry in ascending key order.
    pub fn traverse<F: FnMut(&K, &V)>(&self, mut f: F) {
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur != NIL || !stack.is_empty() {
            while cur != NIL {
                stack.push(cur);
                cur = self.left(cur);
            }
            if let Some(n) = stack.pop() {
                let (k, v) = self.entry(n);
                f(k, v);
                cur = self.right(n);
            }
        }
    }
}

impl<K, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> RbTree<K, V> {
    fn find(&self, key: &K) -> Option<usize> {
        let mut cur = self.root;
        while cur != NIL {
            match key.cmp(self.entry(cur).0) {
                Ordering::Less => cur = self.left(cur),
                Ordering::Greater => cur = self.right(cur),
                Ordering::Equal => return Some(cur),
            }
        }
        None
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|n| self.entry(n).1)
    }

    /// Inserts a key-value pair into the tree.
    /// Returns the old value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut parent = NIL;
        let mut cur = self.root;
        let mut go_left = false;
        while cur != NIL {
            parent = cur;
            match key.cmp(self.entry(cur).0) {
                Ordering::Less => {
                    cur = self.left(cur);
                    go_left = true;
                }
                Ordering::Greater => {
                    cur = self.right(cur);
                    go_left = false;
                }
                Ordering::Equal => {
                    if let Some((_, v)) = self.nodes[cur].entry.as_mut() {
                        return Some(mem::replace(v, value));
                    }
                    unreachable!("sentinel reached during descent");
                }
            }
        }

        let z = self.nodes.insert(Node {
            entry: Some((key, value)),
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
        });
        if parent == NIL {
            self.root = z;
        } else if go_left {
            self.nodes[parent].left = z;
        } else {
            self.nodes[parent].right = z;
        }
        self.length += 1;
        self.insert_fixup(z);
        None
    }

    /// Removes a key from the tree, returning the value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let z = self.find(key)?;

        // With two children, trade payloads with the in-order successor and
        // unlink that node instead; it has no left child.
        let target = if self.left(z) != NIL && self.right(z) != NIL {
            let succ = self.minimum(self.right(z));
            if let Some((a, b)) = self.nodes.get2_mut(z, succ) {
                mem::swap(&mut a.entry, &mut b.entry);
            }
            succ
        } else {
            z
        };

        let child = if self.left(target) != NIL {
            self.left(target)
        } else {
            self.right(target)
        };
        self.transplant(target, child);
        let removed = self.nodes.remove(target);
        self.length -= 1;
        if removed.color == Color::Black {
            self.delete_fixup(child);
        } else {
            self.nodes[NIL].parent = NIL;
        }
        removed.entry.map(|(_, v)| v)
    }

    /// Returns every entry with `min <= key <= max` in ascending order.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if min <= max {
            self.range_into(self.root, min, max, &mut out);
        }
        out
    }

    fn range_into<'a>(&'a self, n: usize, min: &K, max: &K, out: &mut Vec<(&'a K, &'a V)>) {
        if n == NIL {
            return;
        }
        let (k, v) = self.entry(n);
        if min < k {
            self.range_into(self.left(n), min, max, out);
        }
        if min <= k && k <= max {
            out.push((k, v));
        }
        if k < max {
            self.range_into(self.right(n), min, max, out);
        }
    }
}

impl<K: Ord, V> OrderedContainer<K, V> for RbTree<K, V> {
    fn name(&self) -> &'static str {
        "red-black tree"
    }

    fn len(&self) -> usize {
        self.length
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        RbTree::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        RbTree::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        RbTree::traverse(self, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap as StdBTreeMap;

    /// Walks the tree and returns the black-height of the root, or a
    /// description of the first violated property.
    fn check_rb_invariants_impl<K: Ord + std::fmt::Debug, V>(
        tree: &RbTree<K, V>,
    ) -> Result<usize, String> {
        if tree.nodes[NIL].color != Color::Black {
            return Err("Sentinel is not black".to_string());
        }
        if tree.root == NIL {
            if tree.len() != 0 {
                return Err(format!("Empty root but non-zero length: {}", tree.len()));
            }
            return Ok(0);
        }
        if tree.color(tree.root) != Color::Black {
            return Err("Root is red".to_string());
        }
        if tree.parent(tree.root) != NIL {
            return Err("Root has a parent".to_string());
        }
        let mut count = 0;
        let bh = check_node_recursive(tree, tree.root, None, None, &mut count)?;
        if count != tree.len() {
            return Err(format!(
                "Counted {} elements but tree.len() is {}",
                count,
                tree.len()
            ));
        }
        // Arena holds exactly the live nodes plus the sentinel.
        if tree.nodes.len() != tree.len() + 1 {
            return Err(format!(
                "Arena holds {} slots for {} entries",
                tree.nodes.len(),
                tree.len()
            ));
        }
        Ok(bh)
    }

    fn check_node_recursive<K: Ord + std::fmt::Debug, V>(
        tree: &RbTree<K, V>,
        n: usize,
        min: Option<&K>,
        max: Option<&K>,
        count: &mut usize,
    ) -> Result<usize, String> {
        if n == NIL {
            return Ok(0);
        }
        *count += 1;
        let key = tree.entry(n).0;
        if min.map_or(false, |m| key <= m) || max.map_or(false, |m| key >= m) {
            return Err(format!("Key {:?} out of order", key));
        }
        for child in [tree.left(n), tree.right(n)] {
            if child != NIL {
                if tree.parent(child) != n {
                    return Err(format!("Bad parent link under {:?}", key));
                }
                if tree.color(n) == Color::Red && tree.color(child) == Color::Red {
                    return Err(format!("Red node {:?} has a red child", key));
                }
            }
        }
        let lh = check_node_recursive(tree, tree.left(n), min, Some(key), count)?;
        let rh = check_node_recursive(tree, tree.right(n), Some(key), max, count)?;
        if lh != rh {
            return Err(format!(
                "Black-height mismatch at {:?}: left {} right {}",
                key, lh, rh
            ));
        }
        Ok(lh + usize::from(tree.color(n) == Color::Black))
    }

    fn check_rb_invariants<K: Ord + std::fmt::Debug, V>(tree: &RbTree<K, V>, context: &str) {
        if let Err(e) = check_rb_invariants_impl(tree) {
            panic!("Red-black invariant violated ({}): {}", context, e);
        }
    }

    fn compare_with_std<K: Ord + Clone + std::fmt::Debug, V: Eq + Clone + std::fmt::Debug>(
        ours: &RbTree<K, V>,
        std_map: &StdBTreeMap<K, V>,
        context: &str,
    ) {
        assert_eq!(ours.len(), std_map.len(), "length mismatch: {}", context);
        for (k, v) in std_map {
            assert_eq!(ours.get(k), Some(v), "value mismatch for {:?}: {}", k, context);
        }
        let mut ours_entries = Vec::new();
        ours.traverse(|k, v| ours_entries.push((k.clone(), v.clone())));
        let std_entries: Vec<_> = std_map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(ours_entries, std_entries, "traversal mismatch: {}", context);
    }

    #[test]
    fn test_empty_tree() {
        let tree: RbTree<u32, String> = RbTree::new();
        assert!(tree.is_empty());
        assert!(tree.get(&0).is_none());
        assert!(tree.range(&0, &100).is_empty());
        check_rb_invariants(&tree, "empty");
    }

    #[test]
    fn test_textbook_insert_order() {
        let mut tree = RbTree::new();
        for k in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert(k, k * 10);
            check_rb_invariants(&tree, &format!("after inserting {}", k));
        }
        let mut keys = Vec::new();
        tree.traverse(|k, _| keys.push(*k));
        assert_eq!(keys, vec![20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(tree.color(tree.root), Color::Black);
    }

    #[test]
    fn test_update_existing_key() {
        let mut tree = RbTree::new();
        assert_eq!(tree.insert(1, "first"), None);
        assert_eq!(tree.insert(1, "second"), Some("first"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(&1), Some(&"second"));
    }

    #[test]
    fn test_sequential_insert() {
        let mut tree = RbTree::new();
        let mut std_map = StdBTreeMap::new();
        for i in 0..200u32 {
            tree.insert(i, i + 1);
            std_map.insert(i, i + 1);
            check_rb_invariants(&tree, &format!("after inserting {}", i));
        }
        compare_with_std(&tree, &std_map, "sequential");
        // Black-height bounds the height to 2*log2(n+1).
        let bh = check_rb_invariants_impl(&tree).unwrap();
        assert!(bh <= 9, "black-height {} too large", bh);
    }

    #[test]
    fn test_remove_each_case() {
        let mut tree = RbTree::new();
        let mut std_map = StdBTreeMap::new();
        for i in 0..64u32 {
            tree.insert(i, i);
            std_map.insert(i, i);
        }
        // Leaves, internal nodes with two children, and the root.
        for k in [0u32, 63, 31, 32, 16, 48, 1, 62] {
            let root_key = *tree.entry(tree.root).0;
            assert_eq!(tree.remove(&k), std_map.remove(&k));
            check_rb_invariants(&tree, &format!("after removing {} (root {})", k, root_key));
            compare_with_std(&tree, &std_map, &format!("after removing {}", k));
        }
    }

    #[test]
    fn test_remove_nonexistent() {
        let mut tree = RbTree::new();
        tree.insert(1, 1);
        assert_eq!(tree.remove(&2), None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.remove(&1), Some(1));
        assert_eq!(tree.remove(&1), None);
        assert!(tree.is_empty());
        check_rb_invariants(&tree, "emptied");
    }

    #[test]
    fn test_random_insert_remove() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut tree = RbTree::new();
        let mut std_map = StdBTreeMap::new();
        for step in 0..4000 {
            let key: u32 = rng.gen_range(0..500);
            if rng.gen_bool(0.6) {
                assert_eq!(tree.insert(key, step), std_map.insert(key, step));
            } else {
                assert_eq!(tree.remove(&key), std_map.remove(&key));
            }
            check_rb_invariants(&tree, &format!("step {}", step));
        }
        compare_with_std(&tree, &std_map, "after random ops");
    }

    #[test]
    fn test_drain_in_random_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut keys: Vec<u32> = (0..1000).collect();
        keys.shuffle(&mut rng);
        let mut tree = RbTree::new();
        for &k in &keys {
            tree.insert(k, ());
        }
        keys.shuffle(&mut rng);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(tree.remove(k), Some(()));
            if i % 50 == 0 {
                check_rb_invariants(&tree, &format!("drain {}", i));
            }
        }
        assert!(tree.is_empty());
        check_rb_invariants(&tree, "drained");
    }

    #[test]
    fn test_range() {
        let mut tree = RbTree::new();
        for i in (0..100u32).step_by(2) {
            tree.insert(i, i * 3);
        }
        let got: Vec<_> = tree.range(&9, &17).into_iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, vec![(10, 30), (12, 36), (14, 42), (16, 48)]);
        assert_eq!(tree.range(&10, &10), vec![(&10, &30)]);
        assert!(tree.range(&11, &11).is_empty());
        assert!(tree.range(&200, &300).is_empty());
        assert!(tree.range(&20, &10).is_empty());
    }

    #[test]
    fn test_string_keys() {
        let mut tree = RbTree::new();
        for w in ["pear", "apple", "fig", "banana", "cherry"] {
            tree.insert(w.to_string(), w.len());
        }
        let mut keys = Vec::new();
        tree.traverse(|k, _| keys.push(k.clone()));
        assert_eq!(keys, vec!["apple", "banana", "cherry", "fig", "pear"]);
        let hits: Vec<_> = tree
            .range(&"b".to_string(), &"d".to_string())
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(hits, vec!["banana", "cherry"]);
    }
}
