//! An unbalanced binary search tree.
//!
//! Kept as the baseline the balanced trees are measured against: inserting
//! keys in sorted order degrades it into a linked list. Every walk is a loop
//! rather than a recursion, and `Drop` tears nodes down one at a time, so a
//! degenerate tree of any length is safe to build and discard.

use std::cmp::Ordering;
use std::mem;

use crate::container::OrderedContainer;

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
}

/// An unbalanced binary search tree map.
pub struct Bst<K, V> {
    root: Link<K, V>,
    length: usize,
}

impl<K, V> Bst<K, V> {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        Bst {
            root: None,
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

    /// Number of nodes on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Node<K, V>, usize)> = Vec::new();
        if let Some(root) = self.root.as_deref() {
            stack.push((root, 1));
        }
        while let Some((n, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in [n.left.as_deref(), n.right.as_deref()].into_iter().flatten() {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Calls `f` for every entry in ascending key order.
    pub fn traverse<F: FnMut(&K, &V)>(&self, mut f: F) {
        let mut stack: Vec<&Node<K, V>> = Vec::new();
        let mut cur = self.root.as_deref();
        while cur.is_some() || !stack.is_empty() {
            while let Some(n) = cur {
                stack.push(n);
                cur = n.left.as_deref();
            }
            if let Some(n) = stack.pop() {
                f(&n.key, &n.value);
                cur = n.right.as_deref();
            }
        }
    }
}

impl<K, V> Default for Bst<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for Bst<K, V> {
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node<K, V>>> = self.root.take().into_iter().collect();
        while let Some(mut n) = stack.pop() {
            stack.extend(n.left.take());
            stack.extend(n.right.take());
        }
    }
}

/// Detaches the leftmost node of the subtree at `link`.
fn take_min<K, V>(mut link: &mut Link<K, V>) -> Option<Box<Node<K, V>>> {
    while link.as_ref()?.left.is_some() {
        link = &mut link.as_mut()?.left;
    }
    let mut min = link.take()?;
    *link = min.right.take();
    Some(min)
}

impl<K: Ord, V> Bst<K, V> {
    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut cur = self.root.as_deref();
        while let Some(n) = cur {
            match key.cmp(&n.key) {
                Ordering::Less => cur = n.left.as_deref(),
                Ordering::Greater => cur = n.right.as_deref(),
                Ordering::Equal => return Some(&n.value),
            }
        }
        None
    }

    /// Finds the link holding `key`, or the empty link where it would go.
    fn find_link(&mut self, key: &K) -> &mut Link<K, V> {
        let mut link = &mut self.root;
        loop {
            let ord = match link.as_ref() {
                None => return link,
                Some(n) => key.cmp(&n.key),
            };
            link = match (ord, link) {
                (Ordering::Equal, link) => return link,
                (Ordering::Less, Some(n)) => &mut n.left,
                (Ordering::Greater, Some(n)) => &mut n.right,
                (_, link) => return link,
            };
        }
    }

    /// Inserts a key-value pair into the tree.
    /// Returns the old value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let link = self.find_link(&key);
        if let Some(n) = link.as_mut() {
            return Some(mem::replace(&mut n.value, value));
        }
        *link = Some(Box::new(Node {
            key,
            value,
            left: None,
            right: None,
        }));
        self.length += 1;
        None
    }

    /// Removes a key from the tree, returning the value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let link = self.find_link(key);
        let node = link.as_mut()?;
        let removed = if node.left.is_some() && node.right.is_some() {
            // Move the successor's entry into this node and drop the
            // successor's node instead.
            let mut succ = take_min(&mut node.right)?;
            mem::swap(&mut node.key, &mut succ.key);
            mem::swap(&mut node.value, &mut succ.value);
            succ.value
        } else {
            let mut node = link.take()?;
            *link = node.left.take().or_else(|| node.right.take());
            node.value
        };
        self.length -= 1;
        Some(removed)
    }

    /// Returns every entry with `min <= key <= max` in ascending order.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if min > max {
            return out;
        }
        let mut stack: Vec<&Node<K, V>> = Vec::new();
        let mut cur = self.root.as_deref();
        while cur.is_some() || !stack.is_empty() {
            while let Some(n) = cur {
                if min <= &n.key {
                    stack.push(n);
                    cur = n.left.as_deref();
                } else {
                    cur = n.right.as_deref();
                }
            }
            if let Some(n) = stack.pop() {
                if &n.key > max {
                    break;
                }
                out.push((&n.key, &n.value));
                cur = n.right.as_deref();
            }
        }
        out
    }
}

impl<K: Ord, V> OrderedContainer<K, V> for Bst<K, V> {
    fn name(&self) -> &'static str {
        "binary search tree"
    }

    fn len(&self) -> usize {
        self.length
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        Bst::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        Bst::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        Bst::traverse(self, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap as StdBTreeMap;

    fn collect(tree: &Bst<u32, u32>) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        tree.traverse(|k, v| out.push((*k, *v)));
        out
    }

    #[test]
    fn test_basic_ops() {
        let mut tree = Bst::new();
        assert_eq!(tree.insert(5, 50), None);
        assert_eq!(tree.insert(3, 30), None);
        assert_eq!(tree.insert(8, 80), None);
        assert_eq!(tree.insert(3, 31), Some(30));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(&3), Some(&31));
        assert_eq!(tree.get(&4), None);
        assert_eq!(collect(&tree), vec![(3, 31), (5, 50), (8, 80)]);
    }

    #[test]
    fn test_sorted_insert_degenerates() {
        let mut tree = Bst::new();
        for i in 0..10_000u32 {
            tree.insert(i, i);
        }
        assert_eq!(tree.height(), 10_000);
        assert_eq!(tree.get(&9_999), Some(&9_999));
        assert_eq!(tree.range(&9_990, &10_010).len(), 10);
        // Dropping a list-shaped tree must not recurse.
        drop(tree);
    }

    #[test]
    fn test_remove_cases() {
        let mut tree = Bst::new();
        for k in [50u32, 30, 70, 20, 40, 60, 80, 65] {
            tree.insert(k, k);
        }
        assert_eq!(tree.remove(&20), Some(20)); // leaf
        assert_eq!(tree.remove(&60), Some(60)); // one child
        assert_eq!(tree.remove(&50), Some(50)); // two children, root
        assert_eq!(tree.remove(&50), None);
        assert_eq!(
            collect(&tree),
            vec![(30, 30), (40, 40), (65, 65), (70, 70), (80, 80)]
        );
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_random_against_std() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut tree = Bst::new();
        let mut std_map = StdBTreeMap::new();
        for step in 0..5000u32 {
            let key = rng.gen_range(0..300u32);
            if rng.gen_bool(0.5) {
                assert_eq!(tree.insert(key, step), std_map.insert(key, step));
            } else {
                assert_eq!(tree.remove(&key), std_map.remove(&key));
            }
        }
        assert_eq!(tree.len(), std_map.len());
        let expected: Vec<_> = std_map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(collect(&tree), expected);
        let ranged: Vec<_> = tree.range(&100, &200).into_iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<_> = std_map.range(100..=200).map(|(k, v)| (*k, *v)).collect();
        assert_eq!(ranged, expected);
    }
}
