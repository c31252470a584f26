//! An AVL tree.

use std::cmp::Ordering;
use std::mem;

use crate::container::OrderedContainer;

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    // Leaves have height 1; an empty link has height 0.
    height: usize,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Box<Self> {
        Box::new(Node {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }
}

fn height<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

fn rotate_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    match node.left.take() {
        Some(mut pivot) => {
            node.left = pivot.right.take();
            node.update_height();
            pivot.right = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

fn rotate_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    match node.right.take() {
        Some(mut pivot) => {
            node.right = pivot.left.take();
            node.update_height();
            pivot.left = Some(node);
            pivot.update_height();
            pivot
        }
        None => node,
    }
}

/// Restores |balance| <= 1 at `node`, assuming both subtrees are AVL trees
/// whose heights differ by at most two.
fn rebalance<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    node.update_height();
    let bf = node.balance_factor();
    if bf > 1 {
        // Left-right: straighten the left child first.
        if node.left.as_ref().map_or(0, |l| l.balance_factor()) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        rotate_right(node)
    } else if bf < -1 {
        // Right-left
        if node.right.as_ref().map_or(0, |r| r.balance_factor()) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        rotate_left(node)
    } else {
        node
    }
}

/// An AVL tree map with ordered keys.
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    length: usize,
}

impl<K, V> AvlTree<K, V> {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        AvlTree {
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

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        height(&self.root)
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

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> AvlTree<K, V> {
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

    /// Inserts a key-value pair into the tree.
    /// Returns the old value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (root, old) = Self::insert_recursive(self.root.take(), key, value);
        self.root = Some(root);
        if old.is_none() {
            self.length += 1;
        }
        old
    }

    fn insert_recursive(link: Link<K, V>, key: K, value: V) -> (Box<Node<K, V>>, Option<V>) {
        let mut node = match link {
            None => return (Node::new(key, value), None),
            Some(node) => node,
        };
        let old = match key.cmp(&node.key) {
            Ordering::Less => {
                let (child, old) = Self::insert_recursive(node.left.take(), key, value);
                node.left = Some(child);
                old
            }
            Ordering::Greater => {
                let (child, old) = Self::insert_recursive(node.right.take(), key, value);
                node.right = Some(child);
                old
            }
            Ordering::Equal => {
                let old = mem::replace(&mut node.value, value);
                return (node, Some(old));
            }
        };
        (rebalance(node), old)
    }

    /// Removes a key from the tree, returning the value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (root, removed) = Self::remove_recursive(self.root.take(), key);
        self.root = root;
        if removed.is_some() {
            self.length -= 1;
        }
        removed
    }

    fn remove_recursive(link: Link<K, V>, key: &K) -> (Link<K, V>, Option<V>) {
        let mut node = match link {
            None => return (None, None),
            Some(node) => node,
        };
        let removed = match key.cmp(&node.key) {
            Ordering::Less => {
                let (child, removed) = Self::remove_recursive(node.left.take(), key);
                node.left = child;
                removed
            }
            Ordering::Greater => {
                let (child, removed) = Self::remove_recursive(node.right.take(), key);
                node.right = child;
                removed
            }
            Ordering::Equal => {
                let Node {
                    value, left, right, ..
                } = *node;
                let replacement = match (left, right) {
                    (None, None) => None,
                    (Some(child), None) | (None, Some(child)) => Some(child),
                    (Some(left), Some(right)) => {
                        let (rest, mut succ) = Self::take_min(right);
                        succ.left = Some(left);
                        succ.right = rest;
                        Some(rebalance(succ))
                    }
                };
                return (replacement, Some(value));
            }
        };
        (Some(rebalance(node)), removed)
    }

    /// Detaches the smallest node of a subtree. Returns the rebalanced rest
    /// of the subtree and the detached node.
    fn take_min(mut node: Box<Node<K, V>>) -> (Link<K, V>, Box<Node<K, V>>) {
        match node.left.take() {
            None => (node.right.take(), node),
            Some(left) => {
                let (rest, min) = Self::take_min(left);
                node.left = rest;
                (Some(rebalance(node)), min)
            }
        }
    }

    /// Returns every entry with `min <= key <= max` in ascending order.
    pub fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if min <= max {
            Self::range_into(self.root.as_deref(), min, max, &mut out);
        }
        out
    }

    fn range_into<'a>(
        node: Option<&'a Node<K, V>>,
        min: &K,
        max: &K,
        out: &mut Vec<(&'a K, &'a V)>,
    ) {
        if let Some(n) = node {
            if min < &n.key {
                Self::range_into(n.left.as_deref(), min, max, out);
            }
            if min <= &n.key && &n.key <= max {
                out.push((&n.key, &n.value));
            }
            if &n.key < max {
                Self::range_into(n.right.as_deref(), min, max, out);
            }
        }
    }
}

impl<K: Ord, V> OrderedContainer<K, V> for AvlTree<K, V> {
    fn name(&self) -> &'static str {
        "AVL tree"
    }

    fn len(&self) -> usize {
        self.length
    }

    fn insert(&mut self, key: K, value: V) -> bool {
        AvlTree::insert(self, key, value).is_none()
    }

    fn search(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    fn range(&self, min: &K, max: &K) -> Vec<(&K, &V)> {
        AvlTree::range(self, min, max)
    }

    fn traverse(&self, visitor: &mut dyn FnMut(&K, &V)) {
        AvlTree::traverse(self, visitor)
    }
}
