use std::borrow::Borrow;
use std::mem::{self, MaybeUninit};
use std::ptr;
use std::slice;

pub(super) type Child<K, V, const ORDER: usize> = Option<Box<Node<K, V, ORDER>>>;

// We use MaybeUninit to avoid requiring K: Default and V: Default.
// Only the first `length` key/value slots are initialized; children
// 0..=length are Some for internal nodes and all None for leaves.
pub(super) struct Node<K, V, const ORDER: usize> {
    pub(super) keys: [MaybeUninit<K>; ORDER],
    pub(super) values: [MaybeUninit<V>; ORDER],
    pub(super) children: [Child<K, V, ORDER>; ORDER],
    pub(super) length: usize,
}

impl<K, V, const ORDER: usize> Node<K, V, ORDER> {
    /// A node is full at `ORDER - 1` keys.
    pub(super) const MAX_KEYS: usize = ORDER - 1;
    /// Smallest occupancy of a non-root node. This is the smaller half of a
    /// split at `(ORDER - 1) / 2`, so splitting never produces an underfull
    /// node.
    pub(super) const MIN_KEYS: usize = ORDER / 2 - 1;
    pub(super) const ORDER_OK: () = assert!(ORDER >= 4, "B-Tree order must be at least 4");

    pub(super) fn new() -> Self {
        Node {
            // An array of MaybeUninit needs no initialization.
            keys: unsafe { MaybeUninit::uninit().assume_init() },
            values: unsafe { MaybeUninit::uninit().assume_init() },
            children: std::array::from_fn(|_| None),
            length: 0,
        }
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children[0].is_none()
    }

    pub(super) fn is_full(&self) -> bool {
        self.length >= Self::MAX_KEYS
    }

    pub(super) fn keys(&self) -> &[K] {
        unsafe { slice::from_raw_parts(self.keys.as_ptr() as *const K, self.length) }
    }

    pub(super) fn key(&self, idx: usize) -> &K {
        &self.keys()[idx]
    }

    pub(super) fn value(&self, idx: usize) -> &V {
        assert!(idx < self.length);
        unsafe { self.values[idx].assume_init_ref() }
    }

    pub(super) fn child(&self, idx: usize) -> Option<&Node<K, V, ORDER>> {
        self.children[idx].as_deref()
    }

    pub(super) fn child_len(&self, idx: usize) -> usize {
        self.child(idx).map_or(0, |c| c.length)
    }

    /// Finds the key. Returns Ok(index) if found, Err(index) if not.
    /// The index in Err represents the child slot to check.
    pub(super) fn find_slot<Q: ?Sized + Ord>(&self, key: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
    {
        self.keys().binary_search_by(|k| k.borrow().cmp(key))
    }

    /// Swaps in a new key/value pair at an occupied slot and returns the old
    /// pair.
    pub(super) fn replace_entry(&mut self, idx: usize, key: K, value: V) -> (K, V) {
        assert!(idx < self.length);
        unsafe {
            (
                mem::replace(self.keys[idx].assume_init_mut(), key),
                mem::replace(self.values[idx].assume_init_mut(), value),
            )
        }
    }

    pub(super) fn replace_value(&mut self, idx: usize, value: V) -> V {
        assert!(idx < self.length);
        unsafe { mem::replace(self.values[idx].assume_init_mut(), value) }
    }

    pub(super) fn insert_at(&mut self, idx: usize, key: K, value: V) {
        let len = self.length;
        assert!(len < ORDER && idx <= len);
        unsafe {
            // Shift keys/values right
            let keys_ptr = self.keys.as_mut_ptr();
            let values_ptr = self.values.as_mut_ptr();
            ptr::copy(keys_ptr.add(idx), keys_ptr.add(idx + 1), len - idx);
            ptr::copy(values_ptr.add(idx), values_ptr.add(idx + 1), len - idx);
        }
        // Write new
        self.keys[idx].write(key);
        self.values[idx].write(value);
        self.length += 1;
    }

    pub(super) fn remove_at(&mut self, idx: usize) -> (K, V) {
        let len = self.length;
        assert!(idx < len);
        unsafe {
            let k = self.keys[idx].assume_init_read();
            let v = self.values[idx].assume_init_read();

            // Shift left
            let keys_ptr = self.keys.as_mut_ptr();
            let values_ptr = self.values.as_mut_ptr();
            ptr::copy(keys_ptr.add(idx + 1), keys_ptr.add(idx), len - idx - 1);
            ptr::copy(values_ptr.add(idx + 1), values_ptr.add(idx), len - idx - 1);

            self.length -= 1;
            (k, v)
        }
    }

    /// Puts `child` at `idx`, shifting later children right. Call after the
    /// matching key has been inserted, so children occupy `0..length`.
    pub(super) fn insert_child(&mut self, idx: usize, child: Child<K, V, ORDER>) {
        for i in (idx..self.length).rev() {
            self.children[i + 1] = self.children[i].take();
        }
        self.children[idx] = child;
    }

    /// Takes the child at `idx`, shifting later children left. Call after
    /// the matching key has been removed, so children occupy `0..=length+1`.
    pub(super) fn remove_child(&mut self, idx: usize) -> Child<K, V, ORDER> {
        let ret = self.children[idx].take();
        for i in idx..=self.length {
            self.children[i] = self.children[i + 1].take();
        }
        ret
    }

    /// Splits a full node at `(ORDER - 1) / 2`. The node keeps the lower
    /// half; the median entry and a new node holding the upper half are
    /// returned for the parent to adopt.
    pub(super) fn split(&mut self) -> (K, V, Box<Node<K, V, ORDER>>) {
        let len = self.length;
        let mid = len / 2;
        let moved = len - mid - 1;
        let mut right = Box::new(Node::new());
        unsafe {
            ptr::copy_nonoverlapping(
                self.keys.as_ptr().add(mid + 1),
                right.keys.as_mut_ptr(),
                moved,
            );
            ptr::copy_nonoverlapping(
                self.values.as_ptr().add(mid + 1),
                right.values.as_mut_ptr(),
                moved,
            );
        }
        // Move children properly (can't use ptr::copy for Box)
        for i in 0..=moved {
            right.children[i] = self.children[mid + 1 + i].take();
        }
        right.length = moved;
        self.length = mid;
        let (k, v) = unsafe {
            (
                self.keys[mid].assume_init_read(),
                self.values[mid].assume_init_read(),
            )
        };
        (k, v, right)
    }

    /// Splits the full child at `idx` and adopts its median.
    pub(super) fn split_child(&mut self, idx: usize) {
        let split = self.children[idx].as_mut().map(|child| child.split());
        if let Some((k, v, right)) = split {
            self.insert_at(idx, k, v);
            self.insert_child(idx + 1, Some(right));
        }
    }

    fn push_back(&mut self, key: K, value: V, child: Child<K, V, ORDER>) {
        let len = self.length;
        self.keys[len].write(key);
        self.values[len].write(value);
        self.children[len + 1] = child;
        self.length += 1;
    }

    fn pop_back(&mut self) -> (K, V, Child<K, V, ORDER>) {
        let len = self.length;
        let child = self.children[len].take();
        let (k, v) = self.remove_at(len - 1);
        (k, v, child)
    }

    fn push_front(&mut self, key: K, value: V, child: Child<K, V, ORDER>) {
        self.insert_at(0, key, value);
        self.insert_child(0, child);
    }

    fn pop_front(&mut self) -> (K, V, Child<K, V, ORDER>) {
        let (k, v) = self.remove_at(0);
        let child = self.remove_child(0);
        (k, v, child)
    }

    /// Moves `sep` and every entry of `right` onto the end of this node.
    fn append(&mut self, sep_key: K, sep_value: V, mut right: Box<Node<K, V, ORDER>>) {
        let first = right.children[0].take();
        self.push_back(sep_key, sep_value, first);
        let base = self.length;
        let moved = right.length;
        assert!(base + moved <= Self::MAX_KEYS);
        unsafe {
            ptr::copy_nonoverlapping(right.keys.as_ptr(), self.keys.as_mut_ptr().add(base), moved);
            ptr::copy_nonoverlapping(
                right.values.as_ptr(),
                self.values.as_mut_ptr().add(base),
                moved,
            );
        }
        for i in 0..moved {
            self.children[base + i + 1] = right.children[i + 1].take();
        }
        self.length += moved;
        // The entries now belong to self.
        right.length = 0;
    }

    /// Moves the last entry of the left sibling of child `idx` up into this
    /// node, and the separator down into the child.
    pub(super) fn rotate_right(&mut self, idx: usize) {
        let (lo, hi) = self.children.split_at_mut(idx);
        if let (Some(left), Some(child)) = (lo[idx - 1].as_deref_mut(), hi[0].as_deref_mut()) {
            let (k, v, grandchild) = left.pop_back();
            let sep_key = unsafe { mem::replace(self.keys[idx - 1].assume_init_mut(), k) };
            let sep_value = unsafe { mem::replace(self.values[idx - 1].assume_init_mut(), v) };
            child.push_front(sep_key, sep_value, grandchild);
        }
    }

    /// Mirror of `rotate_right`, borrowing from the right sibling.
    pub(super) fn rotate_left(&mut self, idx: usize) {
        let (lo, hi) = self.children.split_at_mut(idx + 1);
        if let (Some(child), Some(right)) = (lo[idx].as_deref_mut(), hi[0].as_deref_mut()) {
            let (k, v, grandchild) = right.pop_front();
            let sep_key = unsafe { mem::replace(self.keys[idx].assume_init_mut(), k) };
            let sep_value = unsafe { mem::replace(self.values[idx].assume_init_mut(), v) };
            child.push_back(sep_key, sep_value, grandchild);
        }
    }

    /// Folds child `idx + 1` and the separator between them into child `idx`.
    pub(super) fn merge_children(&mut self, idx: usize) {
        let (sep_key, sep_value) = self.remove_at(idx);
        let right = self.remove_child(idx + 1);
        if let (Some(left), Some(right)) = (self.children[idx].as_deref_mut(), right) {
            left.append(sep_key, sep_value, right);
        }
    }
}

impl<K, V, const ORDER: usize> Drop for Node<K, V, ORDER> {
    fn drop(&mut self) {
        for i in 0..self.length {
            unsafe {
                self.keys[i].assume_init_drop();
                self.values[i].assume_init_drop();
            }
        }
    }
}
