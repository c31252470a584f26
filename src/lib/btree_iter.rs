use crate::btree_node::Node;

/// In-order iterator over a [`BTree`](crate::BTree).
pub struct Iter<'a, K, V, const ORDER: usize> {
    // Stack of (node, index of the next entry to yield)
    stack: Vec<(&'a Node<K, V, ORDER>, usize)>,
}

impl<'a, K, V, const ORDER: usize> Iter<'a, K, V, ORDER> {
    pub(super) fn new(root: Option<&'a Node<K, V, ORDER>>) -> Self {
        let mut iter = Iter { stack: Vec::new() };
        if let Some(r) = root {
            iter.push_leftmost(r);
        }
        iter
    }

    fn push_leftmost(&mut self, mut node: &'a Node<K, V, ORDER>) {
        loop {
            self.stack.push((node, 0));
            match node.child(0) {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, K: 'a, V: 'a, const ORDER: usize> Iterator for Iter<'a, K, V, ORDER> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, idx) = self.stack.last_mut()?;
            let node: &'a Node<K, V, ORDER> = *node;
            if *idx < node.length {
                let i = *idx;
                // Advance index
                *idx += 1;
                // Descend into the subtree right of this entry
                if let Some(child) = node.child(i + 1) {
                    self.push_leftmost(child);
                }
                return Some((node.key(i), node.value(i)));
            }
            // Current node exhausted
            self.stack.pop();
        }
    }
}
