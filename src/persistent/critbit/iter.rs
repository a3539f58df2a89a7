//! Ascending traversal over a critbit trie.
//!
//! Child 0 always sorts before child 1, so an in-order walk only needs a
//! stack of pending subtrees. Seeking to a lower bound fills that stack once;
//! afterwards no key is compared again.

use smallvec::SmallVec;

use super::bits::CriticalBit;
use super::node::{Leaf, Node};

/// Pending subtrees, deepest on top. Critbit depth is bounded by key length
/// in bits, but real tries rarely go past a few dozen levels.
type Pending<'a, V> = SmallVec<[&'a Node<V>; 32]>;

/// A lazy ascending iterator over the entries of a
/// [`CritbitTrie`](super::CritbitTrie).
///
/// Created by [`CritbitTrie::iter`](super::CritbitTrie::iter) and
/// [`CritbitTrie::range_from`](super::CritbitTrie::range_from).
pub struct CritbitTrieIterator<'a, V> {
    pending: Pending<'a, V>,
    remaining: usize,
}

impl<'a, V> CritbitTrieIterator<'a, V> {
    pub(super) fn new(root: Option<&'a Node<V>>) -> Self {
        let mut pending = Pending::new();
        let mut remaining = 0;
        if let Some(root) = root {
            remaining = root.count();
            pending.push(root);
        }
        Self { pending, remaining }
    }

    /// Positions the iterator at the first key not less than `bound`.
    ///
    /// The critical bit between `bound` and its best leaf splits the path
    /// from the root in two. Above it, `bound` agrees with every key in the
    /// current subtree up to the node's own critical bit, so the child that
    /// `bound` does not take is entirely greater (kept whole) or entirely
    /// smaller (dropped). At the first node past the split, the whole subtree
    /// sits on one side of `bound`.
    pub(super) fn seek(root: Option<&'a Node<V>>, bound: &[u8]) -> Self {
        let mut iterator = Self {
            pending: Pending::new(),
            remaining: 0,
        };
        let Some(root) = root else {
            return iterator;
        };
        let split = CriticalBit::locate(bound, &root.best_leaf(bound).key);

        let mut node = root;
        loop {
            match node {
                Node::Leaf(leaf) => {
                    if *leaf.key >= *bound {
                        iterator.keep(node);
                    }
                    break;
                }
                Node::Internal(internal) => {
                    if let Some(split) = split
                        && internal.critical > split
                    {
                        if split.direction(bound) == 0 {
                            iterator.keep(node);
                        }
                        break;
                    }
                    if internal.critical.direction(bound) == 0 {
                        iterator.keep(&*internal.children[1]);
                        node = &*internal.children[0];
                    } else {
                        node = &*internal.children[1];
                    }
                }
            }
        }
        iterator
    }

    fn keep(&mut self, node: &'a Node<V>) {
        self.remaining += node.count();
        self.pending.push(node);
    }

    fn next_leaf(&mut self) -> Option<&'a Leaf<V>> {
        let mut node = self.pending.pop()?;
        loop {
            match node {
                Node::Leaf(leaf) => {
                    self.remaining -= 1;
                    return Some(leaf);
                }
                Node::Internal(internal) => {
                    self.pending.push(&*internal.children[1]);
                    node = &*internal.children[0];
                }
            }
        }
    }
}

impl<'a, V> Iterator for CritbitTrieIterator<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_leaf().map(|leaf| (&*leaf.key, &leaf.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for CritbitTrieIterator<'_, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<V> std::iter::FusedIterator for CritbitTrieIterator<'_, V> {}
