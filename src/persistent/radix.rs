//! Persistent radix-256 trie keyed by byte strings.
//!
//! This module provides [`RadixTrie`], an immutable ordered map with the same
//! contract as [`CritbitTrie`](super::CritbitTrie) but a different shape:
//! every node branches on a whole byte and carries the full key prefix that
//! leads to it, so a node may hold a value *and* children.
//!
//! # Internal Structure
//!
//! - The root always stands for the empty prefix and holds the value of the
//!   empty key, if any.
//! - Children are sorted by the byte that follows their parent's prefix.
//! - Paths are compressed: a node other than the root that has no value has
//!   at least two children.
//!
//! # Examples
//!
//! ```rust
//! use immutrie::persistent::RadixTrie;
//!
//! let trie = RadixTrie::new()
//!     .insert(b"romane", 1)
//!     .insert(b"romanus", 2)
//!     .insert(b"rom", 3);
//!
//! let keys: Vec<&[u8]> = trie.keys().collect();
//! assert_eq!(keys, vec![b"rom".as_slice(), b"romane", b"romanus"]);
//! ```

use std::fmt;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use super::{ReferenceCounter, render_key};

type Link<V> = ReferenceCounter<Node<V>>;

struct Node<V> {
    /// Full key prefix from the root to this node.
    key: ReferenceCounter<[u8]>,
    value: Option<V>,
    /// Sorted by `child.key[self.key.len()]`.
    children: Vec<Link<V>>,
    /// Number of values in this subtree, own value included.
    count: usize,
}

impl<V> Node<V> {
    fn new(key: ReferenceCounter<[u8]>, value: Option<V>, children: Vec<Link<V>>) -> Self {
        let count = usize::from(value.is_some())
            + children.iter().map(|child| child.count).sum::<usize>();
        Self {
            key,
            value,
            children,
            count,
        }
    }

    fn leaf(key: &[u8], value: V) -> Link<V> {
        ReferenceCounter::new(Self::new(ReferenceCounter::from(key), Some(value), Vec::new()))
    }

    /// Finds the child whose prefix continues with `byte`.
    fn search(&self, byte: u8) -> Result<usize, usize> {
        let depth = self.key.len();
        self.children
            .binary_search_by_key(&byte, |child| child.key[depth])
    }

    fn child(&self, byte: u8) -> Option<&Self> {
        self.search(byte).ok().map(|position| &*self.children[position])
    }
}

impl<V: Clone> Node<V> {
    fn with_children(&self, children: Vec<Link<V>>) -> Self {
        Self::new(self.key.clone(), self.value.clone(), children)
    }
}

fn shared_length(left: &[u8], right: &[u8]) -> usize {
    left.iter()
        .zip(right)
        .take_while(|(left_byte, right_byte)| left_byte == right_byte)
        .count()
}

/// Sets `key` beneath `node`, whose prefix `key` must start with.
fn set_in<V: Clone>(node: &Node<V>, key: &[u8], value: V) -> (Node<V>, Option<V>) {
    let depth = node.key.len();
    if depth == key.len() {
        let updated = Node::new(node.key.clone(), Some(value), node.children.clone());
        return (updated, node.value.clone());
    }

    let mut children = node.children.clone();
    let previous = match node.search(key[depth]) {
        Err(position) => {
            children.insert(position, Node::leaf(key, value));
            None
        }
        Ok(position) => {
            let child = &node.children[position];
            let shared = shared_length(&child.key, key);
            if shared == child.key.len() {
                let (updated, previous) = set_in(child, key, value);
                children[position] = ReferenceCounter::new(updated);
                previous
            } else if shared == key.len() {
                children[position] = ReferenceCounter::new(Node::new(
                    ReferenceCounter::from(key),
                    Some(value),
                    vec![child.clone()],
                ));
                None
            } else {
                let leaf = Node::leaf(key, value);
                let pair = if key[shared] < child.key[shared] {
                    vec![leaf, child.clone()]
                } else {
                    vec![child.clone(), leaf]
                };
                tracing::trace!(depth = shared, "split radix edge");
                children[position] = ReferenceCounter::new(Node::new(
                    ReferenceCounter::from(&key[..shared]),
                    None,
                    pair,
                ));
                None
            }
        }
    };
    (node.with_children(children), previous)
}

/// Removes `key` beneath `node`, whose prefix `key` must start with.
///
/// The returned node is not normalized; the caller decides whether it
/// survives, collapses into its only child, or disappears.
fn delete_in<V: Clone>(node: &Node<V>, key: &[u8]) -> Option<(Node<V>, V)> {
    let depth = node.key.len();
    if depth == key.len() {
        let previous = node.value.clone()?;
        let updated = Node::new(node.key.clone(), None, node.children.clone());
        return Some((updated, previous));
    }

    let position = node.search(key[depth]).ok()?;
    let child = &node.children[position];
    if !key.starts_with(&child.key) {
        return None;
    }
    let (updated, previous) = delete_in(child, key)?;

    let mut children = node.children.clone();
    if updated.value.is_some() || updated.children.len() > 1 {
        children[position] = ReferenceCounter::new(updated);
    } else if let Some(only) = updated.children.first() {
        tracing::trace!(depth = updated.key.len(), "collapsed radix node");
        children[position] = only.clone();
    } else {
        children.remove(position);
    }
    Some((node.with_children(children), previous))
}

fn dump<V>(node: &Node<V>, depth: usize, output: &mut String) {
    let marker = if node.value.is_some() { " value" } else { "" };
    let _ = writeln!(
        output,
        "{}{}{marker}",
        "  ".repeat(depth),
        render_key(&node.key)
    );
    for child in &node.children {
        dump(child, depth + 1, output);
    }
}

fn check<V>(node: &Node<V>, is_root: bool) -> Result<usize, String> {
    if !is_root && node.value.is_none() && node.children.len() < 2 {
        return Err(format!(
            "node {} has no value and {} children",
            render_key(&node.key),
            node.children.len()
        ));
    }
    let depth = node.key.len();
    let mut previous_label = None;
    let mut found = usize::from(node.value.is_some());
    for child in &node.children {
        if child.key.len() <= depth || !child.key.starts_with(&node.key) {
            return Err(format!(
                "child {} does not extend {}",
                render_key(&child.key),
                render_key(&node.key)
            ));
        }
        let label = child.key[depth];
        if previous_label.is_some_and(|previous| previous >= label) {
            return Err(format!("children of {} are not sorted", render_key(&node.key)));
        }
        previous_label = Some(label);
        found += check(child, false)?;
    }
    if found == node.count {
        Ok(found)
    } else {
        Err(format!(
            "node {} records {} values but holds {found}",
            render_key(&node.key),
            node.count
        ))
    }
}

/// A persistent (immutable) ordered map from byte strings to values, stored
/// as a path-compressed radix-256 trie.
///
/// # Time Complexity
///
/// | Operation     | Complexity                    |
/// |---------------|-------------------------------|
/// | `get`         | O(key length × log 256)       |
/// | `set`         | O(key length × fan-out)       |
/// | `delete`      | O(key length × fan-out)       |
/// | `len`         | O(1)                          |
///
/// # Examples
///
/// ```rust
/// use immutrie::persistent::RadixTrie;
///
/// let (trie, previous) = RadixTrie::new().set(b"key", 1);
/// assert_eq!(previous, None);
///
/// let (updated, previous) = trie.set(b"key", 2);
/// assert_eq!(previous, Some(1));
/// assert_eq!(trie.get(b"key"), Some(&1)); // Original unchanged
/// assert_eq!(updated.get(b"key"), Some(&2));
/// ```
pub struct RadixTrie<V> {
    /// Root node for the empty prefix, `None` for the empty trie
    root: Option<Link<V>>,
    /// Number of entries
    length: usize,
}

impl<V> RadixTrie<V> {
    /// Creates a new empty trie.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Returns the empty trie. Same as [`RadixTrie::new`].
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self::new()
    }

    /// Returns the number of entries in the trie.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the trie contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::RadixTrie;
    ///
    /// let trie = RadixTrie::new().insert(b"abc", 1);
    /// assert_eq!(trie.get(b"abc"), Some(&1));
    /// assert_eq!(trie.get(b"ab"), None);
    /// assert_eq!(trie.get(b"abcd"), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let mut node = self.root.as_deref()?;
        loop {
            let depth = node.key.len();
            if depth == key.len() {
                return node.value.as_ref();
            }
            let child = node.child(key[depth])?;
            if !key.starts_with(&child.key) {
                return None;
            }
            node = child;
        }
    }

    /// Returns `true` if the trie contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<(&[u8], &V)> {
        self.iter().next()
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<(&[u8], &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(child) = node.children.last() {
            node = child;
        }
        node.value.as_ref().map(|value| (&*node.key, value))
    }

    /// Returns an iterator over the entries in ascending key order.
    #[must_use]
    pub fn iter(&self) -> RadixTrieIterator<'_, V> {
        RadixTrieIterator {
            pending: self.root.as_deref().into_iter().collect(),
            remaining: self.length,
        }
    }

    /// Returns an iterator over the entries whose key is greater than or
    /// equal to `bound`, in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::RadixTrie;
    ///
    /// let trie = RadixTrie::new()
    ///     .insert(b"a", 1)
    ///     .insert(b"ab", 2)
    ///     .insert(b"b", 3);
    ///
    /// let values: Vec<&i32> = trie.range_from(b"aa").map(|(_, value)| value).collect();
    /// assert_eq!(values, vec![&2, &3]);
    /// ```
    #[must_use]
    pub fn range_from(&self, bound: &[u8]) -> RadixTrieIterator<'_, V> {
        let mut pending = Vec::new();
        let Some(mut node) = self.root.as_deref() else {
            return RadixTrieIterator::over(pending);
        };
        loop {
            let shared = shared_length(&node.key, bound);
            if shared == node.key.len() {
                if shared == bound.len() {
                    pending.push(node);
                    break;
                }
                let byte = bound[shared];
                let greater = node
                    .children
                    .partition_point(|child| child.key[shared] <= byte);
                pending.extend(node.children[greater..].iter().rev().map(|child| &**child));
                match node.child(byte) {
                    Some(child) => node = child,
                    None => break,
                }
            } else {
                // `node.key` and `bound` part ways inside this node's prefix
                if shared == bound.len() || node.key[shared] > bound[shared] {
                    pending.push(node);
                }
                break;
            }
        }
        RadixTrieIterator::over(pending)
    }

    /// Returns an iterator over the entries whose key starts with `prefix`,
    /// in ascending key order.
    pub fn prefixed<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a V)> + 'a {
        self.range_from(prefix)
            .take_while(move |(key, _)| key.starts_with(prefix))
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Calls `visitor` on each entry in ascending key order, starting at the
    /// first key not less than `from` when a bound is given.
    ///
    /// The traversal stops as soon as `visitor` returns `false`.
    pub fn visit_ascend<F>(&self, from: Option<&[u8]>, mut visitor: F)
    where
        F: FnMut(&[u8], &V) -> bool,
    {
        let entries = match from {
            Some(bound) => self.range_from(bound),
            None => self.iter(),
        };
        for (key, value) in entries {
            if !visitor(key, value) {
                break;
            }
        }
    }

    /// Returns `true` if both tries share the same root node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Renders the node structure as an indented outline.
    ///
    /// Each line shows a node's full prefix in hex, followed by `value` when
    /// the node holds one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::RadixTrie;
    ///
    /// let trie = RadixTrie::new()
    ///     .insert(&[0x01, 0x02], 1)
    ///     .insert(&[0x01, 0x03], 2);
    ///
    /// assert_eq!(
    ///     trie.dump(),
    ///     "[]\n  [01]\n    [01 02] value\n    [01 03] value\n"
    /// );
    /// ```
    #[must_use]
    pub fn dump(&self) -> String {
        let mut output = String::new();
        match &self.root {
            Some(root) => dump(root, 0, &mut output),
            None => output.push_str("empty\n"),
        }
        output
    }

    /// Verifies the structural invariants of the trie.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violation found.
    #[doc(hidden)]
    pub fn check_invariants(&self) -> Result<(), String> {
        let found = match &self.root {
            Some(root) if !root.key.is_empty() => {
                return Err(format!("root holds prefix {}", render_key(&root.key)));
            }
            Some(root) if root.value.is_none() && root.children.is_empty() => {
                return Err("root is empty but present".to_string());
            }
            Some(root) => check(root, true)?,
            None => 0,
        };
        if found == self.length {
            Ok(())
        } else {
            Err(format!("trie records {} entries but holds {found}", self.length))
        }
    }
}

impl<V: Clone> RadixTrie<V> {
    /// Creates a trie containing a single entry.
    #[inline]
    #[must_use]
    pub fn singleton(key: &[u8], value: V) -> Self {
        Self::new().insert(key, value)
    }

    /// Returns a trie with `key` set to `value`, together with the value
    /// `key` held before, if any.
    ///
    /// The key is copied into the trie.
    #[must_use]
    pub fn set(&self, key: &[u8], value: V) -> (Self, Option<V>) {
        let (root, previous) = match &self.root {
            Some(root) => set_in(root, key, value),
            None => {
                let empty = Node::new(ReferenceCounter::from(&[][..]), None, Vec::new());
                set_in(&empty, key, value)
            }
        };
        let length = if previous.is_some() {
            self.length
        } else {
            self.length + 1
        };
        let trie = Self {
            root: Some(ReferenceCounter::new(root)),
            length,
        };
        (trie, previous)
    }

    /// Returns a trie with `key` set to `value`, discarding any previous
    /// value.
    #[must_use]
    pub fn insert(&self, key: &[u8], value: V) -> Self {
        self.set(key, value).0
    }

    /// Returns a trie without `key`, together with the value it held.
    ///
    /// When `key` is absent the returned trie shares this trie's root.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::RadixTrie;
    ///
    /// let trie = RadixTrie::new().insert(b"ab", 1).insert(b"ac", 2);
    /// let (removed, previous) = trie.delete(b"ab");
    /// assert_eq!(previous, Some(1));
    /// assert_eq!(removed.len(), 1);
    ///
    /// let (same, previous) = removed.delete(b"zz");
    /// assert_eq!(previous, None);
    /// assert!(same.ptr_eq(&removed));
    /// ```
    #[must_use]
    pub fn delete(&self, key: &[u8]) -> (Self, Option<V>) {
        let Some((root, previous)) = self.root.as_deref().and_then(|root| delete_in(root, key))
        else {
            return (self.clone(), None);
        };
        let root = (root.value.is_some() || !root.children.is_empty())
            .then(|| ReferenceCounter::new(root));
        let trie = Self {
            root,
            length: self.length - 1,
        };
        (trie, Some(previous))
    }

    /// Returns a trie without `key`, discarding the removed value.
    #[must_use]
    pub fn remove(&self, key: &[u8]) -> Self {
        self.delete(key).0
    }
}

// =============================================================================
// Iterator
// =============================================================================

/// A lazy ascending iterator over the entries of a [`RadixTrie`].
pub struct RadixTrieIterator<'a, V> {
    /// Subtrees still to visit, smallest on top.
    pending: Vec<&'a Node<V>>,
    remaining: usize,
}

impl<'a, V> RadixTrieIterator<'a, V> {
    fn over(pending: Vec<&'a Node<V>>) -> Self {
        let remaining = pending.iter().map(|node| node.count).sum();
        Self { pending, remaining }
    }
}

impl<'a, V> Iterator for RadixTrieIterator<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = self.pending.pop()?;
            self.pending
                .extend(node.children.iter().rev().map(|child| &**child));
            if let Some(value) = &node.value {
                self.remaining -= 1;
                return Some((&*node.key, value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for RadixTrieIterator<'_, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<V> std::iter::FusedIterator for RadixTrieIterator<'_, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<V> Clone for RadixTrie<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
        }
    }
}

impl<V> Default for RadixTrie<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AsRef<[u8]>, V: Clone> FromIterator<(K, V)> for RadixTrie<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |trie, (key, value)| trie.insert(key.as_ref(), value))
    }
}

impl<'a, V> IntoIterator for &'a RadixTrie<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = RadixTrieIterator<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: PartialEq> PartialEq for RadixTrie<V> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<V: Eq> Eq for RadixTrie<V> {}

impl<V: Hash> Hash for RadixTrie<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for RadixTrie<V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(RadixTrie<i32>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(RadixTrie<i32>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<V: serde::Serialize> serde::Serialize for RadixTrie<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
struct RadixTrieVisitor<V> {
    value_marker: std::marker::PhantomData<V>,
}

#[cfg(feature = "serde")]
impl<'de, V> serde::de::Visitor<'de> for RadixTrieVisitor<V>
where
    V: serde::Deserialize<'de> + Clone,
{
    type Value = RadixTrie<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of (key bytes, value) pairs")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut trie = RadixTrie::new();
        while let Some((key, value)) = access.next_element::<(Vec<u8>, V)>()? {
            trie = trie.insert(&key, value);
        }
        Ok(trie)
    }
}

#[cfg(feature = "serde")]
impl<'de, V> serde::Deserialize<'de> for RadixTrie<V>
where
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(RadixTrieVisitor {
            value_marker: std::marker::PhantomData,
        })
    }
}
