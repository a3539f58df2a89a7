//! Persistent critical-bit trie keyed by byte strings.
//!
//! This module provides [`CritbitTrie`], an immutable ordered map from byte
//! strings to values. It is a binary PATRICIA trie: each internal node stores
//! only the position of the first bit at which its two subtrees differ, and
//! every leaf holds a full key and its value.
//!
//! # Overview
//!
//! - O(key length) get, set and delete, independent of the number of entries
//! - O(1) len and `is_empty`
//! - ascending iteration, optionally from an inclusive lower bound
//!
//! A write copies only the nodes between the root and the point of change;
//! all other subtrees are shared between the old and the new trie, so every
//! earlier handle stays valid and unchanged.
//!
//! # Examples
//!
//! ```rust
//! use immutrie::persistent::CritbitTrie;
//!
//! let trie = CritbitTrie::new();
//! let (trie, previous) = trie.set(b"apple", 1);
//! assert_eq!(previous, None);
//!
//! let (updated, previous) = trie.set(b"apple", 2);
//! assert_eq!(previous, Some(1));
//! assert_eq!(trie.get(b"apple"), Some(&1)); // Original unchanged
//! assert_eq!(updated.get(b"apple"), Some(&2));
//!
//! let (removed, previous) = updated.delete(b"apple");
//! assert_eq!(previous, Some(2));
//! assert!(removed.is_empty());
//! ```
//!
//! # Internal Structure
//!
//! For an internal node splitting at position `p`:
//! 1. It has exactly two children
//! 2. Every key under child 0 has a `0` at `p`, every key under child 1 a `1`
//! 3. The positions of its descendants all come after `p`
//! 4. Its count equals the number of leaves beneath it
//!
//! Positions are described by [`CriticalBit`]; see its documentation for how
//! keys of different lengths are compared.

mod bits;
mod iter;
mod node;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;

use self::node::{Link, Node};
use super::ReferenceCounter;

pub use self::bits::CriticalBit;
pub use self::iter::CritbitTrieIterator;

/// A persistent (immutable) ordered map from byte strings to values, stored
/// as a critical-bit trie.
///
/// Cloning a trie is O(1): the clone shares the root.
///
/// # Time Complexity
///
/// | Operation     | Complexity          |
/// |---------------|---------------------|
/// | `new`         | O(1)                |
/// | `get`         | O(key length)       |
/// | `set`         | O(key length)       |
/// | `delete`      | O(key length)       |
/// | `len`         | O(1)                |
/// | `range_from`  | O(bound length + k) |
///
/// # Examples
///
/// ```rust
/// use immutrie::persistent::CritbitTrie;
///
/// let trie: CritbitTrie<i32> = [
///     (b"b".as_slice(), 2),
///     (b"a".as_slice(), 1),
///     (b"c".as_slice(), 3),
/// ]
/// .into_iter()
/// .collect();
///
/// let keys: Vec<&[u8]> = trie.keys().collect();
/// assert_eq!(keys, vec![b"a".as_slice(), b"b", b"c"]);
/// ```
pub struct CritbitTrie<V> {
    /// Root node, `None` for the empty trie
    root: Option<Link<V>>,
    /// Number of entries
    length: usize,
}

impl<V> CritbitTrie<V> {
    /// Creates a new empty trie.
    ///
    /// This does not allocate; all empty tries are interchangeable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie: CritbitTrie<String> = CritbitTrie::new();
    /// assert!(trie.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Returns the empty trie. Same as [`CritbitTrie::new`].
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self::new()
    }

    /// Returns the number of entries in the trie.
    ///
    /// # Complexity
    ///
    /// O(1)
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
    /// The descent inspects only the critical bits on the way down; the full
    /// key is compared once, against the leaf it reaches.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie = CritbitTrie::new().insert(&[0x01, 0x02, 0x03], 123);
    /// assert_eq!(trie.get(&[0x01, 0x02, 0x03]), Some(&123));
    /// assert_eq!(trie.get(&[0x01, 0x02]), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let leaf = self.root.as_ref()?.best_leaf(key);
        (*leaf.key == *key).then_some(&leaf.value)
    }

    /// Returns `true` if the trie contains `key`.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<(&[u8], &V)> {
        self.root.as_ref().map(|root| {
            let leaf = root.first_leaf();
            (&*leaf.key, &leaf.value)
        })
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<(&[u8], &V)> {
        self.root.as_ref().map(|root| {
            let leaf = root.last_leaf();
            (&*leaf.key, &leaf.value)
        })
    }

    /// Returns an iterator over the entries in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie = CritbitTrie::new()
    ///     .insert(&[0x01, 0x02, 0x03], 123)
    ///     .insert(&[0x01, 0x02], 12);
    ///
    /// let entries: Vec<(&[u8], &i32)> = trie.iter().collect();
    /// assert_eq!(entries[0], ([0x01u8, 0x02].as_slice(), &12));
    /// assert_eq!(entries[1], ([0x01u8, 0x02, 0x03].as_slice(), &123));
    /// ```
    #[must_use]
    pub fn iter(&self) -> CritbitTrieIterator<'_, V> {
        CritbitTrieIterator::new(self.root.as_deref())
    }

    /// Returns an iterator over the entries whose key is greater than or
    /// equal to `bound`, in ascending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie = CritbitTrie::new()
    ///     .insert(b"1", 1)
    ///     .insert(b"2", 2)
    ///     .insert(b"3", 3);
    ///
    /// let values: Vec<&i32> = trie.range_from(b"2").map(|(_, value)| value).collect();
    /// assert_eq!(values, vec![&2, &3]);
    /// ```
    #[must_use]
    pub fn range_from(&self, bound: &[u8]) -> CritbitTrieIterator<'_, V> {
        CritbitTrieIterator::seek(self.root.as_deref(), bound)
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
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie = CritbitTrie::new()
    ///     .insert(&[0x01, 0x02, 0x03, 0x04], 1234)
    ///     .insert(&[0x01, 0x02, 0x03, 0x05], 1235)
    ///     .insert(&[0x01, 0x02, 0x03, 0x06], 1236);
    ///
    /// let mut visited = Vec::new();
    /// trie.visit_ascend(None, |key, value| {
    ///     visited.push(*value);
    ///     key != [0x01, 0x02, 0x03, 0x05]
    /// });
    /// assert_eq!(visited, vec![1234, 1235]);
    /// ```
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
    ///
    /// A delete that finds nothing returns a trie for which this holds.
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
    /// Internal nodes show their critical bit and leaf count; leaves show
    /// their key in hex.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie = CritbitTrie::new()
    ///     .insert(&[0x01, 0x02, 0x03], 123)
    ///     .insert(&[0x01, 0x02, 0x02], 122);
    ///
    /// assert_eq!(
    ///     trie.dump(),
    ///     "node [2] 0xfe count=2\n  leaf [01 02 02]\n  leaf [01 02 03]\n"
    /// );
    /// ```
    #[must_use]
    pub fn dump(&self) -> String {
        let mut output = String::new();
        match &self.root {
            Some(root) => node::dump(root, 0, &mut output),
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
            Some(root) => node::check(root, &mut Vec::new())?,
            None => 0,
        };
        if found == self.length {
            Ok(())
        } else {
            Err(format!("trie records {} entries but holds {found}", self.length))
        }
    }

    #[cfg(test)]
    fn root_critical_bit(&self) -> Option<CriticalBit> {
        match self.root.as_deref()? {
            Node::Internal(internal) => Some(internal.critical),
            Node::Leaf(_) => None,
        }
    }
}

impl<V: Clone> CritbitTrie<V> {
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
    ///
    /// # Complexity
    ///
    /// O(key length)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let (trie, previous) = CritbitTrie::new().set(&[0x01, 0x02, 0x03], 123);
    /// assert_eq!(previous, None);
    /// assert_eq!(trie.len(), 1);
    ///
    /// let (trie, previous) = trie.set(&[0x01, 0x02], 12);
    /// assert_eq!(previous, None);
    /// assert_eq!(trie.len(), 2);
    /// assert_eq!(trie.get(&[0x01, 0x02]), Some(&12));
    /// assert_eq!(trie.get(&[0x01, 0x02, 0x03]), Some(&123));
    /// ```
    #[must_use]
    pub fn set(&self, key: &[u8], value: V) -> (Self, Option<V>) {
        let Some(root) = &self.root else {
            return (
                Self {
                    root: Some(Node::leaf(key, value)),
                    length: 1,
                },
                None,
            );
        };

        let best = root.best_leaf(key);
        match CriticalBit::locate(key, &best.key) {
            None => {
                let previous = best.value.clone();
                let trie = Self {
                    root: Some(node::replace_value(root, key, value)),
                    length: self.length,
                };
                (trie, Some(previous))
            }
            Some(critical) => {
                let trie = Self {
                    root: Some(node::insert_leaf(root, key, value, critical)),
                    length: self.length + 1,
                };
                (trie, None)
            }
        }
    }

    /// Returns a trie with `key` set to `value`, discarding any previous
    /// value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie1 = CritbitTrie::new().insert(b"key", 1);
    /// let trie2 = trie1.insert(b"key", 2);
    ///
    /// assert_eq!(trie1.get(b"key"), Some(&1)); // Original unchanged
    /// assert_eq!(trie2.get(b"key"), Some(&2));
    /// ```
    #[must_use]
    pub fn insert(&self, key: &[u8], value: V) -> Self {
        self.set(key, value).0
    }

    /// Returns a trie without `key`, together with the value it held.
    ///
    /// When `key` is absent the returned trie shares this trie's root and
    /// the previous value is `None`.
    ///
    /// # Complexity
    ///
    /// O(key length)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::CritbitTrie;
    ///
    /// let trie = CritbitTrie::new()
    ///     .insert(&[0x01, 0x02, 0x03], 123)
    ///     .insert(&[0x01, 0x02, 0x04], 124)
    ///     .insert(&[0x01, 0x03, 0x03], 133);
    ///
    /// let (removed, previous) = trie.delete(&[0x01, 0x02, 0x04]);
    /// assert_eq!(previous, Some(124));
    /// assert_eq!(removed.len(), 2);
    /// assert_eq!(removed.get(&[0x01, 0x02, 0x04]), None);
    /// assert_eq!(trie.get(&[0x01, 0x02, 0x04]), Some(&124)); // Original unchanged
    /// ```
    #[must_use]
    pub fn delete(&self, key: &[u8]) -> (Self, Option<V>) {
        let Some(root) = &self.root else {
            return (self.clone(), None);
        };

        let best = root.best_leaf(key);
        if *best.key != *key {
            return (self.clone(), None);
        }
        let previous = best.value.clone();
        let trie = Self {
            root: node::remove_leaf(root, key),
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
// Standard Trait Implementations
// =============================================================================

impl<V> Clone for CritbitTrie<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
        }
    }
}

impl<V> Drop for CritbitTrie<V> {
    fn drop(&mut self) {
        node::release(self.root.take());
    }
}

impl<V> Default for CritbitTrie<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AsRef<[u8]>, V: Clone> FromIterator<(K, V)> for CritbitTrie<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |trie, (key, value)| trie.insert(key.as_ref(), value))
    }
}

impl<'a, V> IntoIterator for &'a CritbitTrie<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = CritbitTrieIterator<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: PartialEq> PartialEq for CritbitTrie<V> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<V: Eq> Eq for CritbitTrie<V> {}

impl<V: Hash> Hash for CritbitTrie<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for CritbitTrie<V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(CritbitTrie<i32>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(CritbitTrie<i32>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<V: serde::Serialize> serde::Serialize for CritbitTrie<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
struct CritbitTrieVisitor<V> {
    value_marker: std::marker::PhantomData<V>,
}

#[cfg(feature = "serde")]
impl<'de, V> serde::de::Visitor<'de> for CritbitTrieVisitor<V>
where
    V: serde::Deserialize<'de> + Clone,
{
    type Value = CritbitTrie<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of (key bytes, value) pairs")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut trie = CritbitTrie::new();
        while let Some((key, value)) = access.next_element::<(Vec<u8>, V)>()? {
            trie = trie.insert(&key, value);
        }
        Ok(trie)
    }
}

#[cfg(feature = "serde")]
impl<'de, V> serde::Deserialize<'de> for CritbitTrie<V>
where
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(CritbitTrieVisitor {
            value_marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
