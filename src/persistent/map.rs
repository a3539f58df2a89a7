//! A common interface over the persistent byte-keyed maps.
//!
//! [`ImmutableMap`] lets code be written once against either trie. Every
//! write returns a new map together with the value the key held before.

use super::{CritbitTrie, RadixTrie};
use crate::error::CollectionError;

/// An immutable map from byte strings to values.
///
/// # Examples
///
/// ```rust
/// use immutrie::persistent::{CritbitTrie, ImmutableMap, RadixTrie};
///
/// fn count_hits<M: ImmutableMap<Value = u32>>(map: M, key: &[u8]) -> M {
///     let hits = map.get(key).copied().unwrap_or(0);
///     map.set(key, hits + 1).0
/// }
///
/// let critbit = count_hits(count_hits(CritbitTrie::new(), b"page"), b"page");
/// let radix = count_hits(count_hits(RadixTrie::new(), b"page"), b"page");
/// assert_eq!(critbit.get(b"page"), Some(&2));
/// assert_eq!(radix.get(b"page"), Some(&2));
/// ```
pub trait ImmutableMap: Sized {
    /// The type of the stored values.
    type Value;

    /// Returns a map with `key` set to `value`, together with the value
    /// `key` held before, if any.
    #[must_use]
    fn set(&self, key: &[u8], value: Self::Value) -> (Self, Option<Self::Value>);

    /// Returns a reference to the value stored under `key`.
    fn get(&self, key: &[u8]) -> Option<&Self::Value>;

    /// Returns a map without `key`, together with the value it held.
    #[must_use]
    fn delete(&self, key: &[u8]) -> (Self, Option<Self::Value>);

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the map contains no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets `key` to a value that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::AbsentValue`] when `value` is `None`; a
    /// key can only be removed with [`ImmutableMap::delete`].
    fn try_set_optional(
        &self,
        key: &[u8],
        value: Option<Self::Value>,
    ) -> Result<(Self, Option<Self::Value>), CollectionError> {
        value
            .map(|value| self.set(key, value))
            .ok_or(CollectionError::AbsentValue)
    }

    /// Sets `key` to a value that may be absent.
    ///
    /// # Panics
    ///
    /// Panics with "value cannot be absent" when `value` is `None`.
    #[must_use]
    fn set_optional(&self, key: &[u8], value: Option<Self::Value>) -> (Self, Option<Self::Value>) {
        match self.try_set_optional(key, value) {
            Ok(result) => result,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<V: Clone> ImmutableMap for CritbitTrie<V> {
    type Value = V;

    fn set(&self, key: &[u8], value: V) -> (Self, Option<V>) {
        Self::set(self, key, value)
    }

    fn get(&self, key: &[u8]) -> Option<&V> {
        Self::get(self, key)
    }

    fn delete(&self, key: &[u8]) -> (Self, Option<V>) {
        Self::delete(self, key)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}

impl<V: Clone> ImmutableMap for RadixTrie<V> {
    type Value = V;

    fn set(&self, key: &[u8], value: V) -> (Self, Option<V>) {
        Self::set(self, key, value)
    }

    fn get(&self, key: &[u8]) -> Option<&V> {
        Self::get(self, key)
    }

    fn delete(&self, key: &[u8]) -> (Self, Option<V>) {
        Self::delete(self, key)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}
