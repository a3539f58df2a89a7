//! Persistent (immutable) data structures.
//!
//! This module provides immutable collections that share structure between
//! versions, so every write returns a new value and leaves the old one intact:
//!
//! - [`CritbitTrie`]: Ordered byte-string map (critical-bit trie)
//! - [`RadixTrie`]: Ordered byte-string map (path-compressed radix-256 trie)
//! - [`PersistentList`]: Persistent singly-linked list
//! - [`PersistentQueue`]: Persistent FIFO queue with resumable peeking
//! - [`ImmutableMap`]: Common interface over both tries
//!
//! # Examples
//!
//! ## `CritbitTrie`
//!
//! ```rust
//! use immutrie::persistent::CritbitTrie;
//!
//! let trie = CritbitTrie::new()
//!     .insert(b"one", 1)
//!     .insert(b"two", 2);
//! assert_eq!(trie.get(b"one"), Some(&1));
//!
//! // Structural sharing: the original trie is preserved
//! let updated = trie.insert(b"one", 100);
//! assert_eq!(trie.get(b"one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get(b"one"), Some(&100)); // New version
//! ```
//!
//! ## `PersistentQueue`
//!
//! ```rust
//! use immutrie::persistent::PersistentQueue;
//!
//! let queue = PersistentQueue::new().push(1).push(2);
//! let (rest, first) = queue.pop().unwrap();
//! assert_eq!(first, 1);
//! assert_eq!(rest.len(), 1);
//! assert_eq!(queue.len(), 2); // Original unchanged
//! ```

use std::fmt::Write as _;

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod critbit;
mod list;
mod map;
mod queue;
mod radix;

pub use critbit::CritbitTrie;
pub use critbit::CritbitTrieIterator;
pub use critbit::CriticalBit;
pub use list::PersistentList;
pub use list::PersistentListIntoIterator;
pub use list::PersistentListIterator;
pub use map::ImmutableMap;
pub use queue::PeekCursor;
pub use queue::PersistentQueue;
pub use queue::PersistentQueueIterator;
pub use radix::RadixTrie;
pub use radix::RadixTrieIterator;

/// Formats a key as space-separated hex bytes in brackets, e.g. `[01 ff]`.
pub(crate) fn render_key(key: &[u8]) -> String {
    let mut rendered = String::with_capacity(key.len() * 3 + 2);
    rendered.push('[');
    for (position, byte) in key.iter().enumerate() {
        if position > 0 {
            rendered.push(' ');
        }
        let _ = write!(rendered, "{byte:02x}");
    }
    rendered.push(']');
    rendered
}

// =============================================================================
// Tests
// =============================================================================
