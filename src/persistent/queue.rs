//! Persistent copy-on-write FIFO queue.
//!
//! This module provides [`PersistentQueue`], a queue made of two immutable
//! linked stacks: items are popped from the *front* stack and pushed onto the
//! *back* stack. When the front runs out, the back is reversed into a new
//! front, so every item is reversed at most once over its lifetime.
//!
//! A [`PeekCursor`] walks a snapshot of the queue without popping. A cursor
//! stays usable on any later snapshot derived from the one that created it:
//! every node carries a sequence number, and every rebuild of the front stack
//! bumps the queue's generation, so a cursor can tell when it has to find its
//! node again.
//!
//! # Examples
//!
//! ```rust
//! use immutrie::persistent::PersistentQueue;
//!
//! let queue = PersistentQueue::new().push(10).push(11).push(12);
//!
//! let (rest, first) = queue.pop().unwrap();
//! assert_eq!(first, 10);
//! assert_eq!(rest.len(), 2);
//! assert_eq!(queue.len(), 3); // Original unchanged
//! ```

use std::fmt;
use std::iter::FromIterator;

use super::ReferenceCounter;
use crate::error::CollectionError;

type Link<T> = ReferenceCounter<Node<T>>;

struct Node<T> {
    value: T,
    next: Option<Link<T>>,
    /// A newly pushed node always has the highest sequence in the queue.
    sequence: usize,
}

/// Copies the stack starting at `node` in reverse order.
fn reverse<T: Clone>(mut node: Option<&Node<T>>) -> Option<Link<T>> {
    let mut reversed = None;
    while let Some(current) = node {
        reversed = Some(ReferenceCounter::new(Node {
            value: current.value.clone(),
            next: reversed,
            sequence: current.sequence,
        }));
        node = current.next.as_deref();
    }
    reversed
}

/// Copies the stack starting at `top` so that it ends in `bottom`.
fn rebuild_onto<T: Clone>(top: Option<&Node<T>>, bottom: Option<Link<T>>) -> Option<Link<T>> {
    let mut copied = Vec::new();
    let mut node = top;
    while let Some(current) = node {
        copied.push(current);
        node = current.next.as_deref();
    }
    copied.into_iter().rev().fold(bottom, |next, current| {
        Some(ReferenceCounter::new(Node {
            value: current.value.clone(),
            next,
            sequence: current.sequence,
        }))
    })
}

/// Drops a stack link by link instead of recursively.
fn release<T>(mut link: Option<Link<T>>) {
    while let Some(node) = link {
        match ReferenceCounter::try_unwrap(node) {
            Ok(mut node) => link = node.next.take(),
            Err(_) => break,
        }
    }
}

/// A persistent (immutable) first-in first-out queue.
///
/// # Time Complexity
///
/// | Operation   | Complexity                   |
/// |-------------|------------------------------|
/// | `push`      | O(1)                         |
/// | `pop`       | O(1) amortized, O(n) rebuild |
/// | `len`       | O(1)                         |
/// | `peek`      | O(1)                         |
/// | `peek_next` | O(1) amortized, O(n) rebuild |
///
/// # Examples
///
/// ```rust
/// use immutrie::persistent::PersistentQueue;
///
/// let queue: PersistentQueue<i32> = (1..=3).collect();
/// let pushed = queue.push(4);
///
/// let items: Vec<&i32> = pushed.iter().collect();
/// assert_eq!(items, vec![&1, &2, &3, &4]);
/// ```
pub struct PersistentQueue<T> {
    /// Stack popped from; `None` only when the queue is empty
    front: Option<Link<T>>,
    /// Stack pushed onto, newest item on top
    back: Option<Link<T>>,
    /// Incremented every time the front stack is rebuilt
    generation: u64,
    /// Most recently issued sequence number
    last_sequence: usize,
}

/// A position in a [`PersistentQueue`] snapshot, produced by
/// [`PersistentQueue::peek`] and advanced by [`PersistentQueue::peek_next`].
///
/// A cursor past the end of the queue has no value.
pub struct PeekCursor<T> {
    current: Option<Link<T>>,
    generation: u64,
}

impl<T> PeekCursor<T> {
    const fn end(generation: u64) -> Self {
        Self {
            current: None,
            generation,
        }
    }

    /// Returns the item under the cursor.
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.current.as_ref().map(|node| &node.value)
    }

    /// Returns `true` if the cursor points at an item.
    #[inline]
    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the generation of the queue this cursor was produced from.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> Clone for PeekCursor<T> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            generation: self.generation,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PeekCursor<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PeekCursor")
            .field("value", &self.value())
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> PersistentQueue<T> {
    /// Creates a new empty queue.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            front: None,
            back: None,
            generation: 0,
            last_sequence: 0,
        }
    }

    /// Returns a queue with `value` added at the end.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn push(&self, value: T) -> Self {
        let sequence = self.last_sequence + 1;
        let (front, back) = if self.front.is_none() {
            (
                Some(ReferenceCounter::new(Node {
                    value,
                    next: None,
                    sequence,
                })),
                self.back.clone(),
            )
        } else {
            (
                self.front.clone(),
                Some(ReferenceCounter::new(Node {
                    value,
                    next: self.back.clone(),
                    sequence,
                })),
            )
        };
        Self {
            front,
            back,
            generation: self.generation,
            last_sequence: sequence,
        }
    }

    /// Returns the number of items in the queue.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.front
            .as_ref()
            .map_or(0, |front| self.last_sequence - front.sequence + 1)
    }

    /// Returns `true` if the queue contains no items.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.front.is_none()
    }

    /// Returns the generation of this snapshot.
    ///
    /// The generation grows by one every time the front stack is rebuilt
    /// from the back stack.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns a reference to the item that would be popped next.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.front.as_ref().map(|node| &node.value)
    }

    /// Returns a cursor at the head of the queue.
    ///
    /// The cursor has no value when the queue is empty.
    #[must_use]
    pub fn peek(&self) -> PeekCursor<T> {
        PeekCursor {
            current: self.front.clone(),
            generation: self.generation,
        }
    }

    /// Returns an iterator over the items from oldest to newest.
    #[must_use]
    pub fn iter(&self) -> PersistentQueueIterator<'_, T> {
        let mut back = Vec::new();
        let mut node = self.back.as_deref();
        while let Some(current) = node {
            back.push(&current.value);
            node = current.next.as_deref();
        }
        PersistentQueueIterator {
            front: self.front.as_deref(),
            back,
            remaining: self.len(),
        }
    }

    fn find(&self, sequence: usize) -> Option<&Link<T>> {
        let mut node = self.front.as_ref();
        while let Some(current) = node {
            if current.sequence == sequence {
                return Some(current);
            }
            node = current.next.as_ref();
        }
        None
    }
}

impl<T: Clone> PersistentQueue<T> {
    /// Returns the queue without its oldest item, together with that item.
    ///
    /// Returns `None` if the queue is empty. Popping the last item of the
    /// front stack reverses the back stack into a new front and starts a new
    /// generation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::PersistentQueue;
    ///
    /// let queue = PersistentQueue::new().push(1).push(2);
    /// let (queue, first) = queue.pop().unwrap();
    /// let (queue, second) = queue.pop().unwrap();
    /// assert_eq!((first, second), (1, 2));
    /// assert!(queue.pop().is_none());
    /// ```
    #[must_use]
    pub fn pop(&self) -> Option<(Self, T)> {
        let front = self.front.as_ref()?;
        let value = front.value.clone();

        let queue = if front.next.is_some() {
            Self {
                front: front.next.clone(),
                back: self.back.clone(),
                generation: self.generation,
                last_sequence: self.last_sequence,
            }
        } else {
            let rebuilt = reverse(self.back.as_deref());
            let generation = self.generation + 1;
            tracing::trace!(generation, "rebuilt queue front from back stack");
            Self {
                front: rebuilt,
                back: None,
                generation,
                last_sequence: self.last_sequence,
            }
        };
        Some((queue, value))
    }

    /// Advances `cursor` by one item.
    ///
    /// Returns the advanced cursor together with the queue to continue with,
    /// which has its front stack rebuilt when the cursor walked off the end
    /// of it. A cursor whose item has since been popped restarts at the head.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::GenerationMismatch`] if the cursor comes
    /// from a newer generation than this queue.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutrie::persistent::PersistentQueue;
    ///
    /// let mut queue = PersistentQueue::new().push(1).push(2).push(3);
    /// let mut cursor = queue.peek();
    /// let mut seen = Vec::new();
    /// while let Some(value) = cursor.value() {
    ///     seen.push(*value);
    ///     (cursor, queue) = queue.try_peek_next(&cursor).unwrap();
    /// }
    /// assert_eq!(seen, vec![1, 2, 3]);
    /// ```
    pub fn try_peek_next(
        &self,
        cursor: &PeekCursor<T>,
    ) -> Result<(PeekCursor<T>, Self), CollectionError> {
        if cursor.generation > self.generation {
            return Err(CollectionError::GenerationMismatch {
                cursor: cursor.generation,
                queue: self.generation,
            });
        }
        let (Some(front), Some(mut current)) = (self.front.as_ref(), cursor.current.as_ref())
        else {
            return Ok((PeekCursor::end(self.generation), self.clone()));
        };

        if current.sequence < front.sequence {
            return Ok((self.peek(), self.clone()));
        }
        if cursor.generation < self.generation
            && let Some(found) = self.find(current.sequence)
        {
            current = found;
        }

        if let Some(next) = &current.next {
            let advanced = PeekCursor {
                current: Some(next.clone()),
                generation: self.generation,
            };
            return Ok((advanced, self.clone()));
        }

        if self.back.is_none() {
            return Ok((PeekCursor::end(self.generation), self.clone()));
        }
        let bottom = reverse(self.back.as_deref());
        let generation = self.generation + 1;
        tracing::trace!(generation, "rebuilt queue front while peeking");
        let queue = Self {
            front: rebuild_onto(self.front.as_deref(), bottom.clone()),
            back: None,
            generation,
            last_sequence: self.last_sequence,
        };
        let advanced = PeekCursor {
            current: bottom,
            generation,
        };
        Ok((advanced, queue))
    }

    /// Advances `cursor` by one item.
    ///
    /// # Panics
    ///
    /// Panics if the cursor comes from a newer generation than this queue.
    /// See [`PersistentQueue::try_peek_next`] for the fallible version.
    #[must_use]
    pub fn peek_next(&self, cursor: &PeekCursor<T>) -> (PeekCursor<T>, Self) {
        match self.try_peek_next(cursor) {
            Ok(advanced) => advanced,
            Err(error) => panic!("{error}"),
        }
    }
}

// =============================================================================
// Iterator
// =============================================================================

/// An iterator over the items of a [`PersistentQueue`], oldest first.
pub struct PersistentQueueIterator<'a, T> {
    front: Option<&'a Node<T>>,
    /// Back stack items, oldest on top.
    back: Vec<&'a T>,
    remaining: usize,
}

impl<'a, T> Iterator for PersistentQueueIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.front {
            Some(node) => {
                self.front = node.next.as_deref();
                &node.value
            }
            None => self.back.pop()?,
        };
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for PersistentQueueIterator<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> std::iter::FusedIterator for PersistentQueueIterator<'_, T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for PersistentQueue<T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.clone(),
            generation: self.generation,
            last_sequence: self.last_sequence,
        }
    }
}

impl<T> Drop for PersistentQueue<T> {
    fn drop(&mut self) {
        release(self.front.take());
        release(self.back.take());
    }
}

impl<T> Default for PersistentQueue<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for PersistentQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        let last_sequence = items.len();
        let front = items
            .into_iter()
            .enumerate()
            .rev()
            .fold(None, |next, (position, value)| {
                Some(ReferenceCounter::new(Node {
                    value,
                    next,
                    sequence: position + 1,
                }))
            });
        Self {
            front,
            back: None,
            generation: 0,
            last_sequence,
        }
    }
}

impl<'a, T> IntoIterator for &'a PersistentQueue<T> {
    type Item = &'a T;
    type IntoIter = PersistentQueueIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for PersistentQueue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for PersistentQueue<T> {}

impl<T: fmt::Debug> fmt::Debug for PersistentQueue<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PersistentQueue<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for PersistentQueue<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <Vec<T> as serde::Deserialize>::deserialize(deserializer).map(Self::from_iter)
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentQueue<i32>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentQueue<i32>: Send, Sync);
