//! Unit tests for PersistentQueue and its peek cursors.

use immutrie::error::CollectionError;
use immutrie::persistent::{PeekCursor, PersistentQueue};
use rstest::rstest;

fn drain(queue: &PersistentQueue<i32>) -> Vec<i32> {
    let mut popped = Vec::with_capacity(queue.len());
    let mut current = queue.clone();
    while let Some((rest, value)) = current.pop() {
        popped.push(value);
        current = rest;
    }
    popped
}

fn peek_all(queue: &PersistentQueue<i32>) -> (Vec<i32>, PersistentQueue<i32>) {
    let mut seen = Vec::new();
    let mut queue = queue.clone();
    let mut cursor = queue.peek();
    while let Some(value) = cursor.value() {
        seen.push(*value);
        (cursor, queue) = queue.peek_next(&cursor);
    }
    (seen, queue)
}

// =============================================================================
// Push Tests
// =============================================================================

#[rstest]
fn test_push_single_item() {
    let queue = PersistentQueue::new();
    let pushed = queue.push(7);

    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed.peek().value(), Some(&7));
    assert_eq!(pushed.front(), Some(&7));
    assert!(queue.is_empty());
}

#[rstest]
fn test_push_multiple_items_pop_in_order() {
    let queue = PersistentQueue::new().push(7).push(8).push(9);
    assert_eq!(queue.len(), 3);
    assert_eq!(drain(&queue), vec![7, 8, 9]);
    assert_eq!(queue.len(), 3);
}

// =============================================================================
// Pop Tests
// =============================================================================

#[rstest]
fn test_pop_empty_queue() {
    let queue: PersistentQueue<i32> = PersistentQueue::new();
    assert!(queue.pop().is_none());
}

#[rstest]
fn test_pop_single_item() {
    let queue = PersistentQueue::new().push(10);
    let (rest, value) = queue.pop().unwrap();
    assert_eq!(value, 10);
    assert!(rest.is_empty());
    assert_eq!(queue.len(), 1);
}

#[rstest]
fn test_interleaved_push_and_pop() {
    let queue = PersistentQueue::new().push(1).push(2);
    let (queue, first) = queue.pop().unwrap();
    let queue = queue.push(3).push(4);
    let (queue, second) = queue.pop().unwrap();
    let queue = queue.push(5);

    assert_eq!((first, second), (1, 2));
    assert_eq!(queue.len(), 3);
    assert_eq!(drain(&queue), vec![3, 4, 5]);
}

#[rstest]
fn test_rebuild_does_not_duplicate_items() {
    let queue = PersistentQueue::new().push(1).push(2).push(3);
    let (queue, _) = queue.pop().unwrap();
    let queue = queue.push(4);
    assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(drain(&queue), vec![2, 3, 4]);
}

#[rstest]
fn test_pop_rebuild_starts_new_generation() {
    let queue = PersistentQueue::new().push(1).push(2);
    assert_eq!(queue.generation(), 0);
    let (queue, _) = queue.pop().unwrap();
    assert_eq!(queue.generation(), 1);
    let (queue, _) = queue.pop().unwrap();
    assert_eq!(queue.generation(), 2);
}

// =============================================================================
// Peek Tests
// =============================================================================

#[rstest]
fn test_peek_empty_queue() {
    let queue: PersistentQueue<i32> = PersistentQueue::new();
    let cursor = queue.peek();
    assert!(!cursor.has_value());
    assert_eq!(cursor.value(), None);
}

#[rstest]
fn test_peek_next_past_single_item() {
    let queue = PersistentQueue::new().push(12);
    let (cursor, rest) = queue.peek_next(&queue.peek());
    assert!(!cursor.has_value());
    assert_eq!(rest, queue);
    assert_eq!(rest.generation(), queue.generation());

    let (cursor, _) = rest.peek_next(&cursor);
    assert!(!cursor.has_value());
}

#[rstest]
fn test_peek_next_rebuilds_front() {
    let queue = PersistentQueue::new().push(17).push(18).push(19);
    let first = queue.peek();
    let (cursor, rebuilt) = queue.peek_next(&first);

    assert_eq!(cursor.value(), Some(&18));
    assert_eq!(rebuilt.generation(), queue.generation() + 1);
    assert_eq!(rebuilt, queue);
}

#[rstest]
fn test_old_cursor_is_relocated_in_rebuilt_queue() {
    let queue = PersistentQueue::new().push(17).push(18).push(19);
    let first = queue.peek();
    let (_, rebuilt) = queue.peek_next(&first);

    let (again, unchanged) = rebuilt.peek_next(&first);
    assert_eq!(again.value(), Some(&18));
    assert_eq!(unchanged.generation(), rebuilt.generation());
}

#[rstest]
fn test_cursor_on_popped_item_restarts_at_head() {
    let queue = PersistentQueue::new().push(17).push(18).push(19);
    let first = queue.peek();
    let (popped, _) = queue.pop().unwrap();
    let (popped, _) = popped.pop().unwrap();

    let (cursor, _) = popped.peek_next(&first);
    assert_eq!(cursor.value(), Some(&19));
}

#[rstest]
fn test_cursor_survives_pushes() {
    let queue: PersistentQueue<i32> = (1..=2).collect();
    let cursor = queue.peek();
    let (cursor, queue) = queue.peek_next(&cursor);
    assert_eq!(cursor.value(), Some(&2));

    let queue = queue.push(3).push(4);
    let (cursor, queue) = queue.peek_next(&cursor);
    assert_eq!(cursor.value(), Some(&3));
    let (cursor, _) = queue.peek_next(&cursor);
    assert_eq!(cursor.value(), Some(&4));
}

#[rstest]
fn test_cursor_from_newer_generation_is_rejected() {
    let queue = PersistentQueue::new().push(17).push(18).push(19);
    let (cursor, rebuilt) = queue.peek_next(&queue.peek());
    assert_eq!(rebuilt.generation(), 1);

    let error = queue.try_peek_next(&cursor).unwrap_err();
    assert_eq!(error, CollectionError::GenerationMismatch { cursor: 1, queue: 0 });
}

#[rstest]
#[should_panic(expected = "peek cursor generation 1 is newer than queue generation 0")]
fn test_peek_next_panics_on_newer_generation() {
    let queue = PersistentQueue::new().push(17).push(18).push(19);
    let (cursor, _) = queue.peek_next(&queue.peek());
    let _ = queue.peek_next(&cursor);
}

#[rstest]
fn test_cursor_clone_is_independent() {
    let queue: PersistentQueue<i32> = (1..=3).collect();
    let cursor: PeekCursor<i32> = queue.peek();
    let copy = cursor.clone();
    let (advanced, _) = queue.peek_next(&cursor);
    assert_eq!(copy.value(), Some(&1));
    assert_eq!(advanced.value(), Some(&2));
}

// =============================================================================
// Construction and Iteration Tests
// =============================================================================

#[rstest]
fn test_from_iterator_pops_in_order() {
    let queue: PersistentQueue<i32> = vec![1, 5, 2, 7, 4, 6].into_iter().collect();
    assert_eq!(queue.len(), 6);
    assert_eq!(drain(&queue), vec![1, 5, 2, 7, 4, 6]);
}

#[rstest]
fn test_from_iterator_peeks_in_order() {
    let queue: PersistentQueue<i32> = vec![1, 5, 2, 7, 4, 6].into_iter().collect();
    let (seen, rest) = peek_all(&queue);
    assert_eq!(seen, vec![1, 5, 2, 7, 4, 6]);
    assert_eq!(rest.generation(), 0);
}

#[rstest]
fn test_peek_all_across_back_stack() {
    let queue = (1..=5).fold(PersistentQueue::new(), |queue, value| queue.push(value));
    let (seen, rest) = peek_all(&queue);
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(rest.generation(), 1);
    assert_eq!(drain(&rest), vec![1, 2, 3, 4, 5]);
}

#[rstest]
fn test_iter_covers_both_stacks() {
    let queue: PersistentQueue<i32> = (1..=3).collect();
    let queue = queue.push(4).push(5);
    let iterator = queue.iter();
    assert_eq!(iterator.len(), 5);
    assert_eq!(iterator.copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
}

#[rstest]
fn test_debug_format() {
    let queue = PersistentQueue::new().push(1).push(2);
    assert_eq!(format!("{queue:?}"), "[1, 2]");
}
