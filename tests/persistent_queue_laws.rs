//! Property-based tests for PersistentQueue, checked against `VecDeque`.

use std::collections::VecDeque;

use immutrie::persistent::PersistentQueue;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Operation {
    Push(i32),
    Pop,
    /// Walks every item with a peek cursor and continues with the queue the
    /// walk hands back.
    PeekWalk,
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => any::<i32>().prop_map(Operation::Push),
        2 => Just(Operation::Pop),
        1 => Just(Operation::PeekWalk),
    ]
}

fn operations() -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(operation(), 0..64)
}

fn peek_walk(mut queue: PersistentQueue<i32>) -> (Vec<i32>, PersistentQueue<i32>) {
    let mut cursor = queue.peek();
    let mut seen = Vec::new();
    while let Some(value) = cursor.value() {
        seen.push(*value);
        (cursor, queue) = queue.peek_next(&cursor);
    }
    (seen, queue)
}

proptest! {
    #[test]
    fn prop_operations_match_model(operations in operations()) {
        let mut queue = PersistentQueue::new();
        let mut model = VecDeque::new();

        for operation in operations {
            match operation {
                Operation::Push(value) => {
                    queue = queue.push(value);
                    model.push_back(value);
                }
                Operation::Pop => match queue.pop() {
                    Some((rest, value)) => {
                        prop_assert_eq!(Some(value), model.pop_front());
                        queue = rest;
                    }
                    None => prop_assert!(model.is_empty()),
                },
                Operation::PeekWalk => {
                    let (seen, walked) = peek_walk(queue.clone());
                    prop_assert_eq!(&seen, &Vec::from(model.clone()));
                    prop_assert!(walked.generation() >= queue.generation());
                    queue = walked;
                }
            }

            prop_assert_eq!(queue.len(), model.len());
            prop_assert_eq!(queue.is_empty(), model.is_empty());
            prop_assert_eq!(queue.front(), model.front());
            prop_assert_eq!(queue.iter().len(), model.len());
            prop_assert!(queue.iter().eq(model.iter()));
        }

        let (seen, walked) = peek_walk(queue.clone());
        prop_assert_eq!(seen, Vec::from(model.clone()));
        prop_assert!(walked.iter().eq(model.iter()));
    }

    #[test]
    fn prop_older_cursor_resumes_on_derived_queue(
        operations in operations(),
        skipped in 0usize..8,
    ) {
        let mut queue = PersistentQueue::new();
        let mut model = VecDeque::new();
        for operation in operations {
            match operation {
                Operation::Push(value) => {
                    queue = queue.push(value);
                    model.push_back(value);
                }
                Operation::Pop => {
                    if let Some((rest, _)) = queue.pop() {
                        model.pop_front();
                        queue = rest;
                    }
                }
                Operation::PeekWalk => queue = peek_walk(queue).1,
            }
        }

        let mut cursor = queue.peek();
        for _ in 0..skipped {
            (cursor, queue) = queue.peek_next(&cursor);
        }
        let popped = queue.pop().map_or_else(|| queue.clone(), |(rest, _)| rest);

        // A cursor on the popped head restarts at the new head; any other
        // cursor moves one item on.
        let advanced = popped.try_peek_next(&cursor);
        prop_assert!(advanced.is_ok());
        let (advanced, _) = advanced.unwrap();
        prop_assert_eq!(advanced.value(), model.get(skipped + 1));
    }

    #[test]
    fn prop_pop_leaves_original_untouched(elements in prop::collection::vec(any::<i32>(), 0..32)) {
        let queue: PersistentQueue<i32> = elements.iter().copied().collect();
        let drained = std::iter::successors(queue.pop(), |(rest, _)| rest.pop())
            .map(|(_, value)| value)
            .collect::<Vec<_>>();
        prop_assert_eq!(&drained, &elements);
        prop_assert!(queue.iter().eq(elements.iter()));
        prop_assert_eq!(queue.len(), elements.len());
    }
}
