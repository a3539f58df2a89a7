//! Tests for ascending traversal of CritbitTrie: `visit_ascend`, `iter` and
//! `range_from`.

use immutrie::persistent::CritbitTrie;
use rstest::rstest;

fn visit_to_vec<V>(trie: &CritbitTrie<V>, from: Option<&[u8]>) -> Vec<Vec<u8>> {
    let mut keys = Vec::with_capacity(trie.len());
    trie.visit_ascend(from, |key, _| {
        keys.push(key.to_vec());
        true
    });
    keys
}

fn trie_of(keys: &[&[u8]]) -> CritbitTrie<usize> {
    keys.iter()
        .enumerate()
        .fold(CritbitTrie::new(), |trie, (value, key)| trie.insert(key, value))
}

fn owned(keys: &[&[u8]]) -> Vec<Vec<u8>> {
    keys.iter().map(|key| key.to_vec()).collect()
}

// =============================================================================
// Unbounded Traversal
// =============================================================================

#[rstest]
fn test_visit_empty_trie() {
    let trie: CritbitTrie<i32> = CritbitTrie::new();
    assert!(visit_to_vec(&trie, None).is_empty());
    assert!(visit_to_vec(&trie, Some(b"a")).is_empty());
}

#[rstest]
fn test_visit_root_leaf() {
    let trie = trie_of(&[&[0x01, 0x02, 0x03]]);
    assert_eq!(visit_to_vec(&trie, None), owned(&[&[0x01, 0x02, 0x03]]));
}

#[rstest]
#[case(&[&[0x01, 0x02, 0x03][..], &[0x01, 0x02, 0x02][..]], &[&[0x01, 0x02, 0x02][..], &[0x01, 0x02, 0x03][..]])]
#[case(&[&[0x01, 0x02, 0x02][..], &[0x01, 0x02, 0x03][..]], &[&[0x01, 0x02, 0x02][..], &[0x01, 0x02, 0x03][..]])]
#[case(
    &[&[0x01, 0x02, 0x03][..], &[0x01, 0x02, 0x04][..], &[0x01, 0x80, 0x02][..]],
    &[&[0x01, 0x02, 0x03][..], &[0x01, 0x02, 0x04][..], &[0x01, 0x80, 0x02][..]]
)]
#[case(
    &[&[0x01, 0x02, 0x03][..], &[0x01, 0x01, 0x04][..], &[0x01, 0x02, 0x02][..]],
    &[&[0x01, 0x01, 0x04][..], &[0x01, 0x02, 0x02][..], &[0x01, 0x02, 0x03][..]]
)]
#[case(&[&[0x01, 0x02, 0x03][..], &[0x01, 0x02][..]], &[&[0x01, 0x02][..], &[0x01, 0x02, 0x03][..]])]
#[case(&[&[0x01, 0x02, 0x03][..], &[0x01, 0x02, 0x03, 0x04][..]], &[&[0x01, 0x02, 0x03][..], &[0x01, 0x02, 0x03, 0x04][..]])]
#[case(&[&b"ffffff"[..], &b"fffffg"[..], &b"aaa"[..]], &[&b"aaa"[..], &b"ffffff"[..], &b"fffffg"[..]])]
fn test_visit_in_ascending_order(#[case] inserted: &[&[u8]], #[case] expected: &[&[u8]]) {
    let trie = trie_of(inserted);
    assert_eq!(visit_to_vec(&trie, None), owned(expected));
}

#[rstest]
fn test_visit_stops_when_visitor_declines() {
    let trie = CritbitTrie::new()
        .insert(&[0x01, 0x02, 0x03, 0x04], 1234)
        .insert(&[0x01, 0x02, 0x03, 0x05], 1235)
        .insert(&[0x01, 0x02, 0x03, 0x06], 1236);

    let mut values = Vec::new();
    trie.visit_ascend(None, |key, value| {
        values.push(*value);
        key != [0x01, 0x02, 0x03, 0x05]
    });
    assert_eq!(values, vec![1234, 1235]);
}

// =============================================================================
// Bounded Traversal
// =============================================================================

#[rstest]
#[case(&[0x01, 0x02, 0x04], 0)]
#[case(&[0x01, 0x02, 0x03], 1)]
#[case(&[0x01, 0x02], 1)]
#[case(&[], 1)]
fn test_root_leaf_respects_bound(#[case] from: &[u8], #[case] expected: usize) {
    let trie = trie_of(&[&[0x01, 0x02, 0x03]]);
    assert_eq!(visit_to_vec(&trie, Some(from)).len(), expected);
}

#[rstest]
fn test_second_node_skips_less_than_bound() {
    let trie = trie_of(&[&[0x01, 0x02, 0x03], &[0x01, 0x02, 0x02]]);
    assert_eq!(
        visit_to_vec(&trie, Some(&[0x01, 0x02, 0x03])),
        owned(&[&[0x01, 0x02, 0x03]])
    );
}

#[rstest]
fn test_length_split_skips_less_than_bound() {
    let trie = trie_of(&[&[0x01, 0x02, 0x03], &[0x01, 0x02]]);
    assert_eq!(
        visit_to_vec(&trie, Some(&[0x01, 0x02, 0x00])),
        owned(&[&[0x01, 0x02, 0x03]])
    );
}

#[rstest]
fn test_deep_node_still_needs_compare() {
    let trie = CritbitTrie::new()
        .insert(b"1", 1)
        .insert(b"2", 2)
        .insert(b"3", 3);

    let mut values = Vec::new();
    trie.visit_ascend(Some(b"3"), |_, value| {
        values.push(*value);
        true
    });
    assert_eq!(values, vec![3]);
}

#[rstest]
fn test_from_prefix_of_prefix() {
    let trie = trie_of(&[
        b"abcd/abcd1",
        b"abcd/abcd2",
        b"abcdefgh/abcd3",
        b"abc/ghi",
        b"abcd/a",
    ]);
    assert_eq!(
        visit_to_vec(&trie, Some(b"abcd/")),
        owned(&[b"abcd/a", b"abcd/abcd1", b"abcd/abcd2", b"abcdefgh/abcd3"])
    );
}

#[rstest]
fn test_bound_between_subtrees_with_greater_critical_byte() {
    // the bound leaves the trie at byte 0 while every node inspects later bytes
    let trie = trie_of(&[b"b1", b"b2", b"b3"]);
    assert_eq!(visit_to_vec(&trie, Some(b"a")), owned(&[b"b1", b"b2", b"b3"]));
    assert!(visit_to_vec(&trie, Some(b"c")).is_empty());
}

#[rstest]
#[case(b"", 6)]
#[case(b"a", 5)]
#[case(b"a\x00", 4)]
#[case(b"ab", 4)]
#[case(b"abc", 3)]
#[case(b"abd", 2)]
#[case(b"b", 2)]
#[case(b"ba", 1)]
#[case(b"\xff\xff", 0)]
fn test_range_from_counts(#[case] bound: &[u8], #[case] expected: usize) {
    let trie = trie_of(&[b"", b"a", b"ab", b"abc", b"b", b"\xff"]);
    let iterator = trie.range_from(bound);
    assert_eq!(iterator.len(), expected);
    assert_eq!(iterator.count(), expected);
}

#[rstest]
fn test_iter_and_visit_agree() {
    let trie = trie_of(&[b"delta", b"alpha", b"charlie", b"bravo", b"echo"]);
    let from_iter: Vec<Vec<u8>> = trie.iter().map(|(key, _)| key.to_vec()).collect();
    assert_eq!(from_iter, visit_to_vec(&trie, None));
}
