//! Critbit nodes and the path-copying helpers.
//!
//! Nodes are never mutated after construction. A write rebuilds only the
//! nodes between the root and the point of change and shares every other
//! subtree with the handle it started from.

use std::fmt::Write as _;

use smallvec::SmallVec;

use super::bits::CriticalBit;
use crate::persistent::{ReferenceCounter, render_key};

pub(super) type Link<V> = ReferenceCounter<Node<V>>;

pub(super) enum Node<V> {
    Leaf(Leaf<V>),
    Internal(Internal<V>),
}

pub(super) struct Leaf<V> {
    pub(super) key: Box<[u8]>,
    pub(super) value: V,
}

pub(super) struct Internal<V> {
    pub(super) critical: CriticalBit,
    /// Number of leaves beneath this node.
    pub(super) count: usize,
    pub(super) children: [Link<V>; 2],
}

impl<V> Node<V> {
    pub(super) fn leaf(key: &[u8], value: V) -> Link<V> {
        ReferenceCounter::new(Self::Leaf(Leaf {
            key: key.into(),
            value,
        }))
    }

    fn internal(critical: CriticalBit, children: [Link<V>; 2]) -> Link<V> {
        let count = children[0].count() + children[1].count();
        ReferenceCounter::new(Self::Internal(Internal {
            critical,
            count,
            children,
        }))
    }

    #[inline]
    pub(super) fn count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Internal(internal) => internal.count,
        }
    }

    /// Descends by direction alone to the leaf `key` would occupy.
    ///
    /// The leaf only holds `key` if `key` is present; callers compare.
    pub(super) fn best_leaf(&self, key: &[u8]) -> &Leaf<V> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return leaf,
                Self::Internal(internal) => {
                    node = &*internal.children[internal.critical.direction(key)];
                }
            }
        }
    }

    pub(super) fn first_leaf(&self) -> &Leaf<V> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return leaf,
                Self::Internal(internal) => node = &*internal.children[0],
            }
        }
    }

    pub(super) fn last_leaf(&self) -> &Leaf<V> {
        let mut node = self;
        loop {
            match node {
                Self::Leaf(leaf) => return leaf,
                Self::Internal(internal) => node = &*internal.children[1],
            }
        }
    }
}

/// Internal nodes from the root down, each with the direction taken from it.
type Path<'a, V> = SmallVec<[(&'a Internal<V>, usize); 32]>;

/// Follows `key` from `node` while `descend` accepts the next internal node.
///
/// Returns the visited path and the node the walk stopped at.
fn walk<'a, V>(
    mut node: &'a Link<V>,
    key: &[u8],
    mut descend: impl FnMut(&Internal<V>) -> bool,
) -> (Path<'a, V>, &'a Link<V>) {
    let mut path = Path::new();
    while let Node::Internal(internal) = &**node
        && descend(internal)
    {
        let direction = internal.critical.direction(key);
        path.push((internal, direction));
        node = &internal.children[direction];
    }
    (path, node)
}

/// Copies the nodes on `path` bottom up, hanging `replacement` where the walk
/// ended and recounting every copy with `count`.
fn rebuild<V>(
    path: Path<'_, V>,
    replacement: Link<V>,
    count: impl Fn(usize) -> usize,
) -> Link<V> {
    path.into_iter()
        .rev()
        .fold(replacement, |child, (internal, direction)| {
            let mut children = internal.children.clone();
            children[direction] = child;
            ReferenceCounter::new(Node::Internal(Internal {
                critical: internal.critical,
                count: count(internal.count),
                children,
            }))
        })
}

/// Replaces the value of the leaf holding `key`, which must be present.
pub(super) fn replace_value<V>(node: &Link<V>, key: &[u8], value: V) -> Link<V> {
    let (path, _) = walk(node, key, |_| true);
    rebuild(path, Node::leaf(key, value), |count| count)
}

/// Splices a new leaf for `key` into the subtree rooted at `node`.
///
/// `critical` is the first position at which `key` differs from the best
/// leaf for `key`. The new internal node goes above the first node on the
/// path whose own position comes after `critical`; everything above it is
/// copied with its count bumped by one.
pub(super) fn insert_leaf<V>(
    node: &Link<V>,
    key: &[u8],
    value: V,
    critical: CriticalBit,
) -> Link<V> {
    let (path, displaced) = walk(node, key, |internal| internal.critical < critical);
    let leaf = Node::leaf(key, value);
    let children = if critical.direction(key) == 0 {
        [leaf, displaced.clone()]
    } else {
        [displaced.clone(), leaf]
    };
    tracing::trace!(
        byte_index = critical.byte_index(),
        critical = %critical,
        count = displaced.count() + 1,
        "spliced critical node"
    );
    rebuild(path, Node::internal(critical, children), |count| count + 1)
}

/// Removes the leaf holding `key`, which must be present.
///
/// Returns `None` when `node` was that leaf. The internal node right above
/// the leaf is replaced by its other child.
pub(super) fn remove_leaf<V>(node: &Link<V>, key: &[u8]) -> Option<Link<V>> {
    let (mut path, _) = walk(node, key, |_| true);
    let (parent, direction) = path.pop()?;
    tracing::trace!(
        byte_index = parent.critical.byte_index(),
        critical = %parent.critical,
        "elided critical node"
    );
    let sibling = parent.children[1 - direction].clone();
    Some(rebuild(path, sibling, |count| count - 1))
}

/// Releases a subtree node by node instead of recursively.
///
/// Shared subtrees are left to their other owners.
pub(super) fn release<V>(root: Option<Link<V>>) {
    let mut pending: Vec<Link<V>> = root.into_iter().collect();
    while let Some(link) = pending.pop() {
        if let Ok(Node::Internal(Internal { children, .. })) = ReferenceCounter::try_unwrap(link) {
            pending.extend(children);
        }
    }
}

/// Renders the subtree as an indented outline, one node per line.
pub(super) fn dump<V>(node: &Node<V>, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        Node::Leaf(leaf) => {
            let _ = writeln!(output, "{indent}leaf {}", render_key(&leaf.key));
        }
        Node::Internal(internal) => {
            let _ = writeln!(
                output,
                "{indent}node {} count={}",
                internal.critical, internal.count
            );
            for child in &internal.children {
                dump(child, depth + 1, output);
            }
        }
    }
}

/// Walks the subtree checking the structural invariants.
///
/// `ancestors` holds, for every internal node above `node`, its descriptor
/// and the direction taken from it. Returns the number of leaves found.
pub(super) fn check<V>(
    node: &Node<V>,
    ancestors: &mut Vec<(CriticalBit, usize)>,
) -> Result<usize, String> {
    match node {
        Node::Leaf(leaf) => {
            for (critical, direction) in ancestors.iter() {
                if critical.direction(&leaf.key) != *direction {
                    return Err(format!(
                        "leaf {} is on the wrong side of {critical}",
                        render_key(&leaf.key)
                    ));
                }
            }
            Ok(1)
        }
        Node::Internal(internal) => {
            if let Some((parent, _)) = ancestors.last()
                && *parent >= internal.critical
            {
                return Err(format!(
                    "descriptor {} does not follow its parent {parent}",
                    internal.critical
                ));
            }
            let mut found = 0;
            for (direction, child) in internal.children.iter().enumerate() {
                ancestors.push((internal.critical, direction));
                let counted = check(child, ancestors);
                ancestors.pop();
                found += counted?;
            }
            if found == internal.count {
                Ok(found)
            } else {
                Err(format!(
                    "node {} records {} leaves but holds {found}",
                    internal.critical, internal.count
                ))
            }
        }
    }
}
