//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::id::Handle;
use crate::store::SlotStore;
use crate::tree::{Node, Threaded, Tree};

// ===========================================================================
// Tree builders
// ===========================================================================

/// Handles of the four-node reference tree built by [`scenario_tree`].
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub r: Handle,
    pub a: Handle,
    pub b: Handle,
    pub c: Handle,
}

/// ```text
/// R
/// ├── A
/// │   └── C
/// └── B
/// ```
pub fn scenario_tree() -> (Tree<Node<&'static str>>, Scenario) {
    let mut tree = Tree::new(Node::new("R"));
    let r = tree.root();
    let a = tree.add_child(r, Node::new("A")).unwrap();
    let b = tree.add_child(r, Node::new("B")).unwrap();
    let c = tree.add_child(a, Node::new("C")).unwrap();
    (tree, Scenario { r, a, b, c })
}

/// A root with one child holding `n` leaves valued `0..n`. Returns the tree,
/// the parent of the leaves, and the leaves in insertion order.
pub fn wide_tree(n: u32) -> (Tree<Node<u32>>, Handle, Vec<Handle>) {
    let mut tree = Tree::new(Node::new(u32::MAX));
    let parent = tree.add_child(tree.root(), Node::new(u32::MAX - 1)).unwrap();
    let kids = (0..n)
        .map(|i| tree.add_child(parent, Node::new(i)).unwrap())
        .collect();
    (tree, parent, kids)
}

/// A complete tree of the given `depth` where every inner node has
/// `fan_out` children. Node values are their creation order.
pub fn bushy_tree(depth: u32, fan_out: u32) -> Tree<Node<u32>> {
    let mut tree = Tree::new(Node::new(0));
    let mut frontier = vec![tree.root()];
    let mut counter = 1;
    for _ in 0..depth {
        let mut next = Vec::new();
        for parent in frontier {
            for _ in 0..fan_out {
                next.push(tree.add_child(parent, Node::new(counter)).unwrap());
                counter += 1;
            }
        }
        frontier = next;
    }
    tree
}

// ===========================================================================
// Flat builders
// ===========================================================================

/// A flat store holding `value = index * 10` for `0..n`, all occupied.
pub fn flat_store(n: u32) -> (SlotStore<u32>, Vec<Handle>) {
    let mut store = SlotStore::new();
    let handles = (0..n)
        .map(|i| store.insert_occupied(i * 10).unwrap())
        .collect();
    (store, handles)
}

// ===========================================================================
// Assertions
// ===========================================================================

/// Panic with every violation if `tree` breaks a structural invariant.
pub fn assert_valid<T: Threaded>(tree: &Tree<T>) {
    let violations = tree.validate();
    assert!(
        violations.is_empty(),
        "tree invariants broken:\n{}",
        violations
            .iter()
            .map(|v| format!("  - {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Children of `parent` walked with `next_sibling` only.
pub fn children_by_links<T: Threaded>(tree: &Tree<T>, parent: Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut next = tree.first_child(parent).unwrap();
    while let Some(h) = next {
        out.push(h);
        next = tree.next_sibling(h).unwrap();
    }
    out
}
