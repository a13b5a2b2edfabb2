//! Contract-violation tests for the slot store and the tree.
//!
//! Every misuse here must come back as an error value, never a panic, and
//! must leave the structure exactly as it was.

use arbor_core::cursor::{CursorError, SiblingCursor};
use arbor_core::id::{Handle, NO_INDEX};
use arbor_core::store::{SlotStore, StoreError};
use arbor_core::test_utils::*;
use arbor_core::tree::{Node, TreeError};

fn handle(raw: u32) -> Handle {
    Handle::from_raw(raw).unwrap()
}

/// Stale vs out-of-bounds are distinguished.
#[test]
fn stale_and_invalid_handles_are_distinct() {
    let (mut store, handles) = flat_store(3);
    store.mark_free(handles[1]).unwrap();

    assert_eq!(store.get(handles[1]), Err(StoreError::StaleHandle(handles[1])));
    assert_eq!(
        store.get_mut(handle(3)),
        Err(StoreError::InvalidHandle {
            handle: handle(3),
            len: 3
        })
    );
}

/// The sentinel can never be turned into a handle.
#[test]
fn sentinel_raw_value_is_rejected() {
    assert_eq!(Handle::from_raw(NO_INDEX), None);
    assert_eq!(Handle::raw_or_sentinel(None), NO_INDEX);
}

/// A batch with one bad handle frees nothing.
#[test]
fn erase_with_mixed_batch_is_rejected_whole() {
    let (mut store, handles) = flat_store(6);
    let snapshot: Vec<(Handle, u32)> = store.iter().map(|(h, v)| (h, *v)).collect();

    let batches: [&[Handle]; 3] = [
        &[handles[0], handles[1], handle(40)],
        &[handle(40), handles[2]],
        &[handles[3], handles[4], handle(6)],
    ];
    for batch in batches {
        assert!(store.erase(batch).is_err());
        let now: Vec<(Handle, u32)> = store.iter().map(|(h, v)| (h, *v)).collect();
        assert_eq!(now, snapshot);
    }

    store.mark_free(handles[5]).unwrap();
    assert_eq!(
        store.erase(&[handles[0], handles[5]]),
        Err(StoreError::StaleHandle(handles[5]))
    );
    assert!(store.is_occupied(handles[0]));
}

/// An empty batch is a no-op.
#[test]
fn erase_empty_batch() {
    let (mut store, _) = flat_store(2);
    store.erase(&[]).unwrap();
    assert_eq!(store.iter().count(), 2);
}

/// Repeated uncommitted inserts never grow the store.
#[test]
fn repeated_uncommitted_inserts_reuse_one_slot() {
    let mut store = SlotStore::new();
    let first = store.insert(0u8).unwrap();
    for i in 1..20 {
        assert_eq!(store.insert(i).unwrap(), first);
    }
    assert_eq!(store.count(), 1);
    assert_eq!(store.iter().count(), 0);
}

/// Insert never overwrites an occupied slot.
#[test]
fn insert_never_touches_occupied_slots() {
    let (mut store, handles) = flat_store(4);
    let fresh = store.insert(777).unwrap();
    assert!(!handles.contains(&fresh));
    for (i, &h) in handles.iter().enumerate() {
        assert_eq!(store.get(h), Ok(&(i as u32 * 10)));
    }
}

/// Cursor over a node that was freed after the cursor position was chosen.
#[test]
fn cursor_on_erased_node_fails_to_dereference() {
    let (tree, parent, kids) = wide_tree(4);
    let mut store = tree.store().clone();
    store.erase(&[kids[2]]).unwrap();

    let mut cursor = SiblingCursor::at(&store, kids[1]);
    assert!(cursor.get().is_ok());
    cursor.move_next();
    assert_eq!(cursor.handle(), Some(kids[2]));
    assert_eq!(cursor.get(), Err(CursorError::Stale(kids[2])));

    let end = tree.past_last(parent).unwrap();
    assert_eq!(end.get(), Err(CursorError::AtSentinel));
}

#[test]
fn add_child_under_free_or_missing_parent() {
    let (mut tree, s) = scenario_tree();
    tree.remove_subtree(s.a).unwrap();
    let before = tree.store().count();

    assert_eq!(
        tree.add_child(s.c, Node::new("x")),
        Err(TreeError::UnknownParent(s.c))
    );
    assert_eq!(
        tree.add_child(handle(1_000), Node::new("x")),
        Err(TreeError::UnknownParent(handle(1_000)))
    );
    assert_eq!(tree.store().count(), before);
    assert_valid(&tree);
}

#[test]
fn root_cannot_be_removed() {
    let (mut tree, s) = scenario_tree();
    assert_eq!(tree.remove_subtree(s.r), Err(TreeError::RootRemoval(s.r)));
    assert_valid(&tree);
}

#[test]
fn handles_from_before_reset_do_not_alias() {
    let (mut tree, s) = scenario_tree();
    tree.reset(Node::new("new-root"));
    for h in [s.a, s.b, s.c] {
        assert!(matches!(
            tree.get(h),
            Err(StoreError::InvalidHandle { .. })
        ));
        assert!(matches!(
            tree.add_child(h, Node::new("orphan")),
            Err(TreeError::UnknownParent(_))
        ));
    }
    let a2 = tree.add_child(tree.root(), Node::new("A2")).unwrap();
    assert_eq!(tree.get(a2).unwrap().value, "A2");
    assert_eq!(tree.get(tree.root()).unwrap().value, "new-root");
}

#[test]
fn lookups_out_of_bounds_fail() {
    let (tree, _) = scenario_tree();
    let far = handle(99);
    assert!(tree.first_child(far).is_err());
    assert!(tree.next_sibling(far).is_err());
    assert!(tree.parent(far).is_err());
    assert!(tree.children(far).is_err());
    assert!(tree.descendants(far).is_err());
    assert!(tree.depth(far).is_err());
}
