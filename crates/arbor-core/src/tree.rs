//! Ordered N-ary tree threaded through a [`SlotStore`].
//!
//! Every node carries five index links ([`Links`]). Children of a node form a
//! doubly linked sibling list that starts at `first_child` and ends at
//! `last_child`, in insertion order.
//!
//! # Insertion Pattern
//!
//! Attaching a child is two-phase. The payload is written into a free slot,
//! wired into the parent's child list, and only then published:
//!
//! ```rust
//! use arbor_core::tree::{Node, Tree};
//!
//! let mut tree = Tree::new(Node::new("scene"));
//! let mut vacant = tree.reserve_child(tree.root(), Node::new("camera")).unwrap();
//! vacant.value_mut().value = "main_camera";
//! let camera = vacant.commit().unwrap();
//! assert_eq!(tree.first_child(tree.root()), Ok(Some(camera)));
//! ```
//!
//! Dropping the [`VacantNode`] instead of committing leaves the slot free and
//! unlinked.

use crate::config::StoreConfig;
use crate::cursor::{Children, SiblingCursor};
use crate::id::Handle;
use crate::store::{SlotStore, StoreError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during structural tree mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("unknown parent {0}")]
    UnknownParent(Handle),
    #[error("the root {0} cannot be removed")]
    RootRemoval(Handle),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// The five structural links of a tree node. `None` is the "no index"
/// sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    pub parent: Option<Handle>,
    pub first_child: Option<Handle>,
    pub last_child: Option<Handle>,
    pub next_sibling: Option<Handle>,
    pub previous_sibling: Option<Handle>,
}

/// Capability to rewire links. Only this crate can construct one, so a
/// `&mut T` obtained from [`Tree::get_mut`] cannot reach the links.
///
/// ```compile_fail
/// use arbor_core::tree::{LinkKey, Node, Threaded, Tree};
///
/// let mut tree = Tree::new(Node::new(0));
/// let root = tree.root();
/// tree.get_mut(root).unwrap().links_mut(LinkKey(())).parent = None;
/// ```
#[derive(Debug)]
pub struct LinkKey(());

/// A payload that can be threaded into a [`Tree`].
///
/// Links are owned by the tree. Implementors store them and hand out the
/// storage; writes go through [`links_mut`](Self::links_mut), which only the
/// tree can call.
pub trait Threaded {
    fn links(&self) -> &Links;
    fn links_mut(&mut self, key: LinkKey) -> &mut Links;
}

/// Ready-made tree payload wrapping an arbitrary value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node<V> {
    links: Links,
    pub value: V,
}

impl<V> Node<V> {
    pub fn new(value: V) -> Self {
        Self {
            links: Links::default(),
            value,
        }
    }
}

impl<V> Threaded for Node<V> {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self, _: LinkKey) -> &mut Links {
        &mut self.links
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A rooted, ordered tree whose nodes live in a [`SlotStore`].
///
/// Exactly one root exists from construction until the next
/// [`reset`](Self::reset). Handles of unrelated nodes stay valid across every
/// insertion and removal.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    store: SlotStore<T>,
    root: Handle,
}

impl<T: Threaded> Tree<T> {
    /// Create a tree whose permanent root holds `root`.
    pub fn new(root: T) -> Self {
        Self::with_config(root, StoreConfig::default())
    }

    pub fn with_config(mut root: T, config: StoreConfig) -> Self {
        *root.links_mut(LinkKey(())) = Links::default();
        let mut store = SlotStore::with_config(config);
        let root = store.reseed(root);
        Self { store, root }
    }

    /// Throw away every node and start over with a fresh root. All handles
    /// and cursors issued before the call are invalidated.
    pub fn reset(&mut self, mut root: T) {
        tracing::debug!(slots = self.store.count(), "resetting tree");
        *root.links_mut(LinkKey(())) = Links::default();
        self.root = self.store.reseed(root);
    }

    pub fn root(&self) -> Handle {
        self.root
    }

    /// Read-only view of the underlying slot store.
    pub fn store(&self) -> &SlotStore<T> {
        &self.store
    }

    /// Number of live nodes, root included. Computed by iteration.
    pub fn node_count(&self) -> usize {
        self.store.iter().count()
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.store.is_occupied(handle)
    }

    pub fn get(&self, handle: Handle) -> Result<&T, StoreError> {
        self.store.get(handle)
    }

    /// Mutable payload access. Links stay out of reach; see [`LinkKey`].
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T, StoreError> {
        self.store.get_mut(handle)
    }

    /// Unguarded link access for tests that build corrupted trees.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn corrupt_links(&mut self, handle: Handle) -> Result<&mut Links, StoreError> {
        Ok(self.store.get_mut(handle)?.links_mut(LinkKey(())))
    }

    // -----------------------------------------------------------------------
    // Link lookups
    // -----------------------------------------------------------------------

    fn links(&self, handle: Handle) -> Result<&Links, StoreError> {
        Ok(self.store.get(handle)?.links())
    }

    pub fn parent(&self, handle: Handle) -> Result<Option<Handle>, StoreError> {
        Ok(self.links(handle)?.parent)
    }

    pub fn first_child(&self, handle: Handle) -> Result<Option<Handle>, StoreError> {
        Ok(self.links(handle)?.first_child)
    }

    pub fn last_child(&self, handle: Handle) -> Result<Option<Handle>, StoreError> {
        Ok(self.links(handle)?.last_child)
    }

    pub fn next_sibling(&self, handle: Handle) -> Result<Option<Handle>, StoreError> {
        Ok(self.links(handle)?.next_sibling)
    }

    pub fn previous_sibling(&self, handle: Handle) -> Result<Option<Handle>, StoreError> {
        Ok(self.links(handle)?.previous_sibling)
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Children of `handle` in insertion order. Double-ended.
    pub fn children(&self, handle: Handle) -> Result<Children<'_, T>, StoreError> {
        let links = self.links(handle)?;
        Ok(Children::new(&self.store, links.first_child, links.last_child))
    }

    /// Cursor on the first child of `handle` (past-last if it has none).
    pub fn cursor_front(&self, handle: Handle) -> Result<SiblingCursor<'_, T>, StoreError> {
        let first = self.links(handle)?.first_child;
        Ok(match first {
            Some(first) => SiblingCursor::at(&self.store, first),
            None => SiblingCursor::past_last(&self.store, None),
        })
    }

    /// Cursor on the last child of `handle` (before-first if it has none).
    pub fn cursor_back(&self, handle: Handle) -> Result<SiblingCursor<'_, T>, StoreError> {
        let last = self.links(handle)?.last_child;
        Ok(match last {
            Some(last) => SiblingCursor::at(&self.store, last),
            None => SiblingCursor::before_first(&self.store, None),
        })
    }

    /// Cursor positioned one before the first child of `handle`.
    pub fn before_first(&self, handle: Handle) -> Result<SiblingCursor<'_, T>, StoreError> {
        let first = self.links(handle)?.first_child;
        Ok(SiblingCursor::before_first(&self.store, first))
    }

    /// Cursor positioned one past the last child of `handle`.
    pub fn past_last(&self, handle: Handle) -> Result<SiblingCursor<'_, T>, StoreError> {
        let last = self.links(handle)?.last_child;
        Ok(SiblingCursor::past_last(&self.store, last))
    }

    /// Every node below `handle` in depth-first pre-order. `handle` itself is
    /// not yielded.
    pub fn descendants(&self, handle: Handle) -> Result<Descendants<'_, T>, StoreError> {
        let next = self.links(handle)?.first_child;
        Ok(Descendants {
            store: &self.store,
            top: handle,
            next,
        })
    }

    /// Parent, grandparent, ... up to and including the root.
    pub fn ancestors(&self, handle: Handle) -> Result<Ancestors<'_, T>, StoreError> {
        let next = self.links(handle)?.parent;
        Ok(Ancestors {
            store: &self.store,
            next,
        })
    }

    /// Number of edges between `handle` and the root.
    pub fn depth(&self, handle: Handle) -> Result<usize, StoreError> {
        Ok(self.ancestors(handle)?.count())
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Attach `value` as the last child of `parent`.
    pub fn add_child(&mut self, parent: Handle, value: T) -> Result<Handle, TreeError> {
        self.reserve_child(parent, value)?.commit()
    }

    /// Phase 1 of [`add_child`](Self::add_child): write `value` into a free
    /// slot without linking or publishing it.
    pub fn reserve_child(&mut self, parent: Handle, value: T) -> Result<VacantNode<'_, T>, TreeError> {
        if !self.store.is_occupied(parent) {
            return Err(TreeError::UnknownParent(parent));
        }
        let handle = self.store.insert(value)?;
        *self.store.reserved_mut(handle).links_mut(LinkKey(())) = Links::default();
        Ok(VacantNode {
            tree: self,
            parent,
            handle,
        })
    }

    /// Append the reserved slot `child` to `parent`'s child list.
    fn link_last_child(&mut self, parent: Handle, child: Handle) -> Result<(), TreeError> {
        let last = self
            .links(parent)
            .map_err(|_| TreeError::UnknownParent(parent))?
            .last_child;
        if let Some(last) = last {
            self.store.get(last)?;
        }

        *self.store.get_unchecked_mut(child)?.links_mut(LinkKey(())) = Links {
            parent: Some(parent),
            previous_sibling: last,
            ..Links::default()
        };
        match last {
            Some(last) => self.store.get_mut(last)?.links_mut(LinkKey(())).next_sibling = Some(child),
            None => self.store.get_mut(parent)?.links_mut(LinkKey(())).first_child = Some(child),
        }
        self.store.get_mut(parent)?.links_mut(LinkKey(())).last_child = Some(child);
        Ok(())
    }

    /// Detach `handle` from its parent and free it together with all of its
    /// descendants. Returns the freed handles, `handle` first.
    ///
    /// Either the whole subtree is removed or the tree is left unchanged.
    pub fn remove_subtree(&mut self, handle: Handle) -> Result<Vec<Handle>, TreeError> {
        if handle == self.root {
            tracing::warn!(%handle, "refusing to remove the root");
            return Err(TreeError::RootRemoval(handle));
        }
        let links = *self.links(handle)?;
        let Some(parent) = links.parent else {
            return Err(TreeError::RootRemoval(handle));
        };
        for neighbour in [Some(parent), links.previous_sibling, links.next_sibling]
            .into_iter()
            .flatten()
        {
            self.store.get(neighbour)?;
        }

        let mut doomed = vec![handle];
        doomed.extend(self.descendants(handle)?);
        self.store.erase(&doomed)?;

        match links.previous_sibling {
            Some(prev) => self.store.get_mut(prev)?.links_mut(LinkKey(())).next_sibling = links.next_sibling,
            None => self.store.get_mut(parent)?.links_mut(LinkKey(())).first_child = links.next_sibling,
        }
        match links.next_sibling {
            Some(next) => {
                self.store.get_mut(next)?.links_mut(LinkKey(())).previous_sibling = links.previous_sibling
            }
            None => self.store.get_mut(parent)?.links_mut(LinkKey(())).last_child = links.previous_sibling,
        }

        tracing::debug!(%handle, %parent, removed = doomed.len(), "removed subtree");
        Ok(doomed)
    }

    /// [`remove_subtree`](Self::remove_subtree), then move the freed payloads
    /// out in the same order, leaving `T::default()` behind.
    pub fn take_subtree(&mut self, handle: Handle) -> Result<Vec<(Handle, T)>, TreeError>
    where
        T: Default,
    {
        let freed = self.remove_subtree(handle)?;
        let mut taken = Vec::with_capacity(freed.len());
        for h in freed {
            let value = std::mem::take(self.store.get_unchecked_mut(h)?);
            taken.push((h, value));
        }
        Ok(taken)
    }
}

// ---------------------------------------------------------------------------
// Two-phase insertion guard
// ---------------------------------------------------------------------------

/// A child reserved by [`Tree::reserve_child`] but not yet visible.
///
/// The payload can be finished through [`value_mut`](Self::value_mut) before
/// [`commit`](Self::commit) links and publishes it. Dropping the guard
/// abandons the slot: it stays free and no link points at it.
#[must_use = "a reserved node is discarded unless committed"]
pub struct VacantNode<'t, T: Threaded> {
    tree: &'t mut Tree<T>,
    parent: Handle,
    handle: Handle,
}

impl<T: Threaded> VacantNode<'_, T> {
    /// The handle the node will have once committed.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn parent(&self) -> Handle {
        self.parent
    }

    /// The unpublished payload. Its links must be left untouched.
    pub fn value_mut(&mut self) -> &mut T {
        self.tree.store.reserved_mut(self.handle)
    }

    /// Phase 2: append the node to its parent's children and publish it.
    pub fn commit(self) -> Result<Handle, TreeError> {
        self.tree.link_last_child(self.parent, self.handle)?;
        self.tree.store.mark_occupied(self.handle)?;
        tracing::trace!(handle = %self.handle, parent = %self.parent, "attached child");
        Ok(self.handle)
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Pre-order walk below a node. See [`Tree::descendants`].
pub struct Descendants<'a, T> {
    store: &'a SlotStore<T>,
    top: Handle,
    next: Option<Handle>,
}

impl<T: Threaded> Iterator for Descendants<'_, T> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let current = self.next?;
        let links = self.store.get(current).ok()?.links();

        self.next = if links.first_child.is_some() {
            links.first_child
        } else {
            // Climb until a node with a next sibling, stopping at the top.
            let mut node = current;
            let mut links = *links;
            loop {
                if node == self.top {
                    break None;
                }
                if links.next_sibling.is_some() {
                    break links.next_sibling;
                }
                match links.parent {
                    Some(parent) if parent != self.top => {
                        node = parent;
                        match self.store.get(parent) {
                            Ok(p) => links = *p.links(),
                            Err(_) => break None,
                        }
                    }
                    _ => break None,
                }
            }
        };
        Some(current)
    }
}

/// Walk from a node's parent up to the root. See [`Tree::ancestors`].
pub struct Ancestors<'a, T> {
    store: &'a SlotStore<T>,
    next: Option<Handle>,
}

impl<T: Threaded> Iterator for Ancestors<'_, T> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let current = self.next?;
        self.next = self.store.get(current).ok().and_then(|n| n.links().parent);
        Some(current)
    }
}
