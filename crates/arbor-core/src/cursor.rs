//! Bidirectional cursors over a sibling chain.
//!
//! A cursor remembers the handles on both sides of its position, so it can
//! sit one before the first sibling or one past the last and still step back
//! into the list:
//!
//! ```text
//!   before-first      c0 <-> c1 <-> c2      past-last
//!   (_, None, c0)     (prev, cur, next)     (c2, None, _)
//! ```
//!
//! Links are resolved lazily through the [`SlotStore`] on every step.

use std::fmt;
use std::iter::FusedIterator;

use crate::id::Handle;
use crate::store::SlotStore;
use crate::tree::Threaded;

/// Errors from dereferencing a [`SiblingCursor`]. Every variant means the
/// cursor names no live node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("cursor at a sentinel position cannot be dereferenced")]
    AtSentinel,
    #[error("cursor points at {0}, which is no longer occupied")]
    Stale(Handle),
}

/// A position in a sibling chain.
///
/// Stepping past either end parks the cursor on a sentinel position from
/// which the opposite step returns to the boundary sibling. Stepping further
/// outward from a sentinel position does nothing.
///
/// Cursors are not kept in sync with structural mutation. A cursor taken
/// before a node was erased reports [`CursorError::Stale`] when dereferenced
/// on that node.
pub struct SiblingCursor<'a, T> {
    store: &'a SlotStore<T>,
    previous: Option<Handle>,
    current: Option<Handle>,
    next: Option<Handle>,
}

impl<T> Clone for SiblingCursor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            previous: self.previous,
            current: self.current,
            next: self.next,
        }
    }
}

impl<T> fmt::Debug for SiblingCursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiblingCursor")
            .field("previous", &self.previous)
            .field("current", &self.current)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

/// Same store instance and same current handle.
impl<T> PartialEq for SiblingCursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.current == other.current
    }
}

impl<T> Eq for SiblingCursor<'_, T> {}

impl<'a, T: Threaded> SiblingCursor<'a, T> {
    /// Cursor on `handle`, with neighbours read from its sibling links.
    pub fn at(store: &'a SlotStore<T>, handle: Handle) -> Self {
        let mut cursor = Self {
            store,
            previous: None,
            current: Some(handle),
            next: None,
        };
        cursor.resolve();
        cursor
    }

    /// Cursor one before `first`.
    pub fn before_first(store: &'a SlotStore<T>, first: Option<Handle>) -> Self {
        Self {
            store,
            previous: None,
            current: None,
            next: first,
        }
    }

    /// Cursor one past `last`.
    pub fn past_last(store: &'a SlotStore<T>, last: Option<Handle>) -> Self {
        Self {
            store,
            previous: last,
            current: None,
            next: None,
        }
    }

    /// Handle under the cursor, `None` on a sentinel position.
    pub fn handle(&self) -> Option<Handle> {
        self.current
    }

    pub fn peek_next(&self) -> Option<Handle> {
        self.next
    }

    pub fn peek_previous(&self) -> Option<Handle> {
        self.previous
    }

    /// True on either sentinel position.
    pub fn is_sentinel(&self) -> bool {
        self.current.is_none()
    }

    /// Payload under the cursor.
    pub fn get(&self) -> Result<&'a T, CursorError> {
        let handle = self.current.ok_or(CursorError::AtSentinel)?;
        self.store.get(handle).map_err(|_| CursorError::Stale(handle))
    }

    /// Step towards the last sibling.
    pub fn move_next(&mut self) {
        if self.current.is_none() && self.next.is_none() {
            return;
        }
        self.previous = self.current;
        self.current = self.next;
        self.next = None;
        self.resolve();
    }

    /// Step towards the first sibling.
    pub fn move_prev(&mut self) {
        if self.current.is_none() && self.previous.is_none() {
            return;
        }
        self.next = self.current;
        self.current = self.previous;
        self.previous = None;
        self.resolve();
    }

    /// Refresh both neighbours from the current node's links. A node that is
    /// no longer occupied keeps whatever neighbours the step left behind.
    fn resolve(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        if let Ok(node) = self.store.get(current) {
            let links = node.links();
            self.previous = links.previous_sibling;
            self.next = links.next_sibling;
        }
    }
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

/// Double-ended iterator over a sibling chain, built from an ascending and a
/// descending cursor that stop when they meet.
///
/// Forward iteration yields `c0..cn`, reverse iteration yields `cn..c0`.
pub struct Children<'a, T> {
    front: SiblingCursor<'a, T>,
    back: SiblingCursor<'a, T>,
    finished: bool,
}

impl<'a, T: Threaded> Children<'a, T> {
    pub fn new(store: &'a SlotStore<T>, first: Option<Handle>, last: Option<Handle>) -> Self {
        let (front, back) = match (first, last) {
            (Some(first), Some(last)) => {
                (SiblingCursor::at(store, first), SiblingCursor::at(store, last))
            }
            _ => (
                SiblingCursor::past_last(store, None),
                SiblingCursor::before_first(store, None),
            ),
        };
        let finished = front.is_sentinel();
        Self {
            front,
            back,
            finished,
        }
    }
}

impl<T: Threaded> Iterator for Children<'_, T> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        if self.finished {
            return None;
        }
        let Some(handle) = self.front.handle() else {
            self.finished = true;
            return None;
        };
        if self.front == self.back {
            self.finished = true;
        } else {
            self.front.move_next();
        }
        Some(handle)
    }
}

impl<T: Threaded> DoubleEndedIterator for Children<'_, T> {
    fn next_back(&mut self) -> Option<Handle> {
        if self.finished {
            return None;
        }
        let Some(handle) = self.back.handle() else {
            self.finished = true;
            return None;
        };
        if self.front == self.back {
            self.finished = true;
        } else {
            self.back.move_prev();
        }
        Some(handle)
    }
}

impl<T: Threaded> FusedIterator for Children<'_, T> {}
