//! Arbor Core -- an index-stable slot store with an intrusive tree threaded
//! through it.
//!
//! This crate provides the recyclable slot arena that every Arbor registry
//! and hierarchy is built on, plus the tree layer that links slots into an
//! ordered parent/child structure.
//!
//! # Layers
//!
//! 1. **Slot store** -- [`store::SlotStore`] owns a growable array of slots,
//!    each occupied or free. Handles are slot indices and survive any
//!    mutation that does not touch them.
//! 2. **Threaded tree** -- [`tree::Tree`] stores nodes in a slot store and
//!    keeps five links per node (parent, first/last child, next/previous
//!    sibling).
//!
//! # Two-Phase Insertion
//!
//! Inserting never publishes immediately. The payload is written first and
//! made visible in a second, explicit step:
//!
//! ```rust
//! use arbor_core::store::SlotStore;
//!
//! let mut materials = SlotStore::new();
//! let handle = materials.insert("brushed_steel").unwrap();
//! // ... finish initialising derived state ...
//! materials.mark_occupied(handle).unwrap();
//! assert_eq!(materials.get(handle), Ok(&"brushed_steel"));
//! ```
//!
//! # Key Types
//!
//! - [`id::Handle`] -- Slot index; `None` plays the "no index" sentinel.
//! - [`store::SlotStore`] -- Flat recyclable storage.
//! - [`tree::Tree`] -- Rooted ordered tree over a slot store.
//! - [`cursor::SiblingCursor`] / [`cursor::Children`] -- Bidirectional
//!   sibling traversal.
//! - [`validation::InvariantViolation`] -- Reported by [`tree::Tree::validate`].

pub mod config;
pub mod cursor;
pub mod id;
pub mod store;
pub mod tree;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
