//! Store configuration.
//!
//! Both knobs only affect performance characteristics. Recycling order is
//! never part of the store's contract, so callers must not depend on which
//! free slot a policy picks.

/// How [`SlotStore::insert`](crate::store::SlotStore::insert) finds a free
/// slot to recycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecyclePolicy {
    /// Pop from a stack of free indices. O(1).
    #[default]
    FreeList,
    /// Scan from slot 0 for the first free slot. O(n) in slot count.
    LinearScan,
}

/// Construction parameters for a [`SlotStore`](crate::store::SlotStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct StoreConfig {
    /// Slots to reserve up front in the backing vector.
    pub initial_capacity: usize,
    /// Free-slot search strategy.
    pub recycle: RecyclePolicy,
}

impl StoreConfig {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    pub fn recycle(mut self, recycle: RecyclePolicy) -> Self {
        self.recycle = recycle;
        self
    }
}
