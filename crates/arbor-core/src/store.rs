use crate::config::{RecyclePolicy, StoreConfig};
use crate::id::{Handle, NO_INDEX};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors reported by [`SlotStore`] when a handle breaks its contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid handle {handle}: store has {len} slots")]
    InvalidHandle { handle: Handle, len: usize },
    #[error("stale handle {0}: slot is free")]
    StaleHandle(Handle),
    #[error("store is full ({0} slots)")]
    CapacityExhausted(usize),
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Slot<T> {
    occupied: bool,
    /// Position of this slot in `SlotStore::free`. Only meaningful while free.
    free_at: u32,
    value: T,
}

/// A growable array of recyclable slots addressed by [`Handle`].
///
/// Handles stay valid across any insertion or erasure that does not touch
/// them. Freed slots are reused by later insertions; which free slot is
/// picked depends on the configured [`RecyclePolicy`] and is not part of the
/// contract.
///
/// Insertion is two-phase: [`insert`](Self::insert) writes the payload into a
/// free slot but leaves it free, and [`mark_occupied`](Self::mark_occupied)
/// publishes it. Until then the slot is invisible to [`get`](Self::get) and
/// iteration, and the next `insert` may overwrite it.
///
/// Freeing a slot does not drop its payload; it stays resident until the slot
/// is recycled or the store is cleared. Payloads that own heap memory can be
/// released eagerly with [`erase_take`](Self::erase_take).
///
/// # Examples
///
/// ```
/// use arbor_core::store::SlotStore;
///
/// let mut store = SlotStore::new();
/// let handle = store.insert("steel").unwrap();
/// assert!(store.get(handle).is_err());
/// store.mark_occupied(handle).unwrap();
/// assert_eq!(store.get(handle), Ok(&"steel"));
/// ```
#[derive(Debug, Clone)]
pub struct SlotStore<T> {
    slots: Vec<Slot<T>>,
    /// Indices of every free slot, reserved-but-unpublished ones included.
    free: Vec<u32>,
    recycle: RecyclePolicy,
}

impl<T> Default for SlotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotStore<T> {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            slots: Vec::with_capacity(config.initial_capacity),
            free: Vec::new(),
            recycle: config.recycle,
        }
    }

    pub fn recycle_policy(&self) -> RecyclePolicy {
        self.recycle
    }

    // -----------------------------------------------------------------------
    // Insertion
    // -----------------------------------------------------------------------

    /// Phase 1 of insertion: write `value` into a free slot, growing the
    /// store if none is free. The returned handle is NOT yet occupied.
    pub fn insert(&mut self, value: T) -> Result<Handle, StoreError> {
        let recycled = match self.recycle {
            RecyclePolicy::FreeList => self.free.last().map(|&i| i as usize),
            RecyclePolicy::LinearScan => self.slots.iter().position(|slot| !slot.occupied),
        };

        if let Some(index) = recycled {
            self.slots[index].value = value;
            tracing::trace!(handle = index, "reusing free slot");
            return Ok(Handle(index as u32));
        }

        let index = self.slots.len();
        if index >= NO_INDEX as usize {
            return Err(StoreError::CapacityExhausted(index));
        }
        let free_at = self.free.len() as u32;
        self.free.push(index as u32);
        self.slots.push(Slot {
            occupied: false,
            free_at,
            value,
        });
        tracing::trace!(handle = index, "appended slot");
        Ok(Handle(index as u32))
    }

    /// Insert and publish in one step. For callers with no derived state to
    /// initialise between the two phases.
    pub fn insert_occupied(&mut self, value: T) -> Result<Handle, StoreError> {
        let handle = self.insert(value)?;
        self.mark_occupied(handle)?;
        Ok(handle)
    }

    // -----------------------------------------------------------------------
    // Occupancy
    // -----------------------------------------------------------------------

    /// Phase 2 of insertion: make `handle` visible. Idempotent.
    pub fn mark_occupied(&mut self, handle: Handle) -> Result<(), StoreError> {
        let index = self.check_bounds(handle)?;
        if self.slots[index].occupied {
            return Ok(());
        }

        let at = self.slots[index].free_at as usize;
        self.free.swap_remove(at);
        if let Some(&moved) = self.free.get(at) {
            self.slots[moved as usize].free_at = at as u32;
        }
        self.slots[index].occupied = true;
        Ok(())
    }

    /// Free `handle` so its slot can be recycled. The payload stays in place
    /// until the slot is overwritten. Idempotent.
    pub fn mark_free(&mut self, handle: Handle) -> Result<(), StoreError> {
        let index = self.check_bounds(handle)?;
        let slot = &mut self.slots[index];
        if !slot.occupied {
            return Ok(());
        }
        slot.occupied = false;
        slot.free_at = self.free.len() as u32;
        self.free.push(index as u32);
        Ok(())
    }

    /// Free every handle in `handles`, or none of them.
    ///
    /// All handles are validated (in bounds and occupied) before the first
    /// slot is freed. Duplicates are accepted.
    pub fn erase(&mut self, handles: &[Handle]) -> Result<(), StoreError> {
        if let Some(err) = handles.iter().find_map(|&h| self.check_occupied(h).err()) {
            tracing::warn!(error = %err, count = handles.len(), "erase rejected, store unchanged");
            return Err(err);
        }
        for &handle in handles {
            self.mark_free(handle)?;
        }
        tracing::debug!(count = handles.len(), "erased slots");
        Ok(())
    }

    /// [`erase`](Self::erase), then move every payload out, leaving
    /// `T::default()` in the freed slots. A duplicated handle yields the
    /// default on its repeats.
    pub fn erase_take(&mut self, handles: &[Handle]) -> Result<Vec<T>, StoreError>
    where
        T: Default,
    {
        self.erase(handles)?;
        Ok(handles
            .iter()
            .map(|h| std::mem::take(&mut self.slots[h.index()].value))
            .collect())
    }

    /// Returns true if `handle` is in bounds and occupied.
    pub fn is_occupied(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.occupied)
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    pub fn get(&self, handle: Handle) -> Result<&T, StoreError> {
        let index = self.check_occupied(handle)?;
        Ok(&self.slots[index].value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T, StoreError> {
        let index = self.check_occupied(handle)?;
        Ok(&mut self.slots[index].value)
    }

    /// Like [`get`](Self::get) but skips the occupancy check. Meant for the
    /// window between [`insert`](Self::insert) and
    /// [`mark_occupied`](Self::mark_occupied).
    pub fn get_unchecked(&self, handle: Handle) -> Result<&T, StoreError> {
        let index = self.check_bounds(handle)?;
        Ok(&self.slots[index].value)
    }

    pub fn get_unchecked_mut(&mut self, handle: Handle) -> Result<&mut T, StoreError> {
        let index = self.check_bounds(handle)?;
        Ok(&mut self.slots[index].value)
    }

    /// Physical slot count, free slots included.
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every slot and payload. All previously issued handles become
    /// out of bounds until the store grows again.
    pub fn clear(&mut self) {
        tracing::debug!(slots = self.slots.len(), "clearing slot store");
        self.slots.clear();
        self.free.clear();
    }

    /// Replace the whole store with a single occupied slot at handle 0.
    pub(crate) fn reseed(&mut self, value: T) -> Handle {
        self.clear();
        self.slots.push(Slot {
            occupied: true,
            free_at: 0,
            value,
        });
        Handle(0)
    }

    /// Payload of a slot reserved by [`insert`](Self::insert) and not yet
    /// published. Callers must pass a handle `insert` just returned.
    pub(crate) fn reserved_mut(&mut self, handle: Handle) -> &mut T {
        &mut self.slots[handle.index()].value
    }

    // -----------------------------------------------------------------------
    // Iteration
    // -----------------------------------------------------------------------

    /// First occupied handle strictly after `after`, or from the start when
    /// `after` is `None`.
    pub fn next_occupied(&self, after: Option<Handle>) -> Option<Handle> {
        let start = after.map_or(0, |h| h.index() + 1);
        self.slots
            .get(start..)?
            .iter()
            .position(|slot| slot.occupied)
            .map(|offset| Handle((start + offset) as u32))
    }

    /// Iterate over occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(i, slot)| (Handle(i as u32), &slot.value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(i, slot)| (Handle(i as u32), &mut slot.value))
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    // -----------------------------------------------------------------------
    // Validation helpers
    // -----------------------------------------------------------------------

    fn check_bounds(&self, handle: Handle) -> Result<usize, StoreError> {
        let index = handle.index();
        if index < self.slots.len() {
            Ok(index)
        } else {
            Err(StoreError::InvalidHandle {
                handle,
                len: self.slots.len(),
            })
        }
    }

    fn check_occupied(&self, handle: Handle) -> Result<usize, StoreError> {
        let index = self.check_bounds(handle)?;
        if self.slots[index].occupied {
            Ok(index)
        } else {
            Err(StoreError::StaleHandle(handle))
        }
    }
}
