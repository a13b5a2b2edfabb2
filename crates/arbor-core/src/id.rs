/// Raw value reserved for "no slot". Never issued as a handle.
pub const NO_INDEX: u32 = u32::MAX;

/// Identifies a slot in a [`SlotStore`](crate::store::SlotStore). Cheap to copy
/// and compare.
///
/// A handle is only meaningful while the slot it names is occupied. Once the
/// slot is freed the same value may be handed out again for an unrelated
/// entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Handle(pub(crate) u32);

impl Handle {
    /// Build a handle from a raw slot index. Returns `None` for [`NO_INDEX`].
    pub fn from_raw(raw: u32) -> Option<Self> {
        (raw != NO_INDEX).then_some(Self(raw))
    }

    /// The raw slot index.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot position in the backing sequence.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Collapse an optional handle into its raw form, using [`NO_INDEX`] for
    /// `None`.
    pub fn raw_or_sentinel(handle: Option<Self>) -> u32 {
        handle.map_or(NO_INDEX, Self::raw)
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
