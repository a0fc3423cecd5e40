use core::fmt;
use core::num::NonZeroU32;

/// Compact arena index used inside a schematic graph.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
///
/// Indices are only meaningful for the graph snapshot that issued them; the
/// schematic-local string ids are the stable external identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Create an Id from a `usize` position, failing if it does not fit in u32.
    pub fn from_usize(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .filter(|i| *i < u32::MAX)
            .map(Self::from_index)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Recover the 0-based index as a `usize` for slice access.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Index of a component in a schematic's component arena.
pub type CompIdx = Id;
/// Index of a relationship in a schematic's edge list.
pub type EdgeIdx = Id;
