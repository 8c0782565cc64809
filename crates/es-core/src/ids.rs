use core::fmt;
use core::num::NonZeroU32;

/// Compact identifier for graph entities.
///
/// Stored as `index + 1` so that `Option<Id>` costs nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index.
    ///
    /// Returns `None` for `u32::MAX`, the one index that cannot be shifted.
    pub fn new(index: u32) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU32::new).map(Self)
    }

    /// Create an Id from a `usize` row index (node position in a state matrix).
    pub fn from_usize(index: usize) -> Option<Self> {
        u32::try_from(index).ok().and_then(Self::new)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
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

/// A node is a row of the state matrix.
pub type NodeId = Id;
/// An edge is a column of the edge index.
pub type EdgeId = Id;
