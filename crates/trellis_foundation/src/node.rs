//! Generational identifiers for tree nodes.

use std::fmt;

/// Identifier for a node slot plus the generation it was allocated in.
///
/// Slots are reused after a node is discarded, and the generation moves
/// on each time, so an id held across a discard stops matching its slot
/// instead of silently aliasing whatever lives there now.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId {
    /// Slot index in the owning arena.
    pub index: u32,
    /// Generation the slot held when this id was issued.
    pub generation: u32,
}

impl NodeId {
    /// Builds an id from its raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The "no node" sentinel.
    ///
    /// Its index is `u32::MAX`, which no arena ever hands out.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    /// Returns true for the sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NodeId(null)")
        } else {
            write!(f, "NodeId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Node(null)")
        } else {
            write!(f, "Node({})", self.index)
        }
    }
}
