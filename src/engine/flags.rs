//! Effect flags - the mutation kinds a render leaves behind for commit.
//!
//! Each work node carries its own `flags` plus `subtree_flags`, the union of
//! every descendant's flags. Both are rebuilt from empty every render.

bitflags::bitflags! {
    /// Pending host mutations on a work node.
    ///
    /// Combine with bitwise OR: `Flags::PLACEMENT | Flags::UPDATE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u8 {
        /// The node's host instances must be inserted into the host parent.
        const PLACEMENT = 1 << 1;
        /// The node's existing host instance needs its props or text synced.
        const UPDATE = 1 << 2;
        /// One or more previous-generation children must be removed.
        const CHILD_DELETION = 1 << 3;
    }
}

impl Flags {
    /// Union of every flag the commit walker acts on.
    pub const MUTATION_MASK: Self = Self::PLACEMENT
        .union(Self::UPDATE)
        .union(Self::CHILD_DELETION);

    /// True if any mutation bit is set.
    #[inline]
    pub fn has_mutations(self) -> bool {
        self.intersects(Self::MUTATION_MASK)
    }
}

/// Fold a child's own and subtree flags into a parent's subtree flags.
#[inline]
pub fn bubble(subtree: Flags, child_flags: Flags, child_subtree: Flags) -> Flags {
    subtree | child_flags | child_subtree
}

// =============================================================================
// Tests
// =============================================================================
