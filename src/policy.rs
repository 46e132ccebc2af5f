//! Configurable edge-case behavior of a [`Tree`](crate::Tree).

/// What [`Tree::remove`](crate::Tree::remove) does when the matched node is the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RootRemoval {
    /// Clear the whole tree, discarding every descendant.
    #[default]
    Discard,
    /// Refuse to remove a root that still has children.
    RequireLeaf,
}

/// What [`Tree::insert`](crate::Tree::insert) does when no parent is given
/// but the tree already has a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrphanInsert {
    /// Fail with [`InsertError::ParentRequired`](crate::InsertError::ParentRequired).
    #[default]
    Reject,
    /// Append the new node as the last child of the root.
    AttachToRoot,
}

/// Edge-case policy for a [`Tree`](crate::Tree).
///
/// The default rejects parentless inserts into a non-empty tree and lets the
/// root be removed together with its subtree.
///
/// ```
/// # use valuetree::{OrphanInsert, RootRemoval, TreePolicy};
/// let policy = TreePolicy::new()
///     .root_removal(RootRemoval::RequireLeaf)
///     .orphan_insert(OrphanInsert::AttachToRoot);
///
/// assert_eq!(policy.root_removal, RootRemoval::RequireLeaf);
/// assert_ne!(policy, TreePolicy::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TreePolicy {
    pub root_removal: RootRemoval,
    pub orphan_insert: OrphanInsert,
}

impl TreePolicy {
    pub const fn new() -> Self {
        Self {
            root_removal: RootRemoval::Discard,
            orphan_insert: OrphanInsert::Reject,
        }
    }

    #[must_use]
    pub const fn root_removal(mut self, root_removal: RootRemoval) -> Self {
        self.root_removal = root_removal;
        self
    }

    #[must_use]
    pub const fn orphan_insert(mut self, orphan_insert: OrphanInsert) -> Self {
        self.orphan_insert = orphan_insert;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_matches_default() {
        assert_eq!(TreePolicy::new(), TreePolicy::default());
    }
}
