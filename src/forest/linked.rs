use std::iter::FusedIterator;
use std::mem::{replace, take};

use thiserror::Error;

use crate::memory::{EntityIndex, SecondaryMap};

/// A forest of nodes using doubly linked lists.
///
/// The order of child nodes is maintained as a doubly linked list which
/// supports efficient insertion and removal at any point in the list.
#[derive(Debug, Clone)]
pub struct LinkedForest<Index> {
    data: SecondaryMap<Index, NodeData<Index>>,
}

impl<Index: EntityIndex> LinkedForest<Index> {
    /// Creates a new empty forest.
    pub fn new() -> Self {
        Self {
            data: SecondaryMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: SecondaryMap::with_capacity(capacity),
        }
    }
}

impl<Index: EntityIndex> Default for LinkedForest<Index> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Index: EntityIndex> LinkedForest<Index> {
    /// Attaches a node as the last child of a parent node.
    ///
    /// # Errors
    ///
    ///  - When the attachment would introduce a cycle.
    ///  - When the node is already attached.
    ///
    /// # Panics
    ///
    /// Panics when the parent node will have more than `u32::MAX` children.
    pub fn attach_last(&mut self, node: Index, parent: Index) -> Result<(), AttachError> {
        if !self.cycle_check(node, parent) {
            return Err(AttachError::Cycle);
        } else if self.data[node].parent.is_some() {
            return Err(AttachError::AlreadyAttached);
        }

        self.data[parent].children_count += 1;
        self.data[node].parent = Some(parent);

        match replace(&mut self.data[parent].children[1], Some(node)) {
            Some(prev) => {
                self.data[prev].siblings[1] = Some(node);
                self.data[node].siblings[0] = Some(prev);
            }
            None => self.data[parent].children[0] = Some(node),
        }

        Ok(())
    }

    /// Ensures that making `node` a child of `parent` would not introduce a cycle.
    fn cycle_check(&self, node: Index, mut parent: Index) -> bool {
        if parent == node {
            return false;
        }

        // When `node` does not have any children it can't contain `parent`.
        if self.data[node].children[0].is_none() {
            return true;
        }

        loop {
            if parent == node {
                return false;
            } else if let Some(next) = self.data[parent].parent {
                parent = next;
            } else {
                return true;
            }
        }
    }

    /// Detaches a node from its parent, returning the former parent.
    ///
    /// The node keeps its own children. Does nothing and returns `None` when
    /// the node is a root.
    pub fn detach(&mut self, node: Index) -> Option<Index> {
        let node_data = self.data.get_mut(node)?;

        let parent = take(&mut node_data.parent);
        let siblings = take(&mut node_data.siblings);

        if let Some(parent) = parent {
            self.data[parent].children_count -= 1;

            match siblings[0] {
                Some(prev) => self.data[prev].siblings[1] = siblings[1],
                None => self.data[parent].children[0] = siblings[1],
            }

            match siblings[1] {
                Some(next) => self.data[next].siblings[0] = siblings[0],
                None => self.data[parent].children[1] = siblings[0],
            }
        }

        parent
    }

    /// Forgets all links of a node so that its index can be reused.
    ///
    /// Only the node's own entry is reset. Callers forget a whole subtree at
    /// once after detaching its top node, so that no remaining node links to a
    /// forgotten one.
    pub fn forget(&mut self, node: Index) {
        self.data.reset(node);
    }

    /// Removes every link in the forest.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns a node's parent or `None` if it is a root.
    #[inline]
    pub fn parent(&self, node: Index) -> Option<Index> {
        self.data[node].parent
    }

    /// Returns whether a node has no parent.
    #[inline]
    pub fn is_root(&self, node: Index) -> bool {
        self.data[node].parent.is_none()
    }

    /// Returns the next sibling in the node's parent, if any.
    ///
    /// Also returns `None` if the node is a root.
    #[inline]
    pub fn next(&self, node: Index) -> Option<Index> {
        self.data[node].siblings[1]
    }

    /// Returns the previous sibling in the node's parent, if any.
    ///
    /// Also returns `None` if the node is a root.
    #[inline]
    pub fn prev(&self, node: Index) -> Option<Index> {
        self.data[node].siblings[0]
    }

    /// Iterates over the node's children.
    #[inline]
    pub fn children(&self, node: Index) -> Children<'_, Index> {
        let node_data = &self.data[node];
        Children {
            forest: self,
            next: node_data.children[0],
            prev: node_data.children[1],
            len: node_data.children_count as usize,
        }
    }

    /// Returns the number of the node's children.
    #[inline]
    pub fn child_count(&self, node: Index) -> usize {
        self.data[node].children_count as usize
    }

    /// Iterates over the node's ancestors, starting with its parent.
    #[inline]
    pub fn ancestors(&self, node: Index) -> Ancestors<'_, Index> {
        Ancestors {
            forest: self,
            next: self.parent(node),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData<Index> {
    /// The first and last child of the node, if any.
    children: [Option<Index>; 2],
    /// The number of children
    children_count: u32,
    /// The parent of a node, if any.
    parent: Option<Index>,
    /// The previous and next sibling of a node, if any.
    siblings: [Option<Index>; 2],
}

impl<Index> Default for NodeData<Index> {
    fn default() -> Self {
        Self {
            children: [None, None],
            children_count: 0,
            parent: None,
            siblings: [None, None],
        }
    }
}

/// Iterator created by [`LinkedForest::children`].
#[derive(Debug, Clone)]
pub struct Children<'a, Index> {
    forest: &'a LinkedForest<Index>,
    next: Option<Index>,
    prev: Option<Index>,
    len: usize,
}

impl<'a, Index: EntityIndex> Iterator for Children<'a, Index> {
    type Item = Index;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        let current = self.next?;
        self.next = self.forest.next(current);
        Some(current)
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, Index: EntityIndex> DoubleEndedIterator for Children<'a, Index> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;
        let current = self.prev?;
        self.prev = self.forest.prev(current);
        Some(current)
    }
}

impl<'a, Index: EntityIndex> ExactSizeIterator for Children<'a, Index> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, Index: EntityIndex> FusedIterator for Children<'a, Index> {}

/// Iterator created by [`LinkedForest::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a, Index> {
    forest: &'a LinkedForest<Index>,
    next: Option<Index>,
}

impl<'a, Index: EntityIndex> Iterator for Ancestors<'a, Index> {
    type Item = Index;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.forest.parent(current);
        Some(current)
    }
}

impl<'a, Index: EntityIndex> FusedIterator for Ancestors<'a, Index> {}

/// Error returned by [`LinkedForest::attach_last`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("the node is already attached")]
    AlreadyAttached,
    #[error("attaching the node would introduce a cycle")]
    Cycle,
}
