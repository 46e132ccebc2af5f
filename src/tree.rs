use std::fmt::{self, Debug, Display};
use std::iter::FusedIterator;

use bitvec::prelude::*;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::forest::LinkedForest;
use crate::memory::{EntityIndex, Slab};
use crate::policy::{OrphanInsert, RootRemoval, TreePolicy};
use crate::NodeIndex;

/// An ordered N-ary tree whose nodes are looked up by value.
///
/// Values live in a slab arena and the parent/child structure is kept in a
/// separate [`LinkedForest`], so a node is addressed by its [`NodeIndex`] and
/// a parent link is never an owning reference. Value equality does not imply
/// node identity: equal values may be stored in any number of nodes, and every
/// value-keyed operation acts on the first match of a pre-order search with
/// children visited in insertion order.
///
/// # Example
///
/// ```
/// # use valuetree::Tree;
/// let mut tree = Tree::new();
/// tree.insert("root", None).unwrap();
/// tree.insert("child", Some(&"root")).unwrap();
/// tree.insert("grandchild", Some(&"child")).unwrap();
///
/// assert_eq!(tree.get_all_parents(&"grandchild"), [&"child", &"root"]);
/// assert!(tree.remove(&"child"));
/// assert!(tree.find(&"grandchild").is_none());
/// assert_eq!(tree.len(), 1);
/// ```
#[derive(Clone)]
pub struct Tree<V> {
    values: Slab<NodeIndex, V>,
    forest: LinkedForest<NodeIndex>,
    root: Option<NodeIndex>,
    policy: TreePolicy,
}

impl<V: Debug> Debug for Tree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("len", &self.values.len())
            .field("policy", &self.policy)
            .field("values", &self.values)
            .finish()
    }
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Tree<V> {
    /// Creates a new empty tree with the default [`TreePolicy`].
    pub fn new() -> Self {
        Self::with_policy(TreePolicy::default())
    }

    /// Creates a new empty tree with preallocated capacity for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Slab::with_capacity(capacity),
            forest: LinkedForest::with_capacity(capacity),
            root: None,
            policy: TreePolicy::default(),
        }
    }

    /// Creates a new empty tree that resolves edge cases according to `policy`.
    pub fn with_policy(policy: TreePolicy) -> Self {
        Self {
            values: Slab::new(),
            forest: LinkedForest::new(),
            root: None,
            policy,
        }
    }

    #[inline]
    pub fn policy(&self) -> TreePolicy {
        self.policy
    }

    /// Returns the number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the tree has no root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn root(&self) -> Option<NodeRef<'_, V>> {
        self.node(self.root?)
    }

    /// Resolves a node index, returning `None` when the node has been removed.
    ///
    /// Indices of removed nodes never resolve again, even once a later
    /// insertion reuses their slot.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> Option<NodeRef<'_, V>> {
        self.values.contains(index).then_some(NodeRef { tree: self, index })
    }

    /// Mutably borrows the value of a node.
    ///
    /// Changing a value changes which searches will match the node.
    #[inline]
    pub fn value_mut(&mut self, index: NodeIndex) -> Option<&mut V> {
        self.values.get_mut(index)
    }

    /// Removes every node.
    pub fn clear(&mut self) {
        self.values.clear();
        self.forest.clear();
        self.root = None;
    }

    /// Iterates over the nodes in pre-order, children in insertion order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            tree: self,
            preorder: Preorder::new(&self.forest, self.root),
        }
    }

    /// Inserts a node as the last child of the node at `parent`.
    ///
    /// # Errors
    ///
    ///  - [`InsertError::UnknownNode`] when `parent` has been removed, even if
    ///    its slot now holds another node.
    ///  - [`InsertError::CapacityExceeded`] when every node index is in use.
    #[instrument(level = "trace", skip(self, value))]
    pub fn insert_under(&mut self, value: V, parent: NodeIndex) -> Result<NodeIndex, InsertError> {
        if !self.values.contains(parent) {
            return Err(InsertError::UnknownNode(parent));
        }

        self.attach_new(value, parent)
    }

    fn allocate(&mut self, value: V) -> Result<NodeIndex, InsertError> {
        self.values
            .try_insert(value)
            .map_err(|_| InsertError::CapacityExceeded)
    }

    fn attach_new(&mut self, value: V, parent: NodeIndex) -> Result<NodeIndex, InsertError> {
        let node = self.allocate(value)?;

        if let Err(err) = self.forest.attach_last(node, parent) {
            unreachable!("fresh node {node:?} could not be attached to {parent:?}: {err}");
        }

        debug!(?node, ?parent, "attached node");
        Ok(node)
    }

    /// Removes the node at `index` together with its whole subtree.
    ///
    /// Returns the node's value, or `None` when the node does not exist or is
    /// a root with children under [`RootRemoval::RequireLeaf`].
    #[instrument(level = "trace", skip(self))]
    pub fn remove_node(&mut self, index: NodeIndex) -> Option<V> {
        if !self.values.contains(index) {
            return None;
        }

        if self.root == Some(index)
            && self.policy.root_removal == RootRemoval::RequireLeaf
            && self.forest.child_count(index) > 0
        {
            debug!(root = ?index, "refusing to remove a root that has children");
            return None;
        }

        let subtree: Vec<NodeIndex> = Preorder::new(&self.forest, Some(index)).collect();
        self.forest.detach(index);

        if self.root == Some(index) {
            self.root = None;
        }

        for &descendant in &subtree[1..] {
            self.forest.forget(descendant);
            self.values.remove(descendant);
        }

        self.forest.forget(index);
        debug!(node = ?index, descendants = subtree.len() - 1, "removed subtree");
        self.values.remove(index)
    }

    /// Checks the structural invariants of the tree.
    ///
    /// Every stored node must be reachable from the root exactly once, and
    /// every child must name the node it is listed under as its parent.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(root) = self.root else {
            return if self.values.is_empty() {
                Ok(())
            } else {
                Err(ValidationError::Unreachable(self.values.len()))
            };
        };

        if !self.values.contains(root) {
            return Err(ValidationError::DanglingRoot(root));
        } else if self.forest.parent(root).is_some() {
            return Err(ValidationError::RootHasParent(root));
        }

        let mut visited = bitvec![usize, Lsb0; 0; self.values.upper_bound()];
        let mut stack = vec![root];
        let mut reached = 0;

        while let Some(node) = stack.pop() {
            if !self.values.contains(node) {
                return Err(ValidationError::DanglingLink(node));
            } else if visited.replace(node.index(), true) {
                return Err(ValidationError::Cycle(node));
            }

            reached += 1;

            for child in self.forest.children(node) {
                if self.forest.parent(child) != Some(node) {
                    return Err(ValidationError::ParentMismatch {
                        child,
                        parent: node,
                    });
                }
                stack.push(child);
            }
        }

        match self.values.len() - reached {
            0 => Ok(()),
            unreachable => Err(ValidationError::Unreachable(unreachable)),
        }
    }
}

impl<V: PartialEq> Tree<V> {
    /// Inserts `value` under the first node whose value equals `parent`.
    ///
    /// Without a parent the value becomes the root of an empty tree. A
    /// parentless insert into a non-empty tree follows the tree's
    /// [`OrphanInsert`] policy.
    ///
    /// # Errors
    ///
    ///  - [`InsertError::ParentNotFound`] when no node holds `parent`, which
    ///    includes any parent on an empty tree.
    ///  - [`InsertError::ParentRequired`] when `parent` is `None`, the tree
    ///    already has a root and the policy is [`OrphanInsert::Reject`].
    ///  - [`InsertError::CapacityExceeded`] when every node index is in use.
    ///
    /// # Example
    ///
    /// ```
    /// # use valuetree::{InsertError, Tree};
    /// let mut tree = Tree::new();
    /// let root = tree.insert(1, None).unwrap();
    /// let child = tree.insert(2, Some(&1)).unwrap();
    ///
    /// assert_eq!(tree.node(child).unwrap().parent().unwrap().index(), root);
    /// assert_eq!(tree.insert(3, None), Err(InsertError::ParentRequired));
    /// assert_eq!(tree.insert(3, Some(&9)), Err(InsertError::ParentNotFound));
    /// ```
    #[instrument(level = "trace", skip_all, fields(with_parent = parent.is_some()))]
    pub fn insert(&mut self, value: V, parent: Option<&V>) -> Result<NodeIndex, InsertError> {
        let parent = match (self.root, parent) {
            (None, None) => {
                let root = self.allocate(value)?;
                self.root = Some(root);
                debug!(?root, "inserted root");
                return Ok(root);
            }
            (None, Some(_)) => return Err(InsertError::ParentNotFound),
            (Some(root), None) => match self.policy.orphan_insert {
                OrphanInsert::Reject => return Err(InsertError::ParentRequired),
                OrphanInsert::AttachToRoot => root,
            },
            (Some(_), Some(parent)) => self
                .find_index(parent)
                .ok_or(InsertError::ParentNotFound)?,
        };

        self.attach_new(value, parent)
    }

    /// Removes the first node holding `value` along with its subtree.
    ///
    /// Returns `false` when no node matches, or when the match is a root with
    /// children under [`RootRemoval::RequireLeaf`].
    #[instrument(level = "trace", skip_all)]
    pub fn remove(&mut self, value: &V) -> bool {
        match self.find_index(value) {
            Some(node) => self.remove_node(node).is_some(),
            None => {
                trace!("no node to remove");
                false
            }
        }
    }

    /// Finds the first node holding `value` in pre-order.
    ///
    /// ```
    /// # use valuetree::Tree;
    /// let mut tree = Tree::new();
    /// tree.insert('a', None).unwrap();
    /// let first = tree.insert('x', Some(&'a')).unwrap();
    /// tree.insert('x', Some(&'a')).unwrap();
    ///
    /// assert_eq!(tree.find(&'x').map(|node| node.index()), Some(first));
    /// assert!(tree.find(&'z').is_none());
    /// ```
    pub fn find(&self, value: &V) -> Option<NodeRef<'_, V>> {
        self.node(self.find_index(value)?)
    }

    /// Returns the index of the first node holding `value` in pre-order.
    pub fn find_index(&self, value: &V) -> Option<NodeIndex> {
        Preorder::new(&self.forest, self.root).find(|&node| self.values[node] == *value)
    }

    #[inline]
    pub fn contains(&self, value: &V) -> bool {
        self.find_index(value).is_some()
    }

    /// Returns the values of the ancestors of the first node holding `value`.
    ///
    /// The nearest ancestor comes first and the root last. The result is empty
    /// for the root and for values that are not in the tree.
    pub fn get_all_parents(&self, value: &V) -> Vec<&V> {
        match self.find_index(value) {
            Some(node) => self
                .forest
                .ancestors(node)
                .map(|ancestor| &self.values[ancestor])
                .collect(),
            None => Vec::new(),
        }
    }
}

impl<V: Display> Tree<V> {
    /// Renders the tree with one node per line, indented two spaces per level.
    ///
    /// ```
    /// # use valuetree::Tree;
    /// let mut tree = Tree::new();
    /// tree.insert("root", None).unwrap();
    /// tree.insert("a", Some(&"root")).unwrap();
    /// tree.insert("b", Some(&"a")).unwrap();
    /// tree.insert("c", Some(&"root")).unwrap();
    ///
    /// assert_eq!(tree.render(), "root\n  a\n    b\n  c\n");
    /// ```
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl<V: Display> Display for Tree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<(NodeIndex, usize)> = self.root.map(|root| (root, 0)).into_iter().collect();

        while let Some((node, depth)) = stack.pop() {
            writeln!(f, "{:indent$}{}", "", self.values[node], indent = depth * 2)?;
            stack.extend(self.forest.children(node).rev().map(|child| (child, depth + 1)));
        }

        Ok(())
    }
}

/// A borrowed node of a [`Tree`].
pub struct NodeRef<'a, V> {
    tree: &'a Tree<V>,
    index: NodeIndex,
}

impl<'a, V> Clone for NodeRef<'a, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, V> Copy for NodeRef<'a, V> {}

impl<'a, V: Debug> Debug for NodeRef<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("index", &self.index)
            .field("value", self.value())
            .finish()
    }
}

impl<'a, V> NodeRef<'a, V> {
    #[inline]
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    #[inline]
    pub fn value(&self) -> &'a V {
        &self.tree.values[self.index]
    }

    /// Returns the node's parent, or `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeRef<'a, V>> {
        let index = self.tree.forest.parent(self.index)?;
        Some(NodeRef {
            tree: self.tree,
            index,
        })
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.tree.forest.is_root(self.index)
    }

    /// Iterates over the node's children in insertion order.
    pub fn children(
        &self,
    ) -> impl DoubleEndedIterator<Item = NodeRef<'a, V>> + ExactSizeIterator + FusedIterator + 'a
    {
        let tree = self.tree;
        tree.forest
            .children(self.index)
            .map(move |index| NodeRef { tree, index })
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.tree.forest.child_count(self.index)
    }

    /// Iterates over the node's ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a, V>> + FusedIterator + 'a {
        let tree = self.tree;
        tree.forest
            .ancestors(self.index)
            .map(move |index| NodeRef { tree, index })
    }

    /// Returns the number of edges between the node and the root.
    pub fn depth(&self) -> usize {
        self.tree.forest.ancestors(self.index).count()
    }
}

/// Pre-order walk over a subtree with an explicit stack.
struct Preorder<'a> {
    forest: &'a LinkedForest<NodeIndex>,
    stack: Vec<NodeIndex>,
}

impl<'a> Preorder<'a> {
    fn new(forest: &'a LinkedForest<NodeIndex>, start: Option<NodeIndex>) -> Self {
        Self {
            forest,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reversed so that the first child is popped next.
        self.stack.extend(self.forest.children(node).rev());
        Some(node)
    }
}

impl<'a> FusedIterator for Preorder<'a> {}

/// Iterator created by [`Tree::iter`].
pub struct Iter<'a, V> {
    tree: &'a Tree<V>,
    preorder: Preorder<'a>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = NodeRef<'a, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.preorder.next()?;
        Some(NodeRef {
            tree: self.tree,
            index,
        })
    }
}

impl<'a, V> FusedIterator for Iter<'a, V> {}

impl<'a, V> IntoIterator for &'a Tree<V> {
    type Item = NodeRef<'a, V>;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Error returned by [`Tree::insert`] and [`Tree::insert_under`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("parent node not found")]
    ParentNotFound,
    #[error("a parent is required once the tree has a root")]
    ParentRequired,
    #[error("unknown node {0:?}")]
    UnknownNode(NodeIndex),
    #[error("the tree has no node index left")]
    CapacityExceeded,
}

/// Error returned by [`Tree::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("root {0:?} does not refer to a stored node")]
    DanglingRoot(NodeIndex),
    #[error("root {0:?} has a parent")]
    RootHasParent(NodeIndex),
    #[error("link to removed node {0:?}")]
    DanglingLink(NodeIndex),
    #[error("node {0:?} is reachable more than once")]
    Cycle(NodeIndex),
    #[error("child {child:?} of {parent:?} names a different parent")]
    ParentMismatch { child: NodeIndex, parent: NodeIndex },
    #[error("{0} nodes are not reachable from the root")]
    Unreachable(usize),
}
