//! An ordered N-ary tree keyed by value.
//!
//! A [`Tree`] stores values in an index-addressed arena. Nodes are inserted
//! under the first node holding a given parent value, removed together with
//! their subtree, and asked for the chain of values leading up to the root.
//!
//! ```
//! use valuetree::{InsertError, Tree};
//!
//! let mut tree = Tree::new();
//! tree.insert("Root", None)?;
//! tree.insert("Child1", Some(&"Root"))?;
//! tree.insert("Grandchild1", Some(&"Child1"))?;
//! tree.insert("GreatGrandchild", Some(&"Grandchild1"))?;
//!
//! assert_eq!(
//!     tree.get_all_parents(&"GreatGrandchild"),
//!     [&"Grandchild1", &"Child1", &"Root"],
//! );
//! # Ok::<(), InsertError>(())
//! ```
//!
//! Edge cases where reasonable behaviors differ, such as removing a root that
//! still has children, are selected with a [`TreePolicy`].
pub mod forest;
pub mod memory;
pub mod policy;
pub mod tree;

pub use policy::{OrphanInsert, RootRemoval, TreePolicy};
pub use tree::{InsertError, Iter, NodeRef, Tree, ValidationError};

/// Handle to a node in a [`Tree`].
///
/// A handle names one node for the node's whole life. Once the node is
/// removed the handle stays dead: its slot may be reused by a later insertion,
/// but the new occupant carries a newer generation and the old handle resolves
/// to `None`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct NodeIndex {
    slot: u32,
    generation: u32,
}

impl memory::EntityIndex for NodeIndex {
    #[inline(always)]
    fn try_new(index: usize) -> Option<Self> {
        // `u32::MAX` stays reserved.
        let slot = u32::try_from(index).ok().filter(|&slot| slot < u32::MAX)?;
        Some(Self {
            slot,
            generation: 0,
        })
    }

    #[inline(always)]
    fn index(self) -> usize {
        self.slot as usize
    }
}

impl memory::GenerationalIndex for NodeIndex {
    #[inline(always)]
    fn with_generation(self, generation: u32) -> Self {
        Self { generation, ..self }
    }

    #[inline(always)]
    fn generation(self) -> u32 {
        self.generation
    }
}
