//! Index-addressed storage for tree nodes.
//!
//! Nodes never hold references to each other. Every relation is an index into
//! one of the tables defined here, so ownership of the values stays with the
//! arena and a subtree is released by freeing its slots.
pub mod map;
pub mod slab;

pub use map::SecondaryMap;
pub use slab::Slab;

/// An index type that can address entries in a [`Slab`] or [`SecondaryMap`].
pub trait EntityIndex: Copy + Eq + Default {
    /// Creates an index from its position, or `None` when `index` does not fit
    /// the backing integer.
    fn try_new(index: usize) -> Option<Self>;
    fn index(self) -> usize;
}

/// An [`EntityIndex`] that also records which occupant of its slot it names.
///
/// A [`Slab`] bumps the generation of a slot every time the slot is freed, so
/// an index kept across a removal no longer matches the slot's new occupant.
pub trait GenerationalIndex: EntityIndex {
    /// Returns the same slot tagged with `generation`.
    fn with_generation(self, generation: u32) -> Self;
    fn generation(self) -> u32;
}

macro_rules! int_entity_impl {
    ($entity:ident) => {
        impl $crate::memory::EntityIndex for $entity {
            #[inline(always)]
            fn try_new(ix: usize) -> Option<Self> {
                if (ix <= <$entity>::MAX as usize || <$entity>::BITS > usize::BITS) {
                    Some(ix as $entity)
                } else {
                    None
                }
            }

            #[inline(always)]
            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

int_entity_impl!(u32);
int_entity_impl!(u8);
