use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use crate::memory::GenerationalIndex;

/// A slab arena that manages fixed-sized objects.
///
/// Freed slots are chained into a free list and reused by later insertions.
/// Every slot counts how often it has been freed, and a key only resolves
/// while its generation matches, so keys of removed values stay dead even
/// after their slot is reused.
#[derive(Debug, Clone)]
pub struct Slab<K, V> {
    data: Vec<Entry<V>>,
    free: usize,
    len: usize,
    phantom: PhantomData<K>,
}

impl<K, V> Slab<K, V>
where
    K: GenerationalIndex,
{
    /// Creates an empty [`Slab<K, V>`].
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            free: 0,
            len: 0,
            phantom: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            free: 0,
            len: 0,
            phantom: PhantomData,
        }
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there is no stored value.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns an upper bound on the slot of a valid key in this slab.
    pub fn upper_bound(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Stores a value, handing it back when the key type has no slot left.
    pub fn try_insert(&mut self, value: V) -> Result<K, V> {
        let index = self.free;

        let Some(key) = K::try_new(index) else {
            return Err(value);
        };

        let generation = if index == self.data.len() {
            self.data.push(Entry::Full {
                generation: 0,
                value,
            });
            self.free += 1;
            0
        } else if let Entry::Free { next, generation } = self.data[index] {
            self.free = next;
            self.data[index] = Entry::Full { generation, value };
            generation
        } else {
            unreachable!("free list points at an occupied slot");
        };

        self.len += 1;

        Ok(key.with_generation(generation))
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let index = key.index();
        let entry = self.data.get_mut(index)?;

        let freed = Entry::Free {
            next: self.free,
            generation: key.generation().wrapping_add(1),
        };

        match std::mem::replace(entry, freed) {
            Entry::Full { generation, value } if generation == key.generation() => {
                self.free = index;
                self.len -= 1;
                Some(value)
            }
            entry_data => {
                *entry = entry_data;
                None
            }
        }
    }

    pub fn get(&self, key: K) -> Option<&V> {
        match self.data.get(key.index()) {
            Some(Entry::Full { generation, value }) if *generation == key.generation() => {
                Some(value)
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        match self.data.get_mut(key.index()) {
            Some(Entry::Full { generation, value }) if *generation == key.generation() => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Frees every slot.
    ///
    /// Slots keep their generations, so keys handed out before the call stay
    /// dead.
    pub fn clear(&mut self) {
        for (index, entry) in self.data.iter_mut().enumerate() {
            let generation = match entry {
                Entry::Full { generation, .. } => generation.wrapping_add(1),
                Entry::Free { generation, .. } => *generation,
            };
            *entry = Entry::Free {
                next: index + 1,
                generation,
            };
        }

        self.free = 0;
        self.len = 0;
    }
}

impl<K, V> Index<K> for Slab<K, V>
where
    K: GenerationalIndex,
{
    type Output = V;

    fn index(&self, key: K) -> &Self::Output {
        self.get(key).expect("invalid key")
    }
}

impl<K, V> IndexMut<K> for Slab<K, V>
where
    K: GenerationalIndex,
{
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        self.get_mut(key).expect("invalid key")
    }
}

impl<K, V> Default for Slab<K, V>
where
    K: GenerationalIndex,
{
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum Entry<V> {
    Free { next: usize, generation: u32 },
    Full { generation: u32, value: V },
}
