use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
};

use super::EntityIndex;

/// Dense side table keyed by an [`EntityIndex`].
///
/// Keys that were never written read as the default value, so the map does not
/// need to be told when a new key starts to exist in the primary table.
#[derive(Debug, Clone)]
pub struct SecondaryMap<K, V> {
    values: Vec<V>,
    default: V,
    phantom: PhantomData<K>,
}

impl<K: EntityIndex, V: Clone> SecondaryMap<K, V> {
    pub fn new() -> Self
    where
        V: Default,
    {
        Self {
            values: Vec::new(),
            default: V::default(),
            phantom: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self
    where
        V: Default,
    {
        Self {
            values: Vec::with_capacity(capacity),
            default: V::default(),
            phantom: PhantomData,
        }
    }

    /// Mutably borrows the value stored for `key` if it was ever written.
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.values.get_mut(key.index())
    }

    /// Restores the default value for `key`.
    pub fn reset(&mut self, key: K) {
        if let Some(value) = self.values.get_mut(key.index()) {
            *value = self.default.clone();
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl<K: EntityIndex, V: Default + Clone> Default for SecondaryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EntityIndex, V> Index<K> for SecondaryMap<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        self.values.get(index.index()).unwrap_or(&self.default)
    }
}

impl<K: EntityIndex, V: Clone> IndexMut<K> for SecondaryMap<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        let index = index.index();

        if index >= self.values.len() {
            self.values.resize(index + 1, self.default.clone());
        }

        &mut self.values[index]
    }
}
