use std::marker::PhantomData;
use std::ops::Index;
use std::ops::IndexMut;

/// A vector that can only be indexed by a dedicated key type, so that a
/// variable index is never confused with, say, a literal code.
///
/// Keys must implement [`StorageKey`].
#[derive(Debug, Hash, PartialEq, Eq)]
pub struct KeyedVec<Key, Value> {
    key: PhantomData<Key>,
    elements: Vec<Value>,
}

impl<Key, Value: Clone> Clone for KeyedVec<Key, Value> {
    fn clone(&self) -> Self {
        Self {
            key: PhantomData,
            elements: self.elements.clone(),
        }
    }
}

impl<Key, Value> Default for KeyedVec<Key, Value> {
    fn default() -> Self {
        Self {
            key: PhantomData,
            elements: Vec::default(),
        }
    }
}

impl<Key: StorageKey, Value> KeyedVec<Key, Value> {
    pub fn new(elements: Vec<Value>) -> Self {
        KeyedVec {
            key: PhantomData,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, value: Value) {
        self.elements.push(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'_ Value> {
        self.elements.iter()
    }

    /// Swaps the values at the two raw positions.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.elements.swap(a, b)
    }
}

impl<Key: StorageKey, Value: Clone> KeyedVec<Key, Value> {
    pub fn resize(&mut self, new_len: usize, value: Value) {
        self.elements.resize(new_len, value)
    }
}

impl<Key: StorageKey, Value> Index<Key> for KeyedVec<Key, Value> {
    type Output = Value;

    fn index(&self, index: Key) -> &Self::Output {
        &self.elements[index.index()]
    }
}

impl<Key: StorageKey, Value> IndexMut<Key> for KeyedVec<Key, Value> {
    fn index_mut(&mut self, index: Key) -> &mut Self::Output {
        &mut self.elements[index.index()]
    }
}

/// Types that can serve as the index of a [`KeyedVec`].
pub trait StorageKey {
    fn index(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::PropositionalVariable;

    #[test]
    fn swapping_positions_swaps_the_keyed_values() {
        let mut keyed_vec: KeyedVec<PropositionalVariable, u32> = KeyedVec::new(vec![10, 20, 30]);

        keyed_vec.swap(0, 2);

        assert_eq!(keyed_vec[PropositionalVariable::new(0)], 30);
        assert_eq!(keyed_vec[PropositionalVariable::new(2)], 10);
        assert_eq!(keyed_vec[PropositionalVariable::new(1)], 20);
    }
}
