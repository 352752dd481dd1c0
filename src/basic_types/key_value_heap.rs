//! A heap where the keys range over [0, ..., n - 1] and the values are
//! nonnegative floating points. The heap can be queried for the key with the
//! maximum value, keys can be (temporarily) removed and readded, and values
//! can be incremented or uniformly divided.

use std::ops::AddAssign;
use std::ops::DivAssign;

use super::KeyedVec;
use super::StorageKey;
use crate::basic_types::HashSet;
use crate::pitaya_assert_moderate;

/// A max-heap over generalised `Key`s (required to implement [`StorageKey`])
/// and `Value`s (required to be ordered, divisible and addable).
#[derive(Debug)]
pub(crate) struct KeyValueHeap<Key: StorageKey, Value> {
    /// Contains the values stored as a heap; the value of key `i` is at index
    /// `map_key_to_position[i]`.
    values: Vec<Value>,
    /// `map_key_to_position[i]` is the index of the value of the key `i` in
    /// [`KeyValueHeap::values`].
    map_key_to_position: KeyedVec<Key, usize>,
    /// `map_position_to_key[i]` is the key associated with position `i` in
    /// [`KeyValueHeap::values`].
    map_position_to_key: Vec<Key>,
    /// One past the last element that is logically present in the heap;
    /// positions at or beyond this are deleted keys.
    end_position: usize,
}

impl<Key: StorageKey, Value> Default for KeyValueHeap<Key, Value> {
    fn default() -> Self {
        Self {
            values: Default::default(),
            map_key_to_position: Default::default(),
            map_position_to_key: Default::default(),
            end_position: Default::default(),
        }
    }
}

impl<
        Key: StorageKey + Copy,
        Value: AddAssign<Value> + DivAssign<Value> + PartialOrd + Default + Copy,
    > KeyValueHeap<Key, Value>
{
    /// Return the key with maximum value from the heap, or None if the heap is
    /// empty. Does not delete the key (see [`KeyValueHeap::pop_max`]).
    ///
    /// O(1)
    pub(crate) fn peek_max(&self) -> Option<(&Key, &Value)> {
        if self.is_empty() {
            None
        } else {
            Some((
                &self.map_position_to_key[0],
                &self.values[self.map_key_to_position[self.map_position_to_key[0]]],
            ))
        }
    }

    pub(crate) fn get_value(&self, key: Key) -> &Value {
        pitaya_assert_moderate!(
            key.index() < self.map_key_to_position.len(),
            "Attempted to get key with index {} for a map with length {}",
            key.index(),
            self.map_key_to_position.len()
        );
        &self.values[self.map_key_to_position[key]]
    }

    /// Deletes the key with maximum value from the heap and returns it, or
    /// None if the heap is empty.
    ///
    /// O(log n)
    pub(crate) fn pop_max(&mut self) -> Option<Key> {
        if self.is_empty() {
            return None;
        }
        let best_key = self.map_position_to_key[0];
        pitaya_assert_moderate!(0 == self.map_key_to_position[best_key]);
        self.delete_key(best_key);
        Some(best_key)
    }

    /// Increments the value of the element of 'key' by 'increment'.
    ///
    /// Worst-case O(log n)
    pub(crate) fn increment(&mut self, key: Key, increment: Value) {
        let position = self.map_key_to_position[key];
        self.values[position] += increment;
        // Increments may be applied to deleted keys, in which case the heap
        // property is untouched.
        if self.is_key_present(key) {
            self.sift_up(position);
        }
    }

    /// Restores the entry with key 'key' to the heap if it is not present,
    /// otherwise does nothing. Its value is the value recorded before
    /// [`KeyValueHeap::delete_key`] was called.
    ///
    /// O(log n)
    pub(crate) fn restore_key(&mut self, key: Key) {
        if !self.is_key_present(key) {
            // The key is somewhere in the range [end_position, len - 1]:
            // place it at the end of the heap, extend the heap, and sift up.
            let position = self.map_key_to_position[key];
            pitaya_assert_moderate!(position >= self.end_position);
            self.swap_positions(position, self.end_position);
            self.end_position += 1;
            self.sift_up(self.end_position - 1);
        }
    }

    /// Removes the entry with key 'key' (temporarily) from the heap if the
    /// key is present, otherwise does nothing. Its value remains recorded
    /// internally, is available upon calling [`KeyValueHeap::restore_key`],
    /// and is still subject to [`KeyValueHeap::divide_values`].
    ///
    /// O(log n)
    pub(crate) fn delete_key(&mut self, key: Key) {
        if self.is_key_present(key) {
            let position = self.map_key_to_position[key];
            self.swap_positions(position, self.end_position - 1);
            self.end_position -= 1;
            if position < self.end_position {
                self.sift_down(position);
            }
        }
    }

    pub(crate) fn is_key_present(&self, key: Key) -> bool {
        self.map_key_to_position[key] < self.end_position
    }

    /// Whether any non-deleted entries remain.
    fn is_empty(&self) -> bool {
        self.end_position == 0
    }

    /// Increases the size of the heap by one entry holding `value` for the
    /// next fresh key.
    pub(crate) fn grow(&mut self, key: Key, value: Value) {
        pitaya_assert_moderate!(key.index() == self.values.len());
        let last_index = self.values.len();
        self.values.push(value);
        // The key starts at the very end and is sifted to its position.
        self.map_key_to_position.push(last_index);
        self.map_position_to_key.push(key);
        self.swap_positions(self.end_position, last_index);
        self.end_position += 1;
        self.sift_up(self.end_position - 1);
    }

    /// Divides all the values in the heap by 'divisor', including the values
    /// of deleted keys.
    ///
    /// O(n)
    pub(crate) fn divide_values(&mut self, divisor: Value) {
        for value in self.values.iter_mut() {
            *value /= divisor;
        }
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        let key_i = self.map_position_to_key[a];
        pitaya_assert_moderate!(self.map_key_to_position[key_i] == a);
        let key_j = self.map_position_to_key[b];
        pitaya_assert_moderate!(self.map_key_to_position[key_j] == b);

        self.values.swap(a, b);
        self.map_position_to_key.swap(a, b);
        self.map_key_to_position.swap(key_i.index(), key_j.index());

        pitaya_assert_moderate!(
            self.map_key_to_position[key_i] == b && self.map_key_to_position[key_j] == a
        );

        pitaya_assert_moderate!(
            self.map_key_to_position
                .iter()
                .collect::<HashSet<&usize>>()
                .len()
                == self.map_key_to_position.len()
        )
    }

    fn sift_up(&mut self, position: usize) {
        if position > 0 {
            let parent_position = KeyValueHeap::<Key, Value>::get_parent_position(position);
            if self.values[parent_position] < self.values[position] {
                self.swap_positions(parent_position, position);
                self.sift_up(parent_position);
            }
        }
    }

    fn sift_down(&mut self, position: usize) {
        pitaya_assert_moderate!(position < self.end_position);

        if !self.is_heap_locally(position) {
            let largest_child_position = self.get_largest_child_position(position);
            self.swap_positions(largest_child_position, position);
            self.sift_down(largest_child_position);
        }
    }

    fn is_heap_locally(&self, position: usize) -> bool {
        // Either the node is a leaf, or the value of the parent is at least as
        // large as the values of its children.
        let left_child_position = KeyValueHeap::<Key, Value>::get_left_child_position(position);
        let right_child_position = KeyValueHeap::<Key, Value>::get_right_child_position(position);

        self.is_leaf(position)
            || (self.values[position] >= self.values[left_child_position]
                && (right_child_position >= self.end_position
                    || self.values[position] >= self.values[right_child_position]))
    }

    fn is_leaf(&self, position: usize) -> bool {
        KeyValueHeap::<Key, Value>::get_left_child_position(position) >= self.end_position
    }

    fn get_largest_child_position(&self, position: usize) -> usize {
        pitaya_assert_moderate!(!self.is_leaf(position));

        let left_child_position = KeyValueHeap::<Key, Value>::get_left_child_position(position);
        let right_child_position = KeyValueHeap::<Key, Value>::get_right_child_position(position);

        if right_child_position < self.end_position
            && self.values[right_child_position] > self.values[left_child_position]
        {
            right_child_position
        } else {
            left_child_position
        }
    }

    fn get_parent_position(child_position: usize) -> usize {
        pitaya_assert_moderate!(child_position > 0, "Root has no parent.");
        (child_position - 1) / 2
    }

    fn get_left_child_position(position: usize) -> usize {
        2 * position + 1
    }

    fn get_right_child_position(position: usize) -> usize {
        2 * position + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::PropositionalVariable;

    fn heap_with_values(values: &[f64]) -> KeyValueHeap<PropositionalVariable, f64> {
        let mut heap = KeyValueHeap::default();
        for (index, &value) in values.iter().enumerate() {
            heap.grow(PropositionalVariable::new(index as u32), value);
        }
        heap
    }

    #[test]
    fn maximum_is_reported_and_popped_in_order() {
        let mut heap = heap_with_values(&[1.0, 5.0, 3.0]);

        assert_eq!(
            heap.peek_max().map(|(key, _)| *key),
            Some(PropositionalVariable::new(1))
        );
        assert_eq!(heap.pop_max(), Some(PropositionalVariable::new(1)));
        assert_eq!(heap.pop_max(), Some(PropositionalVariable::new(2)));
        assert_eq!(heap.pop_max(), Some(PropositionalVariable::new(0)));
        assert_eq!(heap.pop_max(), None);
    }

    #[test]
    fn an_empty_heap_yields_nothing() {
        let mut heap: KeyValueHeap<PropositionalVariable, f64> = KeyValueHeap::default();

        assert_eq!(heap.peek_max(), None);
        assert_eq!(heap.pop_max(), None);
    }

    #[test]
    fn deleting_every_key_empties_the_heap() {
        let mut heap = heap_with_values(&[1.0, 5.0]);

        heap.delete_key(PropositionalVariable::new(0));
        heap.delete_key(PropositionalVariable::new(1));
        assert_eq!(heap.peek_max(), None);
    }

    #[test]
    fn incrementing_reorders_the_heap() {
        let mut heap = heap_with_values(&[1.0, 5.0, 3.0]);

        heap.increment(PropositionalVariable::new(0), 10.0);
        assert_eq!(heap.pop_max(), Some(PropositionalVariable::new(0)));
    }

    #[test]
    fn deleted_keys_keep_their_values_until_restored() {
        let mut heap = heap_with_values(&[1.0, 5.0, 3.0]);
        let best = PropositionalVariable::new(1);

        heap.delete_key(best);
        assert!(!heap.is_key_present(best));
        assert_eq!(heap.peek_max().map(|(key, _)| *key), Some(PropositionalVariable::new(2)));

        heap.restore_key(best);
        assert_eq!(heap.peek_max().map(|(key, _)| *key), Some(best));
        assert_eq!(*heap.get_value(best), 5.0);
    }

    #[test]
    fn dividing_rescales_deleted_values_too() {
        let mut heap = heap_with_values(&[4.0, 8.0]);

        heap.delete_key(PropositionalVariable::new(1));
        heap.divide_values(2.0);

        assert_eq!(*heap.get_value(PropositionalVariable::new(1)), 4.0);
        assert_eq!(*heap.get_value(PropositionalVariable::new(0)), 2.0);
    }
}
