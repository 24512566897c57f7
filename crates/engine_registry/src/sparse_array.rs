//! Per-type component storage indexed directly by entity index.
//!
//! A [`SparseArray`] is a growable `Vec<Option<T>>`. Slot `i` holds the
//! component of the entity whose index is `i`, or `None`. Presence is an
//! explicit flag rather than a sentinel value, so any `T` can be stored.
//! Slots are never removed, only cleared, so indices stay stable.

use std::ops::Index;

/// Dense-by-index, sparse-by-entity storage for one component type.
#[derive(Debug, Clone)]
pub struct SparseArray<T> {
    data: Vec<Option<T>>,
}

impl<T> SparseArray<T> {
    /// Create an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Number of slots, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there are no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of slots holding a value.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|slot| slot.is_some()).count()
    }

    fn slot_mut(&mut self, pos: usize) -> &mut Option<T> {
        if pos >= self.data.len() {
            self.data.resize_with(pos + 1, || None);
        }
        &mut self.data[pos]
    }

    /// Store `value` at `pos`, growing with empty slots if needed. Any
    /// previous value is dropped.
    pub fn insert_at(&mut self, pos: usize, value: T) -> &mut T {
        self.slot_mut(pos).insert(value)
    }

    /// Construct a value in the slot at `pos` from `make`, growing if needed.
    pub fn emplace_at<F>(&mut self, pos: usize, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let slot = self.slot_mut(pos);
        *slot = None;
        slot.insert(make())
    }

    /// Clear the slot at `pos`, returning the value it held. Out-of-range
    /// positions are ignored.
    pub fn erase(&mut self, pos: usize) -> Option<T> {
        self.data.get_mut(pos).and_then(Option::take)
    }

    /// Returns the value at `pos`, if present.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&T> {
        self.data.get(pos).and_then(Option::as_ref)
    }

    /// Returns the value at `pos` mutably, if present.
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut T> {
        self.data.get_mut(pos).and_then(Option::as_mut)
    }

    /// Returns `true` if the slot at `pos` holds a value.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        self.get(pos).is_some()
    }

    /// Iterate every slot in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Option<T>> {
        self.data.iter()
    }

    /// Iterate every slot mutably in index order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Option<T>> {
        self.data.iter_mut()
    }

    /// Iterate `(index, value)` for present slots only.
    pub fn iter_present(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    /// Iterate `(index, value)` mutably for present slots only.
    pub fn iter_present_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        self.data
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (i, v)))
    }
}

impl<T> Default for SparseArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for SparseArray<T> {
    type Output = Option<T>;

    fn index(&self, pos: usize) -> &Self::Output {
        &self.data[pos]
    }
}

impl<'a, T> IntoIterator for &'a SparseArray<T> {
    type Item = &'a Option<T>;
    type IntoIter = std::slice::Iter<'a, Option<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
