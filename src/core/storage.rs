use crate::error::PhysicsError;
use crate::Result;

use std::collections::HashMap;

/// A copyable identifier handing out access to an item in a [`Storage`]
pub trait Handle: Copy + Eq + Ord + std::hash::Hash + std::fmt::Debug {
    /// Builds a handle from its raw id
    fn from_raw(raw: u32) -> Self;

    /// Returns the raw id
    fn raw(&self) -> u32;
}

/// Handle-keyed storage for physics objects.
///
/// Handles start at 1 so a raw id of 0 can represent "invalid". Iteration
/// through [`Storage::handles`] is in ascending handle order, which keeps
/// every per-tick pass deterministic.
pub struct Storage<T, H: Handle> {
    items: HashMap<H, T>,
    next_id: u32,
}

impl<T, H: Handle> Storage<T, H> {
    /// Creates a new empty storage
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            next_id: 1,
        }
    }

    /// Adds an item to the storage and returns its handle
    pub fn add(&mut self, item: T) -> H {
        let handle = H::from_raw(self.next_id);
        self.next_id += 1;
        self.items.insert(handle, item);
        handle
    }

    /// Gets a reference to an item by its handle
    pub fn get(&self, handle: H) -> Option<&T> {
        self.items.get(&handle)
    }

    /// Gets a mutable reference to an item by its handle
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.items.get_mut(&handle)
    }

    /// Gets an item by its handle, returning an error if not found
    pub fn get_or_err(&self, handle: H) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{:?} not found", handle)))
    }

    /// Gets a mutable item by its handle, returning an error if not found
    pub fn get_mut_or_err(&mut self, handle: H) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{:?} not found", handle)))
    }

    /// Returns whether the storage holds an item for the handle
    pub fn contains(&self, handle: H) -> bool {
        self.items.contains_key(&handle)
    }

    /// Removes an item from the storage
    pub fn remove(&mut self, handle: H) -> Option<T> {
        self.items.remove(&handle)
    }

    /// Returns the number of items in the storage
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the storage is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clears all items from the storage
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns all handles in ascending order
    pub fn handles(&self) -> Vec<H> {
        let mut handles: Vec<H> = self.items.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Returns an iterator over all items, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.items.iter().map(|(h, item)| (*h, item))
    }

    /// Returns a mutable iterator over all items, in no particular order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> {
        self.items.iter_mut().map(|(h, item)| (*h, item))
    }
}

impl<T, H: Handle> Default for Storage<T, H> {
    fn default() -> Self {
        Self::new()
    }
}
