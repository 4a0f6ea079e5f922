//! Append-only arena for nodes and connections.
//!
//! Handles handed out by [`Arena::alloc`] stay valid for the lifetime of the
//! graph. Nothing is ever freed: a node or connection is retired by unlinking
//! it from every collection that mentions it, and the slot simply goes unused.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque handle types used as arena keys.
pub trait ArenaId: Copy {
    /// Creates a handle from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// A dense, handle-indexed container.
#[derive(Debug, Clone)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Allocates a new item and returns its handle.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Returns a reference to the item with the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not allocated by this arena.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the item with the given handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not allocated by this arena.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }

    /// Returns the number of allocated slots, retired ones included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing was ever allocated.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(handle, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ConnId, NodeId};

    #[test]
    fn alloc_and_index() {
        let mut arena: Arena<NodeId, &str> = Arena::new();
        let a = arena.alloc("and0");
        let b = arena.alloc("or0");
        assert_eq!(arena[a], "and0");
        assert_eq!(arena[b], "or0");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn handles_are_sequential() {
        let mut arena: Arena<ConnId, u8> = Arena::new();
        arena.alloc(1);
        arena.alloc(2);
        let ids: Vec<u32> = arena.iter().map(|(id, _)| id.as_raw()).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn index_mut_modifies() {
        let mut arena: Arena<NodeId, String> = Arena::new();
        let id = arena.alloc("before".to_string());
        arena[id].push_str("_after");
        assert_eq!(arena[id], "before_after");
    }

    #[test]
    fn default_is_empty() {
        let arena: Arena<NodeId, u32> = Arena::default();
        assert!(arena.is_empty());
    }
}
