//! Slot storage for circuit entities addressed by typed IDs.
//!
//! Signals, modules, processes, and monitors each live in their own
//! [`Store`], and cross-references between them are IDs rather than
//! pointers, so the graph can be cyclic while ownership stays flat. Slots
//! are never removed; an ID stays valid for the life of its store.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// An ID type addressing slots of one entity kind.
///
/// Implementations are thin wrappers produced by the `entity_id!` macro in
/// [`ids`](crate::ids); the index round-trip must be the identity.
pub trait EntityId: Copy {
    /// Builds the ID addressing slot `index`.
    fn from_index(index: usize) -> Self;

    /// The slot this ID addresses.
    fn index(self) -> usize;
}

/// Append-only slot storage handing out typed IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store<I, T> {
    slots: Vec<T>,
    #[serde(skip)]
    _id: PhantomData<fn() -> I>,
}

impl<I: EntityId, T> Store<I, T> {
    /// An empty store.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// An empty store with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            _id: PhantomData,
        }
    }

    /// Stores an entity and returns the ID addressing it.
    pub fn insert(&mut self, entity: T) -> I {
        let id = I::from_index(self.slots.len());
        self.slots.push(entity);
        id
    }

    /// The entity behind `id`, or `None` for an ID from another store.
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.index())
    }

    /// Mutable access to the entity behind `id`.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.index())
    }

    /// The number of entities stored.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(id, entity)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, entity)| (I::from_index(index), entity))
    }

    /// Every valid ID, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.slots.len()).map(I::from_index)
    }

    /// Entities in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

impl<I: EntityId, T> Default for Store<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: EntityId, T> Index<I> for Store<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        match self.get(id) {
            Some(entity) => entity,
            None => panic!("no entity in slot {}", id.index()),
        }
    }
}

impl<I: EntityId, T> IndexMut<I> for Store<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        let slot = id.index();
        match self.get_mut(id) {
            Some(entity) => entity,
            None => panic!("no entity in slot {slot}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SignalId;

    #[test]
    fn insert_hands_out_sequential_ids() {
        let mut store: Store<SignalId, &str> = Store::new();
        let a = store.insert("clk");
        let b = store.insert("rst");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(store[a], "clk");
        assert_eq!(store[b], "rst");
    }

    #[test]
    fn get_rejects_foreign_ids() {
        let store: Store<SignalId, u32> = Store::new();
        assert!(store.get(SignalId::from_index(0)).is_none());
    }

    #[test]
    #[should_panic(expected = "no entity in slot 5")]
    fn indexing_a_missing_slot_panics() {
        let store: Store<SignalId, u32> = Store::new();
        let _ = store[SignalId::from_index(5)];
    }

    #[test]
    fn get_mut_modifies_in_place() {
        let mut store: Store<SignalId, u32> = Store::new();
        let id = store.insert(1);
        *store.get_mut(id).unwrap() = 2;
        assert_eq!(store[id], 2);
    }

    #[test]
    fn entries_pair_ids_with_values() {
        let mut store: Store<SignalId, u32> = Store::with_capacity(3);
        store.insert(10);
        store.insert(20);
        let pairs: Vec<(usize, u32)> = store.entries().map(|(id, v)| (id.index(), *v)).collect();
        assert_eq!(pairs, vec![(0, 10), (1, 20)]);
        assert_eq!(store.ids().count(), 2);
        assert_eq!(store.values().sum::<u32>(), 30);
    }

    #[test]
    fn empty_store() {
        let store: Store<SignalId, u32> = Store::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.ids().count(), 0);
    }
}
