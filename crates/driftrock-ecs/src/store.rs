//! Generational arena that owns entity payloads.
//!
//! [`EntityStore`] pairs an [`EntityAllocator`] with a dense slot vector. Slot
//! `i` holds the payload for whichever live handle currently has index `i`.
//! Iteration always walks slots in ascending index order, never through a
//! hash map, so two stores fed the same operations iterate identically.

use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

#[derive(Debug, Clone)]
struct Slot<T> {
    id: EntityId,
    value: T,
}

/// Owns every payload of type `T`, addressed by [`EntityId`].
///
/// All lookups check the handle's generation. A stale handle behaves exactly
/// like a handle that was never issued: `get` returns `None`, `remove`
/// returns `None`, and nothing is mutated.
#[derive(Debug)]
pub struct EntityStore<T> {
    allocator: EntityAllocator,
    slots: Vec<Option<Slot<T>>>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            slots: Vec::new(),
        }
    }
}

impl<T> EntityStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a payload and return its handle.
    pub fn insert(&mut self, value: T) -> EntityId {
        self.insert_with(|_| value)
    }

    /// Insert a payload built from the handle it is about to receive.
    ///
    /// Useful when the payload stores its own id.
    pub fn insert_with(&mut self, build: impl FnOnce(EntityId) -> T) -> EntityId {
        let id = self.allocator.allocate();
        let idx = id.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some(Slot {
            id,
            value: build(id),
        });
        id
    }

    /// Remove and return the payload, or `None` if the handle is stale.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        if !self.allocator.deallocate(id) {
            return None;
        }
        self.slots[id.index() as usize].take().map(|slot| slot.value)
    }

    /// Like [`remove`](Self::remove) but reports stale handles as an error.
    pub fn try_remove(&mut self, id: EntityId) -> Result<T, EcsError> {
        self.remove(id).ok_or(EcsError::StaleEntity { entity: id })
    }

    /// Borrow a payload.
    pub fn get(&self, id: EntityId) -> Option<&T> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots
            .get(id.index() as usize)
            .and_then(Option::as_ref)
            .map(|slot| &slot.value)
    }

    /// Mutably borrow a payload.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.value)
    }

    /// Like [`get`](Self::get) but reports stale handles as an error.
    pub fn try_get(&self, id: EntityId) -> Result<&T, EcsError> {
        self.get(id).ok_or(EcsError::StaleEntity { entity: id })
    }

    /// Whether the handle is live.
    pub fn contains(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    /// Number of live payloads.
    pub fn len(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of all live payloads in ascending slot order.
    ///
    /// Returned as an owned list so callers can mutate the store while
    /// walking it.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Iterate `(handle, payload)` pairs in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|s| (s.id, &s.value)))
    }

    /// Mutable variant of [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.as_mut().map(|s| (s.id, &mut s.value)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
