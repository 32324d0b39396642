//! Generation-tagged entity handles.
//!
//! An [`EntityId`] packs a slot *index* (low 32 bits) and a *generation*
//! (high 32 bits) into one `u64`. Every time a slot is released its
//! generation is bumped, so a handle kept past the entity's destruction stops
//! resolving instead of aliasing whatever later reuses the slot.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity handle.
///
/// Layout: `[generation: u32 | index: u32]`. Ordering follows the raw value,
/// which is what collision dispatch sorts by.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Build a handle from a slot index and generation.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// Slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation counter (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Rebuild a handle from [`to_raw`](Self::to_raw) output.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s and recycles released slots.
///
/// Released indices wait in a FIFO queue, so a burst of spawn/destroy churn
/// (bullets, asteroid fragments) spreads generation bumps across many slots
/// instead of hammering one.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_indices: VecDeque<u32>,
    live: usize,
}

impl EntityAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle, reusing the oldest released slot when one exists.
    pub fn allocate(&mut self) -> EntityId {
        self.live += 1;
        if let Some(index) = self.free_indices.pop_front() {
            // Generation was bumped when the slot was released.
            self.alive[index as usize] = true;
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId::new(index, 0)
        }
    }

    /// Release a handle and bump its slot's generation.
    ///
    /// Returns `false` without touching anything if the handle is stale,
    /// out of range, or already released.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        self.live -= 1;
        true
    }

    /// Whether `id` names a live slot with a matching generation.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len() && self.alive[idx] && self.generations[idx] == id.generation()
    }

    /// Number of live handles.
    pub fn alive_count(&self) -> usize {
        self.live
    }

    /// Number of slots ever created (live or free).
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_have_distinct_indices() {
        let mut alloc = EntityAllocator::new();
        let mut indices: Vec<u32> = (0..64).map(|_| alloc.allocate().index()).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices.len(), 64);
        assert_eq!(alloc.alive_count(), 64);
    }

    #[test]
    fn recycled_slot_gets_next_generation() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.allocate();
        assert!(alloc.deallocate(first));
        let second = alloc.allocate();
        assert_eq!(second.index(), first.index());
        assert_eq!(second.generation(), first.generation() + 1);
        assert_eq!(alloc.capacity(), 1);
    }

    #[test]
    fn stale_handle_never_revives() {
        let mut alloc = EntityAllocator::new();
        let old = alloc.allocate();
        alloc.deallocate(old);
        let _new = alloc.allocate();
        assert!(!alloc.is_alive(old));
    }

    #[test]
    fn releasing_twice_is_refused() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn out_of_range_handle_is_not_alive() {
        let alloc = EntityAllocator::new();
        assert!(!alloc.is_alive(EntityId::new(7, 0)));
    }

    #[test]
    fn free_slots_are_reused_oldest_first() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.deallocate(b);
        alloc.deallocate(a);
        assert_eq!(alloc.allocate().index(), b.index());
        assert_eq!(alloc.allocate().index(), a.index());
    }

    #[test]
    fn ordering_follows_raw_value() {
        let low = EntityId::new(3, 0);
        let high = EntityId::new(1, 1);
        assert!(low < high);
        assert_eq!(EntityId::from_raw(high.to_raw()), high);
        assert_eq!(format!("{high}"), "1v1");
    }
}
