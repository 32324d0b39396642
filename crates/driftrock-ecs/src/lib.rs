//! Driftrock ECS -- generational entity handles, an entity arena and a
//! deferred command buffer.
//!
//! The simulation keeps every entity in one [`EntityStore`](store::EntityStore)
//! addressed by generation-tagged [`EntityId`](entity::EntityId)s. Handles
//! outlive their entities safely: once an entity is destroyed its handle
//! stops resolving, even if the slot is later reused.
//!
//! # Quick Start
//!
//! ```
//! use driftrock_ecs::prelude::*;
//!
//! let mut store = EntityStore::new();
//! let rock = store.insert(1.5_f32);
//! assert_eq!(store.get(rock), Some(&1.5));
//!
//! store.remove(rock);
//! assert_eq!(store.get(rock), None); // stale, not aliased
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod entity;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by checked arena accessors.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The handle's generation no longer matches, or it was never issued.
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity {
        /// The offending handle.
        entity: entity::EntityId,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::command::{
        ApplyReport, CausalReason, Command, CommandBuffer, CommandKind, CommandTarget,
    };
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::store::EntityStore;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Rock {
        Whole(f32),
        Fragment(f32),
    }

    struct Field {
        rocks: EntityStore<Rock>,
    }

    impl CommandTarget<Rock> for Field {
        fn spawn(&mut self, descriptor: Rock) -> EntityId {
            self.rocks.insert(descriptor)
        }

        fn destroy(&mut self, entity: EntityId) -> bool {
            self.rocks.remove(entity).is_some()
        }
    }

    #[test]
    fn deferred_split_replaces_parent_with_two_fragments() {
        let mut field = Field {
            rocks: EntityStore::new(),
        };
        let parent = field.rocks.insert(Rock::Whole(1.0));

        // A pass over the field queues intents instead of mutating it.
        let mut cmds = CommandBuffer::new();
        for (id, rock) in field.rocks.iter() {
            if let Rock::Whole(size) = rock {
                cmds.spawn(
                    Rock::Fragment(size / 2.0),
                    CausalReason::GameRule("split".to_owned()),
                );
                cmds.spawn(
                    Rock::Fragment(size / 2.0),
                    CausalReason::GameRule("split".to_owned()),
                );
                cmds.destroy(id, CausalReason::GameRule("split".to_owned()));
            }
        }
        assert_eq!(field.rocks.len(), 1, "nothing changes until apply");

        cmds.apply(&mut field);

        assert!(!field.rocks.contains(parent));
        let sizes: Vec<f32> = field
            .rocks
            .iter()
            .map(|(_, r)| match r {
                Rock::Fragment(s) | Rock::Whole(s) => *s,
            })
            .collect();
        assert_eq!(sizes, vec![0.5, 0.5]);
    }

    #[test]
    fn stale_handle_from_an_old_pass_is_harmless() {
        let mut field = Field {
            rocks: EntityStore::new(),
        };
        let id = field.rocks.insert(Rock::Whole(1.0));

        let mut first = CommandBuffer::new();
        first.destroy(id, CausalReason::LifetimeExpired);
        first.apply(&mut field);

        // Slot gets reused by a new rock; the old handle must not touch it.
        let replacement = field.rocks.insert(Rock::Whole(2.0));
        let mut second = CommandBuffer::new();
        second.destroy(id, CausalReason::LifetimeExpired);
        let applied = second.apply(&mut field);

        assert!(!applied[0].applied_successfully);
        assert_eq!(field.rocks.get(replacement), Some(&Rock::Whole(2.0)));
    }

    #[test]
    fn causal_reason_serializes() {
        let reason = CausalReason::CollisionResponse(EntityId::new(1, 0), EntityId::new(2, 3));
        let json = serde_json::to_string(&reason).unwrap();
        let back: CausalReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reason);
    }
}
