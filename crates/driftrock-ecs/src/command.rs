//! Deferred spawn/destroy intents with causality metadata.
//!
//! Collision handlers run while the simulation is walking its entity set, so
//! they are not allowed to add or remove entities directly. Instead they
//! queue intents in a [`CommandBuffer`]; the owner applies the whole buffer
//! in FIFO order once the pass is over.
//!
//! # Example
//!
//! ```
//! use driftrock_ecs::prelude::*;
//!
//! struct Spawner(EntityStore<&'static str>);
//!
//! impl CommandTarget<&'static str> for Spawner {
//!     fn spawn(&mut self, descriptor: &'static str) -> EntityId {
//!         self.0.insert(descriptor)
//!     }
//!     fn destroy(&mut self, entity: EntityId) -> bool {
//!         self.0.remove(entity).is_some()
//!     }
//! }
//!
//! let mut target = Spawner(EntityStore::new());
//! let doomed = target.0.insert("old rock");
//!
//! let mut cmds = CommandBuffer::new();
//! cmds.destroy(doomed, CausalReason::GameRule("cleanup".to_owned()));
//! cmds.spawn("fragment", CausalReason::GameRule("split".to_owned()));
//!
//! let applied = cmds.apply(&mut target);
//! assert_eq!(applied.len(), 2);
//! assert_eq!(target.0.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// CausalReason
// ---------------------------------------------------------------------------

/// Why an intent was queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CausalReason {
    /// Player input (e.g. firing).
    PlayerInput(String),
    /// A collision between the two entities, the reacting one first.
    CollisionResponse(EntityId, EntityId),
    /// A game rule such as splitting or clearing the field.
    GameRule(String),
    /// The entity's lifetime ran out.
    LifetimeExpired,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// What an intent does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandKind<D> {
    /// Create a new entity from a descriptor.
    Spawn(D),
    /// Remove the target entity.
    Destroy,
}

/// A queued intent.
///
/// `target` is `None` for spawns; after [`CommandBuffer::apply`] the new
/// handle is recorded in `spawned_entity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command<D> {
    /// Entity the intent targets. `None` for spawns.
    pub target: Option<EntityId>,
    /// The intent itself.
    pub kind: CommandKind<D>,
    /// Why it was queued.
    pub reason: CausalReason,
    /// Position in the buffer at insertion time.
    pub command_index: u32,
    /// Handle created by a spawn, once applied.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spawned_entity: Option<EntityId>,
    /// `true` if applying the intent changed anything. A destroy aimed at an
    /// entity that is already gone stays `false`.
    #[serde(default)]
    pub applied_successfully: bool,
}

/// Anything that can carry out spawn/destroy intents.
pub trait CommandTarget<D> {
    /// Create an entity and return its handle.
    fn spawn(&mut self, descriptor: D) -> EntityId;
    /// Remove an entity. Returns `false` if it no longer exists.
    fn destroy(&mut self, entity: EntityId) -> bool;
}

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// Counts from the last [`CommandBuffer::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Spawns carried out.
    pub spawned: usize,
    /// Destroys that removed a live entity.
    pub destroyed: usize,
    /// Destroys aimed at entities that were already gone.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// FIFO queue of intents.
#[derive(Debug)]
pub struct CommandBuffer<D> {
    commands: Vec<Command<D>>,
    next_index: u32,
    last_apply_report: ApplyReport,
}

impl<D> Default for CommandBuffer<D> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            next_index: 0,
            last_apply_report: ApplyReport::default(),
        }
    }
}

impl<D: Clone> CommandBuffer<D> {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a spawn.
    pub fn spawn(&mut self, descriptor: D, reason: CausalReason) {
        self.push(None, CommandKind::Spawn(descriptor), reason);
    }

    /// Queue a destroy.
    pub fn destroy(&mut self, target: EntityId, reason: CausalReason) {
        self.push(Some(target), CommandKind::Destroy, reason);
    }

    /// Queued intents in insertion order.
    pub fn commands(&self) -> &[Command<D>] {
        &self.commands
    }

    /// Number of queued intents.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Report from the last [`apply`](Self::apply).
    pub fn last_apply_report(&self) -> &ApplyReport {
        &self.last_apply_report
    }

    /// Apply every queued intent in insertion order and empty the buffer.
    ///
    /// Destroys aimed at entities that are already gone are skipped quietly;
    /// they still appear in the returned list with
    /// `applied_successfully == false`.
    pub fn apply(&mut self, target: &mut impl CommandTarget<D>) -> Vec<Command<D>> {
        let mut commands = std::mem::take(&mut self.commands);
        self.next_index = 0;

        let mut report = ApplyReport::default();
        for cmd in &mut commands {
            match &cmd.kind {
                CommandKind::Spawn(descriptor) => {
                    let entity = target.spawn(descriptor.clone());
                    cmd.spawned_entity = Some(entity);
                    cmd.applied_successfully = true;
                    report.spawned += 1;
                }
                CommandKind::Destroy => {
                    let Some(entity) = cmd.target else {
                        continue;
                    };
                    if target.destroy(entity) {
                        cmd.applied_successfully = true;
                        report.destroyed += 1;
                    } else {
                        report.skipped += 1;
                        debug!(
                            entity = %entity,
                            command_index = cmd.command_index,
                            "destroy skipped, entity already gone"
                        );
                    }
                }
            }
        }

        self.last_apply_report = report;
        commands
    }

    fn push(&mut self, target: Option<EntityId>, kind: CommandKind<D>, reason: CausalReason) {
        let index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            target,
            kind,
            reason,
            command_index: index,
            spawned_entity: None,
            applied_successfully: false,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityStore;

    #[derive(Default)]
    struct Target {
        store: EntityStore<u32>,
        log: Vec<String>,
    }

    impl CommandTarget<u32> for Target {
        fn spawn(&mut self, descriptor: u32) -> EntityId {
            self.log.push(format!("spawn {descriptor}"));
            self.store.insert(descriptor)
        }

        fn destroy(&mut self, entity: EntityId) -> bool {
            self.log.push(format!("destroy {entity}"));
            self.store.remove(entity).is_some()
        }
    }

    fn rule(name: &str) -> CausalReason {
        CausalReason::GameRule(name.to_owned())
    }

    #[test]
    fn applies_in_insertion_order() {
        let mut target = Target::default();
        let e = target.store.insert(0);

        let mut cmds = CommandBuffer::new();
        cmds.spawn(1, rule("a"));
        cmds.destroy(e, rule("b"));
        cmds.spawn(2, rule("c"));
        cmds.apply(&mut target);

        assert_eq!(target.log, vec!["spawn 1", "destroy 0v0", "spawn 2"]);
    }

    #[test]
    fn command_indices_are_sequential() {
        let mut cmds: CommandBuffer<u32> = CommandBuffer::new();
        cmds.spawn(1, rule("a"));
        cmds.spawn(2, rule("b"));
        let indices: Vec<u32> = cmds.commands().iter().map(|c| c.command_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn spawned_entity_is_recorded() {
        let mut target = Target::default();
        let mut cmds = CommandBuffer::new();
        cmds.spawn(9, rule("split"));
        let applied = cmds.apply(&mut target);
        let id = applied[0].spawned_entity.expect("spawn records its handle");
        assert_eq!(target.store.get(id), Some(&9));
        assert!(applied[0].applied_successfully);
    }

    #[test]
    fn duplicate_destroy_is_skipped_not_failed() {
        let mut target = Target::default();
        let e = target.store.insert(0);

        let mut cmds = CommandBuffer::new();
        cmds.destroy(e, CausalReason::CollisionResponse(e, e));
        cmds.destroy(e, CausalReason::LifetimeExpired);
        assert_eq!(cmds.len(), 2);

        let applied = cmds.apply(&mut target);
        assert!(applied[0].applied_successfully);
        assert!(!applied[1].applied_successfully);
        assert_eq!(
            *cmds.last_apply_report(),
            ApplyReport {
                spawned: 0,
                destroyed: 1,
                skipped: 1,
            }
        );
    }

    #[test]
    fn buffer_is_empty_after_apply_and_indices_restart() {
        let mut target = Target::default();
        let mut cmds = CommandBuffer::new();
        cmds.spawn(1, rule("a"));
        cmds.apply(&mut target);
        assert!(cmds.is_empty());

        cmds.spawn(2, rule("b"));
        assert_eq!(cmds.commands()[0].command_index, 0);
    }
}
