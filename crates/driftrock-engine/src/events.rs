//! Game events emitted by entity handlers during a step.
//!
//! Entities never touch score or lives. They report what happened and the
//! [`GameState`](crate::game_state::GameState) decides what it means.

use driftrock_ecs::entity::EntityId;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Something the game rules react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An asteroid was shot.
    AsteroidDestroyed {
        /// The asteroid's handle (stale once the step finishes).
        entity: EntityId,
        /// Its size when hit.
        size: f32,
        /// Where it was hit.
        position: Vec2,
    },
    /// The ship hit an asteroid while vulnerable.
    PlayerDied {
        /// The ship's handle.
        entity: EntityId,
        /// Where it died.
        position: Vec2,
    },
}

/// Counters from one [`World::tick`](crate::world::World::tick).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Collision pairs the backend reported.
    pub collisions: usize,
    /// Pairs skipped because a participant was already inactive or gone.
    pub skipped_pairs: usize,
    /// Entities spawned by deferred intents.
    pub spawned: usize,
    /// Entities destroyed by deferred intents.
    pub destroyed: usize,
    /// Entities removed because their lifetime ran out.
    pub expired: usize,
}
