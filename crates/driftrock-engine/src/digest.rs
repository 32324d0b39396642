//! State digests for determinism checks.
//!
//! The digest is a BLAKE3 hash over a canonical JSON summary of everything a
//! player could observe: tick, score, lives, phase, pending timers and every
//! live entity in ascending handle order. Two runs that agree on the digest
//! at every checkpoint played out identically. The summary cannot be loaded
//! back; it only exists to be hashed.

use serde::Serialize;

use crate::entity::Entity;
use crate::game_state::{GamePhase, GameState};
use crate::physics::PhysicsEngine;
use crate::spawner::AsteroidSpawner;
use crate::world::World;

#[derive(Serialize)]
struct StateSummary<'a> {
    tick: u64,
    score: u32,
    lives: i32,
    phase: GamePhase,
    respawn_countdown: Option<f32>,
    spawner_countdown: f32,
    entities: Vec<&'a Entity>,
}

/// BLAKE3 hex digest of the observable simulation state at `tick`.
pub fn state_hash<P: PhysicsEngine>(
    tick: u64,
    game: &GameState,
    spawner: &AsteroidSpawner,
    world: &World<P>,
) -> String {
    let summary = StateSummary {
        tick,
        score: game.score(),
        lives: game.lives(),
        phase: game.phase(),
        respawn_countdown: game.respawn_countdown(),
        spawner_countdown: spawner.countdown(),
        entities: world.entities().collect(),
    };
    let json_bytes =
        serde_json::to_vec(&summary).expect("state summary should always be JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}
