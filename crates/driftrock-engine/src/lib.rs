//! Driftrock Engine -- a deterministic, headless arcade asteroids core.
//!
//! This crate builds on [`driftrock_ecs`] to provide the whole game
//! simulation: a ship that thrusts, turns, fires and wraps around the
//! screen; asteroids that drift, split when shot and expire; bullets;
//! score, lives and game over; a periodic spawner; and a fixed-timestep
//! driver that a host feeds with input snapshots.
//!
//! Physics sits behind the [`PhysicsEngine`](physics::PhysicsEngine) trait.
//! [`PhysicsWorld`](physics::PhysicsWorld) uses rapier2d;
//! [`ManualPhysics`](physics::ManualPhysics) integrates by hand and reports
//! only the contacts a test queues.
//!
//! # Quick Start
//!
//! ```
//! use driftrock_engine::prelude::*;
//!
//! let mut sim = Simulation::with_rapier(GameConfig::default()).unwrap();
//! let fire = InputSnapshot { fire: true, ..Default::default() };
//! sim.step(&fire);
//! assert_eq!(sim.world().count(EntityTag::Bullet), 1);
//!
//! sim.run_steps(100, &InputSnapshot::default());
//! assert_eq!(sim.tick_count(), 101);
//! assert_eq!(sim.lives(), 3);
//! ```

#![deny(unsafe_code)]

pub mod asteroid;
pub mod bullet;
pub mod config;
pub mod countdown;
pub mod digest;
pub mod entity;
pub mod events;
pub mod game_state;
pub mod host;
pub mod physics;
pub mod player;
pub mod random;
pub mod replay;
pub mod spawner;
pub mod tick;
pub mod world;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use driftrock_ecs;

/// Re-export the vector type used throughout the API.
pub use glam::Vec2;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use driftrock_ecs::prelude::*;

    pub use crate::asteroid::Asteroid;
    pub use crate::bullet::Bullet;
    pub use crate::config::{
        AsteroidConfig, BulletConfig, ConfigError, GameConfig, PlayerConfig, RulesConfig,
        SpawnerConfig, TickConfig,
    };
    pub use crate::countdown::Countdown;
    pub use crate::entity::{Entity, EntityDescriptor, EntityKind, EntityTag};
    pub use crate::events::{GameEvent, StepReport};
    pub use crate::game_state::{score_for_size, GamePhase, GameState};
    pub use crate::host::{
        Bounds, Effect, EffectKind, FixedViewport, HudState, InputSnapshot, NullSink, RenderSink,
        Viewport,
    };
    pub use crate::physics::{
        CollisionLayer, CollisionPair, ManualPhysics, PhysicsEngine, PhysicsWorld,
    };
    pub use crate::player::{Player, PlayerPhase};
    pub use crate::replay::{
        replay, ReplayDivergence, ReplayEntry, ReplayError, ReplayLog, ReplayRecorder,
        ReplayResult,
    };
    pub use crate::spawner::AsteroidSpawner;
    pub use crate::tick::{Simulation, TickDiagnostics};
    pub use crate::world::World;

    pub use glam::Vec2;
}
