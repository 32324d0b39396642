//! Entity records, kinds, spawn descriptors and the hook context.
//!
//! Every simulated object is one [`Entity`] in the world's arena. The shared
//! transform and lifetime live on the record; kind-specific state lives in
//! the [`EntityKind`] payload.

use driftrock_ecs::command::CommandBuffer;
use driftrock_ecs::entity::EntityId;
use glam::Vec2;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::asteroid::Asteroid;
use crate::bullet::Bullet;
use crate::config::GameConfig;
use crate::countdown::Countdown;
use crate::events::GameEvent;
use crate::physics::PhysicsEngine;
use crate::player::Player;

// ---------------------------------------------------------------------------
// Tags and kinds
// ---------------------------------------------------------------------------

/// Coarse entity category, used by collision handlers to identify the
/// other participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// The ship.
    Player,
    /// An asteroid.
    Asteroid,
    /// A projectile.
    Bullet,
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// The ship.
    Player(Player),
    /// An asteroid.
    Asteroid(Asteroid),
    /// A projectile.
    Bullet(Bullet),
}

impl EntityKind {
    /// The tag matching this payload.
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityKind::Player(_) => EntityTag::Player,
            EntityKind::Asteroid(_) => EntityTag::Asteroid,
            EntityKind::Bullet(_) => EntityTag::Bullet,
        }
    }
}

/// Unit vector the entity faces for a given rotation. Rotation 0 faces +Y.
pub fn facing(rotation: f32) -> Vec2 {
    Vec2::new(-rotation.sin(), rotation.cos())
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One simulated object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Own handle.
    pub id: EntityId,
    /// Position, synced from the physics body after every step.
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise, 0 facing +Y.
    pub rotation: f32,
    /// Time left before expiry. `None` lives forever.
    pub lifetime: Option<Countdown>,
    /// Inactive entities are skipped by every hook.
    pub active: bool,
    /// Kind-specific payload.
    pub kind: EntityKind,
}

impl Entity {
    /// The entity's tag.
    pub fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    /// Unit vector the entity faces.
    pub fn facing(&self) -> Vec2 {
        facing(self.rotation)
    }

    /// Asteroid payload, if this is an asteroid.
    pub fn as_asteroid(&self) -> Option<&Asteroid> {
        match &self.kind {
            EntityKind::Asteroid(a) => Some(a),
            _ => None,
        }
    }

    /// Bullet payload, if this is a bullet.
    pub fn as_bullet(&self) -> Option<&Bullet> {
        match &self.kind {
            EntityKind::Bullet(b) => Some(b),
            _ => None,
        }
    }

    /// Player payload, if this is the ship.
    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable player payload, if this is the ship.
    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EntityDescriptor
// ---------------------------------------------------------------------------

/// Everything needed to spawn an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityDescriptor {
    /// An asteroid.
    Asteroid {
        /// Spawn position.
        position: Vec2,
        /// Spawn rotation in radians.
        rotation: f32,
        /// Size; scales radius and mass.
        size: f32,
        /// Direction of the one-time trajectory force. `None` picks a random
        /// direction; a zero vector means no force.
        trajectory: Option<Vec2>,
    },
    /// A projectile.
    Bullet {
        /// Spawn position.
        position: Vec2,
        /// Spawn rotation in radians.
        rotation: f32,
        /// Direction of the launch force.
        direction: Vec2,
    },
    /// The ship. Spawning it while one exists respawns the existing ship.
    Player {
        /// Spawn position.
        position: Vec2,
    },
}

impl EntityDescriptor {
    /// The tag of the entity this descriptor creates.
    pub fn tag(&self) -> EntityTag {
        match self {
            EntityDescriptor::Asteroid { .. } => EntityTag::Asteroid,
            EntityDescriptor::Bullet { .. } => EntityTag::Bullet,
            EntityDescriptor::Player { .. } => EntityTag::Player,
        }
    }

    /// Replace malformed values with safe ones.
    ///
    /// Non-finite positions become the origin, non-finite rotations become
    /// 0, non-positive or non-finite sizes become `min_size`, and non-finite
    /// directions fall back to a random trajectory (asteroids) or the facing
    /// direction (bullets).
    pub fn sanitized(self, config: &GameConfig) -> Self {
        let tag = self.tag();
        let position = |p: Vec2| {
            if p.is_finite() {
                p
            } else {
                warn!(?tag, position = ?p, "non-finite spawn position, using origin");
                Vec2::ZERO
            }
        };
        let rotation = |r: f32| {
            if r.is_finite() {
                r
            } else {
                warn!(?tag, rotation = r, "non-finite spawn rotation, using 0");
                0.0
            }
        };

        match self {
            EntityDescriptor::Asteroid {
                position: p,
                rotation: r,
                size,
                trajectory,
            } => {
                let size = if size.is_finite() && size > 0.0 {
                    size
                } else {
                    let min_size = config.asteroid.min_size;
                    warn!(size, min_size, "invalid asteroid size, clamping");
                    min_size
                };
                let trajectory = match trajectory {
                    Some(t) if !t.is_finite() => {
                        warn!(trajectory = ?t, "non-finite trajectory, picking a random one");
                        None
                    }
                    other => other,
                };
                EntityDescriptor::Asteroid {
                    position: position(p),
                    rotation: rotation(r),
                    size,
                    trajectory,
                }
            }
            EntityDescriptor::Bullet {
                position: p,
                rotation: r,
                direction,
            } => {
                let r = rotation(r);
                let direction = if direction.is_finite() {
                    direction
                } else {
                    warn!(direction = ?direction, "non-finite bullet direction, using facing");
                    facing(r)
                };
                EntityDescriptor::Bullet {
                    position: position(p),
                    rotation: r,
                    direction,
                }
            }
            EntityDescriptor::Player { position: p } => EntityDescriptor::Player {
                position: position(p),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Hook plumbing
// ---------------------------------------------------------------------------

/// What the world lends a hook while it runs.
///
/// Hooks may touch their own body through `physics`, queue spawn/destroy
/// intents and emit events. They never add or remove entities directly.
pub struct HookContext<'a> {
    /// The physics backend.
    pub physics: &'a mut dyn PhysicsEngine,
    /// Deferred spawn/destroy intents.
    pub commands: &'a mut CommandBuffer<EntityDescriptor>,
    /// Events for the game rules.
    pub events: &'a mut Vec<GameEvent>,
    /// The world's seeded RNG.
    pub rng: &'a mut Pcg64,
    /// Tunables.
    pub config: &'a GameConfig,
}

/// One side of a collision pair, as seen by the entity being notified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The notified entity.
    pub me: EntityId,
    /// Its position.
    pub position: Vec2,
    /// Its rotation.
    pub rotation: f32,
    /// The entity it touched.
    pub other: EntityId,
    /// What it touched.
    pub other_tag: EntityTag,
}

/// How an entity responds to a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Nothing happens to the entity itself.
    Ignore,
    /// The entity removes itself at the end of the dispatch phase.
    Destroy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_zero_is_up_and_quarter_turn_is_left() {
        assert!((facing(0.0) - Vec2::Y).length() < 1e-6);
        assert!((facing(std::f32::consts::FRAC_PI_2) - Vec2::NEG_X).length() < 1e-6);
    }

    #[test]
    fn sanitize_clamps_bad_size_and_position() {
        let config = GameConfig::default();
        let d = EntityDescriptor::Asteroid {
            position: Vec2::new(f32::NAN, 1.0),
            rotation: f32::INFINITY,
            size: -2.0,
            trajectory: Some(Vec2::new(f32::NAN, 0.0)),
        }
        .sanitized(&config);
        assert_eq!(
            d,
            EntityDescriptor::Asteroid {
                position: Vec2::ZERO,
                rotation: 0.0,
                size: 0.35,
                trajectory: None,
            }
        );
    }

    #[test]
    fn sanitize_leaves_good_descriptors_alone() {
        let config = GameConfig::default();
        let d = EntityDescriptor::Bullet {
            position: Vec2::new(1.0, 2.0),
            rotation: 0.5,
            direction: Vec2::X,
        };
        assert_eq!(d.clone().sanitized(&config), d);
    }

    #[test]
    fn bullet_with_bad_direction_uses_facing() {
        let config = GameConfig::default();
        let d = EntityDescriptor::Bullet {
            position: Vec2::ZERO,
            rotation: 0.0,
            direction: Vec2::splat(f32::NAN),
        }
        .sanitized(&config);
        match d {
            EntityDescriptor::Bullet { direction, .. } => assert_eq!(direction, facing(0.0)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
