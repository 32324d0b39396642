//! Asteroids: drift on a one-time push, split in two when shot.

use driftrock_ecs::command::CausalReason;
use driftrock_ecs::entity::EntityId;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AsteroidConfig;
use crate::entity::{Contact, EntityDescriptor, EntityTag, HookContext, Reaction};
use crate::events::GameEvent;
use crate::physics::{BodyDescriptor, CollisionLayer, PhysicsEngine};
use crate::random::{random_in_disc, random_unit_vector};

/// Asteroid payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    /// Size; radius is half of it and mass equals it.
    pub size: f32,
    /// Cosmetic sprite index.
    pub sprite_variant: u32,
}

impl Asteroid {
    /// Create a payload. The sprite variant is picked in
    /// [`on_spawn`](Self::on_spawn).
    pub fn new(size: f32) -> Self {
        Self {
            size,
            sprite_variant: 0,
        }
    }

    /// Collider radius.
    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    /// Body mass.
    pub fn mass(&self) -> f32 {
        self.size
    }

    /// Whether a hit produces two children rather than none.
    pub fn splits(&self, min_size: f32) -> bool {
        self.size * 0.5 >= min_size
    }

    /// Physics body for this asteroid.
    pub fn body(&self, position: Vec2, rotation: f32) -> BodyDescriptor {
        BodyDescriptor {
            position,
            rotation,
            radius: self.radius(),
            mass: self.mass(),
            layer: CollisionLayer::Asteroid,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Pick a sprite and give the asteroid its push. `None` picks a random
    /// direction.
    pub(crate) fn on_spawn(
        &mut self,
        me: EntityId,
        trajectory: Option<Vec2>,
        ctx: &mut HookContext,
    ) {
        self.sprite_variant = ctx.rng.gen_range(0..ctx.config.asteroid.sprite_variants);
        let direction = trajectory.unwrap_or_else(|| random_unit_vector(&mut *ctx.rng));
        set_trajectory(&mut *ctx.physics, me, direction, &ctx.config.asteroid);
    }

    /// React to a contact. Only bullets matter: the asteroid queues its
    /// children (if any), reports its destruction and removes itself.
    pub(crate) fn on_collision(&self, contact: Contact, ctx: &mut HookContext) -> Reaction {
        if contact.other_tag != EntityTag::Bullet {
            return Reaction::Ignore;
        }

        let config = &ctx.config.asteroid;
        let split = self.splits(config.min_size);
        if split {
            for _ in 0..2 {
                let child =
                    self.create_split(contact.position, contact.rotation, &mut *ctx.rng, config);
                ctx.commands.spawn(
                    child,
                    CausalReason::CollisionResponse(contact.me, contact.other),
                );
            }
        }
        debug!(entity = %contact.me, size = self.size, split, "asteroid shot");

        ctx.events.push(GameEvent::AsteroidDestroyed {
            entity: contact.me,
            size: self.size,
            position: contact.position,
        });
        Reaction::Destroy
    }

    /// Descriptor for one half: near the parent, half its size, same
    /// rotation, heading off in a random direction.
    pub fn create_split(
        &self,
        position: Vec2,
        rotation: f32,
        rng: &mut impl Rng,
        config: &AsteroidConfig,
    ) -> EntityDescriptor {
        let offset = random_in_disc(rng, config.split_offset_radius);
        EntityDescriptor::Asteroid {
            position: position + offset,
            rotation,
            size: self.size * 0.5,
            trajectory: Some(random_unit_vector(rng)),
        }
    }
}

/// Push the asteroid once along `direction` with `movement_speed`.
///
/// The direction is normalized; a zero vector applies no force.
pub fn set_trajectory(
    physics: &mut dyn PhysicsEngine,
    entity: EntityId,
    direction: Vec2,
    config: &AsteroidConfig,
) {
    physics.apply_force(entity, direction.normalize_or_zero() * config.movement_speed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn split_threshold_is_half_size_against_min() {
        assert!(Asteroid::new(0.7).splits(0.35));
        assert!(!Asteroid::new(0.69).splits(0.35));
        assert!(!Asteroid::new(0.375).splits(0.35));
    }

    #[test]
    fn body_scales_with_size() {
        let body = Asteroid::new(1.5).body(Vec2::ZERO, 0.0);
        assert_eq!(body.radius, 0.75);
        assert_eq!(body.mass, 1.5);
        assert_eq!(body.layer, CollisionLayer::Asteroid);
    }

    #[test]
    fn child_is_half_size_near_parent_same_rotation() {
        let config = AsteroidConfig::default();
        let mut rng = Pcg64::seed_from_u64(3);
        let parent = Asteroid::new(1.2);
        let origin = Vec2::new(4.0, -2.0);
        for _ in 0..32 {
            match parent.create_split(origin, 0.8, &mut rng, &config) {
                EntityDescriptor::Asteroid {
                    position,
                    rotation,
                    size,
                    trajectory,
                } => {
                    assert_eq!(size, 0.6);
                    assert_eq!(rotation, 0.8);
                    assert!(position.distance(origin) <= 0.5 + 1e-5);
                    let t = trajectory.expect("children always get a trajectory");
                    assert!((t.length() - 1.0).abs() < 1e-5);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
