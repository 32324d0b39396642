//! Bullets: one push at launch, gone on first contact.

use driftrock_ecs::entity::EntityId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::BulletConfig;
use crate::entity::{Contact, HookContext, Reaction};
use crate::physics::{BodyDescriptor, CollisionLayer};

/// Bullet payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Unit launch direction, fixed at creation.
    pub direction: Vec2,
}

impl Bullet {
    /// Create a payload heading along `direction` (normalized).
    pub fn new(direction: Vec2) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
        }
    }

    /// Physics body for a bullet.
    pub fn body(position: Vec2, rotation: f32, config: &BulletConfig) -> BodyDescriptor {
        BodyDescriptor {
            position,
            rotation,
            radius: config.radius,
            mass: config.mass,
            layer: CollisionLayer::Bullet,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Launch: one force of magnitude `speed` along the direction. Returns
    /// the bullet's lifetime.
    pub(crate) fn shoot(&self, me: EntityId, ctx: &mut HookContext) -> f32 {
        let config = &ctx.config.bullet;
        ctx.physics.apply_force(me, self.direction * config.speed);
        config.max_lifetime
    }

    /// Any contact destroys the bullet.
    pub(crate) fn on_collision(&self, contact: Contact, _ctx: &mut HookContext) -> Reaction {
        trace!(entity = %contact.me, other = %contact.other, "bullet hit");
        Reaction::Destroy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let b = Bullet::new(Vec2::new(0.0, 3.0));
        assert_eq!(b.direction, Vec2::Y);
    }

    #[test]
    fn body_uses_bullet_layer() {
        let body = Bullet::body(Vec2::ZERO, 0.0, &BulletConfig::default());
        assert_eq!(body.layer, CollisionLayer::Bullet);
        assert_eq!(body.radius, 0.1);
    }
}
