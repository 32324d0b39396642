//! The player ship: thrust, turn, fire, screen wrap, and the
//! invulnerable/vulnerable/dead cycle.
//!
//! ```text
//!  spawn/respawn ──> AliveInvulnerable ──(timer)──> AliveVulnerable
//!                          ^                              │
//!                          │                       asteroid contact
//!                   respawn (GameState)                   v
//!                          └──────────────────────────  Dead
//! ```

use driftrock_ecs::entity::EntityId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PlayerConfig;
use crate::countdown::Countdown;
use crate::entity::{facing, Contact, EntityDescriptor, EntityTag, HookContext, Reaction};
use crate::events::GameEvent;
use crate::host::{Bounds, InputSnapshot};
use crate::physics::{BodyDescriptor, CollisionLayer};

/// How far past the viewport edge the ship travels before wrapping.
pub const WRAP_MARGIN: f32 = 0.5;

/// Life-cycle phase of the ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerPhase {
    /// Just (re)spawned; asteroids pass through.
    AliveInvulnerable,
    /// Normal play.
    AliveVulnerable,
    /// Hit an asteroid; waiting for respawn or game over.
    Dead,
}

/// Player payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Current phase.
    pub phase: PlayerPhase,
    /// Thrust held during the last input.
    pub thrusting: bool,
    /// +1 turning left, -1 turning right, 0 not turning.
    pub turn_direction: f32,
    /// Time left in the invulnerable phase.
    pub invulnerability: Countdown,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// A fresh ship, not yet spawned.
    pub fn new() -> Self {
        Self {
            phase: PlayerPhase::AliveInvulnerable,
            thrusting: false,
            turn_direction: 0.0,
            invulnerability: Countdown::new(0.0),
        }
    }

    /// Physics body for the ship. Starts on the ignore layer.
    pub fn body(position: Vec2, rotation: f32, config: &PlayerConfig) -> BodyDescriptor {
        BodyDescriptor {
            position,
            rotation,
            radius: config.radius,
            mass: config.mass,
            layer: CollisionLayer::Ignore,
            linear_damping: config.linear_damping,
            angular_damping: config.angular_damping,
        }
    }

    /// Whether the ship is flying.
    pub fn is_alive(&self) -> bool {
        self.phase != PlayerPhase::Dead
    }

    /// Whether asteroid contact is currently harmless.
    pub fn is_invulnerable(&self) -> bool {
        self.phase == PlayerPhase::AliveInvulnerable
    }

    /// Enter the invulnerable phase and stop reporting contacts.
    pub(crate) fn on_spawn(&mut self, me: EntityId, ctx: &mut HookContext) {
        self.phase = PlayerPhase::AliveInvulnerable;
        self.invulnerability = Countdown::new(ctx.config.player.respawn_invulnerability);
        self.thrusting = false;
        self.turn_direction = 0.0;
        ctx.physics.set_layer(me, CollisionLayer::Ignore);
    }

    /// Read one input snapshot. Returns a bullet to spawn on the fire edge.
    pub fn on_tick(
        &mut self,
        position: Vec2,
        rotation: f32,
        input: &InputSnapshot,
    ) -> Option<EntityDescriptor> {
        if !self.is_alive() {
            return None;
        }
        self.thrusting = input.thrust;
        self.turn_direction = if input.turn_left {
            1.0
        } else if input.turn_right {
            -1.0
        } else {
            0.0
        };

        input.fire.then(|| EntityDescriptor::Bullet {
            position,
            rotation,
            direction: facing(rotation),
        })
    }

    /// Per-step work: invulnerability countdown, thrust, torque and screen
    /// wrap. Returns the new position if the ship wrapped.
    pub(crate) fn on_fixed_tick(
        &mut self,
        me: EntityId,
        position: Vec2,
        rotation: f32,
        dt: f32,
        bounds: &Bounds,
        ctx: &mut HookContext,
    ) -> Option<Vec2> {
        if !self.is_alive() {
            return None;
        }
        let config = &ctx.config.player;

        if self.phase == PlayerPhase::AliveInvulnerable {
            if self.invulnerability.tick(dt) {
                self.phase = PlayerPhase::AliveVulnerable;
                ctx.physics.set_layer(me, CollisionLayer::Player);
                debug!(entity = %me, "invulnerability over");
            }
        }

        if self.thrusting {
            ctx.physics
                .apply_force(me, facing(rotation) * config.thrust_speed);
        }
        if self.turn_direction != 0.0 {
            ctx.physics
                .apply_torque(me, config.rotation_speed * self.turn_direction);
        }

        if !config.screen_wrapping {
            return None;
        }
        let wrapped = screen_wrap(position, bounds)?;
        ctx.physics.set_position(me, wrapped);
        Some(wrapped)
    }

    /// Die on asteroid contact while vulnerable.
    pub(crate) fn on_collision(&mut self, contact: Contact, ctx: &mut HookContext) -> Reaction {
        if contact.other_tag != EntityTag::Asteroid || self.phase != PlayerPhase::AliveVulnerable {
            return Reaction::Ignore;
        }

        ctx.physics.set_velocity(contact.me, Vec2::ZERO);
        ctx.physics.set_angular_velocity(contact.me, 0.0);
        self.phase = PlayerPhase::Dead;
        self.thrusting = false;
        self.turn_direction = 0.0;

        info!(entity = %contact.me, position = ?contact.position, "player died");
        ctx.events.push(GameEvent::PlayerDied {
            entity: contact.me,
            position: contact.position,
        });
        // The ship stays in the world; the game rules deactivate it.
        Reaction::Ignore
    }
}

/// Where the ship reappears if it has left the viewport, or `None`.
///
/// Checks x past the right edge, x past the left edge, y past the top, then
/// y past the bottom, and corrects only the first axis that matches.
pub fn screen_wrap(position: Vec2, bounds: &Bounds) -> Option<Vec2> {
    let (min, max) = (bounds.min, bounds.max);
    if position.x > max.x + WRAP_MARGIN {
        Some(Vec2::new(min.x - WRAP_MARGIN, position.y))
    } else if position.x < min.x - WRAP_MARGIN {
        Some(Vec2::new(max.x + WRAP_MARGIN, position.y))
    } else if position.y > max.y + WRAP_MARGIN {
        Some(Vec2::new(position.x, min.y - WRAP_MARGIN))
    } else if position.y < min.y - WRAP_MARGIN {
        Some(Vec2::new(position.x, max.y + WRAP_MARGIN))
    } else {
        None
    }
}
