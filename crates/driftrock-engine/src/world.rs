//! The world: every entity, the physics backend, and the fixed step.
//!
//! [`World::tick`] runs one fixed step in six phases:
//!
//! 1. Player bookkeeping: invulnerability countdown, thrust, torque, wrap.
//! 2. Physics integration.
//! 3. Collision-start pairs from the backend, sorted by `(min id, max id)`,
//!    and a transform sync from the bodies back into the entity records.
//! 4. Dispatch: each pair notifies the lower id first, then the higher.
//!    Handlers queue spawn/destroy intents and emit events; an entity that
//!    asked to be destroyed goes inactive at once, so later pairs in the same
//!    step skip it.
//! 5. Deferred intents are applied in FIFO order.
//! 6. Lifetimes count down; anything whose time is up is queued for
//!    destruction and the queue is applied again.
//!
//! Nothing iterates a hash map. The arena walks slots in ascending order and
//! collision pairs arrive sorted, so a world built from the same seed and fed
//! the same inputs produces the same run.

use driftrock_ecs::command::{ApplyReport, CausalReason, CommandBuffer, CommandTarget};
use driftrock_ecs::entity::EntityId;
use driftrock_ecs::store::EntityStore;
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::{debug, info, trace};

use crate::asteroid::Asteroid;
use crate::bullet::Bullet;
use crate::config::{ConfigError, GameConfig};
use crate::countdown::Countdown;
use crate::entity::{
    Contact, Entity, EntityDescriptor, EntityKind, EntityTag, HookContext, Reaction,
};
use crate::events::{GameEvent, StepReport};
use crate::host::{Bounds, FixedViewport, InputSnapshot, Viewport};
use crate::physics::{CollisionPair, PhysicsEngine, PhysicsWorld};
use crate::player::Player;

/// Owns all entities and the physics backend.
pub struct World<P: PhysicsEngine = PhysicsWorld> {
    entities: EntityStore<Entity>,
    physics: P,
    commands: CommandBuffer<EntityDescriptor>,
    events: Vec<GameEvent>,
    rng: Pcg64,
    config: GameConfig,
    bounds: Bounds,
    player: Option<EntityId>,
    last_report: StepReport,
}

/// Build a [`HookContext`] from disjoint world fields.
macro_rules! hook_context {
    ($world:ident) => {
        HookContext {
            physics: &mut $world.physics,
            commands: &mut $world.commands,
            events: &mut $world.events,
            rng: &mut $world.rng,
            config: &$world.config,
        }
    };
}

impl<P: PhysicsEngine> World<P> {
    /// Create an empty world. The RNG is seeded from `config.tick.seed`.
    ///
    /// Fails if `config` does not pass [`GameConfig::validate`].
    pub fn new(config: GameConfig, physics: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            entities: EntityStore::new(),
            physics,
            commands: CommandBuffer::new(),
            events: Vec::new(),
            rng: Pcg64::seed_from_u64(config.tick.seed),
            config,
            bounds: FixedViewport::default().world_bounds(),
            player: None,
            last_report: StepReport::default(),
        })
    }

    // -- lifecycle ----------------------------------------------------------

    /// Create an entity and run its spawn hook.
    ///
    /// Malformed descriptors are clamped (see
    /// [`EntityDescriptor::sanitized`]). Spawning a player while one exists
    /// respawns the existing ship and returns its handle.
    pub fn spawn(&mut self, descriptor: EntityDescriptor) -> EntityId {
        let descriptor = descriptor.sanitized(&self.config);

        let (position, rotation, kind, body, trajectory) = match descriptor {
            EntityDescriptor::Player { position } => {
                if self.live_player().is_some() {
                    return self.respawn_player(position);
                }
                (
                    position,
                    0.0,
                    EntityKind::Player(Player::new()),
                    Player::body(position, 0.0, &self.config.player),
                    None,
                )
            }
            EntityDescriptor::Asteroid {
                position,
                rotation,
                size,
                trajectory,
            } => {
                let asteroid = Asteroid::new(size);
                let body = asteroid.body(position, rotation);
                (position, rotation, EntityKind::Asteroid(asteroid), body, trajectory)
            }
            EntityDescriptor::Bullet {
                position,
                rotation,
                direction,
            } => (
                position,
                rotation,
                EntityKind::Bullet(Bullet::new(direction)),
                Bullet::body(position, rotation, &self.config.bullet),
                None,
            ),
        };

        let id = self.entities.insert_with(|id| Entity {
            id,
            position,
            rotation,
            lifetime: None,
            active: true,
            kind,
        });
        self.physics.register(id, &body);

        let Some(entity) = self.entities.get_mut(id) else {
            return id;
        };
        let mut ctx = hook_context!(self);
        match &mut entity.kind {
            EntityKind::Asteroid(asteroid) => {
                asteroid.on_spawn(id, trajectory, &mut ctx);
                entity.lifetime = Some(Countdown::new(ctx.config.asteroid.max_lifetime));
            }
            EntityKind::Bullet(bullet) => {
                entity.lifetime = Some(Countdown::new(bullet.shoot(id, &mut ctx)));
            }
            EntityKind::Player(player) => {
                player.on_spawn(id, &mut ctx);
                self.player = Some(id);
            }
        }
        debug!(entity = %id, tag = ?entity.tag(), position = ?position, "spawned");
        id
    }

    /// Remove an entity and its body. Returns `false` (and changes nothing)
    /// if the handle is stale.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.remove(id) else {
            return false;
        };
        self.physics.unregister(id);
        if self.player == Some(id) {
            self.player = None;
        }
        debug!(entity = %id, tag = ?entity.tag(), "destroyed");
        true
    }

    /// Put the ship back at `position`, active and invulnerable, or create
    /// it if there is none. Velocities are zeroed; rotation is kept.
    pub fn respawn_player(&mut self, position: Vec2) -> EntityId {
        let Some(id) = self.live_player() else {
            return self.spawn(EntityDescriptor::Player { position });
        };
        let position = if position.is_finite() { position } else { Vec2::ZERO };

        self.physics.set_enabled(id, true);
        self.physics.set_position(id, position);
        self.physics.set_velocity(id, Vec2::ZERO);
        self.physics.set_angular_velocity(id, 0.0);

        if let Some(entity) = self.entities.get_mut(id) {
            entity.position = position;
            entity.active = true;
            let mut ctx = hook_context!(self);
            if let EntityKind::Player(player) = &mut entity.kind {
                player.on_spawn(id, &mut ctx);
            }
        }
        info!(entity = %id, position = ?position, "player respawned");
        id
    }

    /// Take the ship out of play until the next respawn.
    pub fn deactivate_player(&mut self) {
        let Some(id) = self.live_player() else {
            return;
        };
        if let Some(entity) = self.entities.get_mut(id) {
            entity.active = false;
        }
        self.physics.set_enabled(id, false);
        debug!(entity = %id, "player deactivated");
    }

    /// Destroy every asteroid. Returns how many were removed.
    pub fn clear_asteroids(&mut self) -> usize {
        for id in self.ids_with_tag(EntityTag::Asteroid) {
            self.commands
                .destroy(id, CausalReason::GameRule("clear_asteroids".to_owned()));
        }
        self.flush_commands().destroyed
    }

    /// Teleport an entity. Returns `false` for stale handles.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        entity.position = position;
        self.physics.set_position(id, position);
        true
    }

    // -- stepping -----------------------------------------------------------

    /// Feed one input snapshot to the ship. A fire edge spawns a bullet
    /// immediately.
    pub fn apply_input(&mut self, input: &InputSnapshot) {
        let Some(id) = self.live_player() else {
            return;
        };
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        if !entity.active {
            return;
        }
        let (position, rotation) = (entity.position, entity.rotation);
        let Some(player) = entity.as_player_mut() else {
            return;
        };
        if let Some(bullet) = player.on_tick(position, rotation, input) {
            self.commands
                .spawn(bullet, CausalReason::PlayerInput("fire".to_owned()));
            self.flush_commands();
        }
    }

    /// Advance one fixed step of `dt` seconds and return the events it
    /// produced.
    pub fn tick(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut report = StepReport::default();

        self.fixed_tick_player(dt);

        let pairs = self.physics.step(dt);
        report.collisions = pairs.len();
        self.sync_transforms();

        for pair in pairs {
            if !self.dispatch(pair) {
                report.skipped_pairs += 1;
            }
        }

        let applied = self.flush_commands();
        report.spawned = applied.spawned;
        report.destroyed = applied.destroyed;

        report.expired = self.expire_lifetimes(dt);

        trace!(
            entities = self.entities.len(),
            collisions = report.collisions,
            spawned = report.spawned,
            destroyed = report.destroyed,
            expired = report.expired,
            "world step"
        );
        self.last_report = report;
        std::mem::take(&mut self.events)
    }

    fn fixed_tick_player(&mut self, dt: f32) {
        let Some(id) = self.live_player() else {
            return;
        };
        let bounds = self.bounds;
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        if !entity.active {
            return;
        }
        let (position, rotation) = (entity.position, entity.rotation);
        let mut ctx = hook_context!(self);
        if let EntityKind::Player(player) = &mut entity.kind {
            if let Some(wrapped) =
                player.on_fixed_tick(id, position, rotation, dt, &bounds, &mut ctx)
            {
                entity.position = wrapped;
            }
        }
    }

    fn sync_transforms(&mut self) {
        for (id, entity) in self.entities.iter_mut() {
            if let Some(position) = self.physics.position(id) {
                entity.position = position;
            }
            if let Some(rotation) = self.physics.rotation(id) {
                entity.rotation = rotation;
            }
        }
    }

    /// Notify both participants. Returns `false` if the pair was skipped
    /// because one side is gone or inactive.
    fn dispatch(&mut self, pair: CollisionPair) -> bool {
        let (a, b) = (pair.entity_a, pair.entity_b);
        let (tag_a, tag_b) = match (self.entities.get(a), self.entities.get(b)) {
            (Some(ea), Some(eb)) if ea.active && eb.active => (ea.tag(), eb.tag()),
            _ => {
                trace!(a = %a, b = %b, "collision skipped");
                return false;
            }
        };
        self.notify(a, b, tag_b);
        self.notify(b, a, tag_a);
        true
    }

    fn notify(&mut self, me: EntityId, other: EntityId, other_tag: EntityTag) {
        let Some(entity) = self.entities.get_mut(me) else {
            return;
        };
        if !entity.active {
            return;
        }
        let contact = Contact {
            me,
            position: entity.position,
            rotation: entity.rotation,
            other,
            other_tag,
        };
        let mut ctx = hook_context!(self);
        let reaction = match &mut entity.kind {
            EntityKind::Asteroid(asteroid) => asteroid.on_collision(contact, &mut ctx),
            EntityKind::Bullet(bullet) => bullet.on_collision(contact, &mut ctx),
            EntityKind::Player(player) => player.on_collision(contact, &mut ctx),
        };
        if reaction == Reaction::Destroy {
            entity.active = false;
            self.commands
                .destroy(me, CausalReason::CollisionResponse(me, other));
        }
    }

    fn flush_commands(&mut self) -> ApplyReport {
        let mut pending = std::mem::take(&mut self.commands);
        for cmd in pending.apply(self) {
            trace!(
                index = cmd.command_index,
                entity = ?cmd.target.or(cmd.spawned_entity),
                reason = ?cmd.reason,
                applied = cmd.applied_successfully,
                "intent applied"
            );
        }
        debug_assert!(self.commands.is_empty(), "spawn hooks do not queue intents");
        let report = *pending.last_apply_report();
        self.commands = pending;
        report
    }

    fn expire_lifetimes(&mut self, dt: f32) -> usize {
        for (id, entity) in self.entities.iter_mut() {
            let Some(lifetime) = entity.lifetime.as_mut() else {
                continue;
            };
            if lifetime.tick(dt) {
                debug!(entity = %id, "lifetime expired");
                self.commands.destroy(id, CausalReason::LifetimeExpired);
            }
        }
        self.flush_commands().destroyed
    }

    // -- accessors ----------------------------------------------------------

    fn live_player(&self) -> Option<EntityId> {
        self.player.filter(|id| self.entities.contains(*id))
    }

    /// Look up an entity.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// All entities in ascending slot order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().map(|(_, e)| e)
    }

    /// Handles of every entity with the given tag, ascending.
    pub fn ids_with_tag(&self, tag: EntityTag) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.tag() == tag)
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of entities with the given tag.
    pub fn count(&self, tag: EntityTag) -> usize {
        self.entities.iter().filter(|(_, e)| e.tag() == tag).count()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The ship's handle, if it exists.
    pub fn player_id(&self) -> Option<EntityId> {
        self.live_player()
    }

    /// The ship, if it exists.
    pub fn player(&self) -> Option<&Entity> {
        self.live_player().and_then(|id| self.entities.get(id))
    }

    /// The physics backend.
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable physics backend.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// Tunables.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Viewport rectangle used for screen wrap.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Replace the viewport rectangle used for screen wrap. Bounds without
    /// positive finite area are refused and the old ones kept; returns
    /// whether the new bounds were taken.
    pub fn set_bounds(&mut self, bounds: Bounds) -> bool {
        if !bounds.is_valid() {
            return false;
        }
        self.bounds = bounds;
        true
    }

    /// Counters from the last [`tick`](Self::tick).
    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Pcg64 {
        &mut self.rng
    }
}

impl<P: PhysicsEngine> CommandTarget<EntityDescriptor> for World<P> {
    fn spawn(&mut self, descriptor: EntityDescriptor) -> EntityId {
        World::spawn(self, descriptor)
    }

    fn destroy(&mut self, entity: EntityId) -> bool {
        World::destroy(self, entity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
