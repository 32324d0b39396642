//! Rigid-body physics behind the [`PhysicsEngine`] trait.
//!
//! The world never talks to a solver directly. It registers one body per
//! entity, pushes one-shot forces and torques, steps, and reads back
//! positions and collision-start pairs. Two backends ship with the crate:
//!
//! - [`PhysicsWorld`]: rapier2d, zero gravity, compiled with
//!   `enhanced-determinism`.
//! - [`ManualPhysics`]: explicit Euler integration with no contact
//!   detection. Tests queue the collisions they want reported.
//!
//! # Forces
//!
//! Forces and torques accumulate until the next [`step`](PhysicsEngine::step)
//! and are cleared afterwards, so a force applied once acts for exactly one
//! fixed step. Continuous thrust must be reapplied every step.
//!
//! # Determinism
//!
//! `step` returns collision pairs sorted by `(min id, max id)`, whatever
//! order the solver produced them in.

use std::collections::{BTreeMap, HashMap};

use driftrock_ecs::entity::EntityId;
use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CollisionLayer
// ---------------------------------------------------------------------------

/// Which other bodies a body reports contacts with.
///
/// | layer    | contacts with              |
/// |----------|----------------------------|
/// | Player   | Asteroid                   |
/// | Asteroid | Player, Asteroid, Bullet   |
/// | Bullet   | Asteroid, Bullet           |
/// | Ignore   | nothing                    |
///
/// Bullets spawn inside the ship, so Player and Bullet never meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionLayer {
    /// The player ship.
    Player,
    /// Asteroids of any size.
    Asteroid,
    /// Projectiles.
    Bullet,
    /// Collides with nothing (invulnerable ship).
    Ignore,
}

impl CollisionLayer {
    /// Whether bodies on `self` and `other` report contacts.
    pub fn interacts_with(self, other: CollisionLayer) -> bool {
        use CollisionLayer::*;
        matches!(
            (self, other),
            (Player, Asteroid)
                | (Asteroid, Player)
                | (Asteroid, Asteroid)
                | (Asteroid, Bullet)
                | (Bullet, Asteroid)
                | (Bullet, Bullet)
        )
    }

    /// rapier interaction groups encoding the table above.
    pub fn interaction_groups(self) -> InteractionGroups {
        match self {
            CollisionLayer::Player => InteractionGroups::new(Group::GROUP_1, Group::GROUP_2),
            CollisionLayer::Asteroid => InteractionGroups::new(
                Group::GROUP_2,
                Group::GROUP_1 | Group::GROUP_2 | Group::GROUP_3,
            ),
            CollisionLayer::Bullet => {
                InteractionGroups::new(Group::GROUP_3, Group::GROUP_2 | Group::GROUP_3)
            }
            CollisionLayer::Ignore => InteractionGroups::none(),
        }
    }
}

// ---------------------------------------------------------------------------
// BodyDescriptor
// ---------------------------------------------------------------------------

/// Everything a backend needs to create a body.
///
/// All bodies are dynamic circles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    /// Initial position.
    pub position: Vec2,
    /// Initial rotation in radians, counter-clockwise, 0 facing +Y.
    pub rotation: f32,
    /// Collider radius.
    pub radius: f32,
    /// Body mass.
    pub mass: f32,
    /// Initial collision layer.
    pub layer: CollisionLayer,
    /// Linear velocity damping.
    pub linear_damping: f32,
    /// Angular velocity damping.
    pub angular_damping: f32,
}

// ---------------------------------------------------------------------------
// CollisionPair
// ---------------------------------------------------------------------------

/// Two entities whose bodies started touching during a step.
///
/// Always stored with `entity_a < entity_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionPair {
    /// Lower entity handle.
    pub entity_a: EntityId,
    /// Higher entity handle.
    pub entity_b: EntityId,
}

impl CollisionPair {
    /// Build a pair, putting the lower handle first.
    pub fn new(a: EntityId, b: EntityId) -> Self {
        Self {
            entity_a: a.min(b),
            entity_b: a.max(b),
        }
    }
}

fn sort_pairs(pairs: &mut Vec<CollisionPair>) {
    pairs.sort();
    pairs.dedup();
}

// ---------------------------------------------------------------------------
// PhysicsEngine
// ---------------------------------------------------------------------------

/// The rigid-body operations the world relies on.
///
/// Every method taking an unknown entity is a no-op (setters) or returns
/// `None` (getters).
pub trait PhysicsEngine {
    /// Create a body for `entity`. Registering twice is a no-op.
    fn register(&mut self, entity: EntityId, body: &BodyDescriptor);
    /// Remove the entity's body.
    fn unregister(&mut self, entity: EntityId);
    /// Whether `entity` has a body.
    fn has_entity(&self, entity: EntityId) -> bool;
    /// Number of registered bodies.
    fn body_count(&self) -> usize;

    /// Add a force that acts during the next step only.
    fn apply_force(&mut self, entity: EntityId, force: Vec2);
    /// Add a torque that acts during the next step only.
    fn apply_torque(&mut self, entity: EntityId, torque: f32);

    /// Current position.
    fn position(&self, entity: EntityId) -> Option<Vec2>;
    /// Teleport the body.
    fn set_position(&mut self, entity: EntityId, position: Vec2);
    /// Current rotation in radians.
    fn rotation(&self, entity: EntityId) -> Option<f32>;
    /// Current linear velocity.
    fn velocity(&self, entity: EntityId) -> Option<Vec2>;
    /// Overwrite the linear velocity.
    fn set_velocity(&mut self, entity: EntityId, velocity: Vec2);
    /// Current angular velocity in radians per second.
    fn angular_velocity(&self, entity: EntityId) -> Option<f32>;
    /// Overwrite the angular velocity.
    fn set_angular_velocity(&mut self, entity: EntityId, angular_velocity: f32);
    /// Body mass.
    fn mass(&self, entity: EntityId) -> Option<f32>;

    /// Take the body out of (or put it back into) the simulation. Disabled
    /// bodies neither move nor collide.
    fn set_enabled(&mut self, entity: EntityId, enabled: bool);
    /// Change which bodies this one reports contacts with.
    fn set_layer(&mut self, entity: EntityId, layer: CollisionLayer);

    /// Advance by `dt` seconds, clear accumulated forces, and return the
    /// contacts that started during the step, sorted.
    fn step(&mut self, dt: f32) -> Vec<CollisionPair>;
}

// ---------------------------------------------------------------------------
// PhysicsWorld (rapier2d)
// ---------------------------------------------------------------------------

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// rapier2d-backed [`PhysicsEngine`].
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Raw entity id -> body.
    entity_to_body: HashMap<u64, RigidBodyHandle>,
    /// Collider -> raw entity id, for contact lookup.
    collider_to_entity: HashMap<ColliderHandle, u64>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create an empty zero-gravity world.
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, 0.0],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entity_to_body: HashMap::new(),
            collider_to_entity: HashMap::new(),
        }
    }

    fn body(&self, entity: EntityId) -> Option<&RigidBody> {
        let handle = self.entity_to_body.get(&entity.to_raw())?;
        self.rigid_body_set.get(*handle)
    }

    fn body_mut(&mut self, entity: EntityId) -> Option<&mut RigidBody> {
        let handle = self.entity_to_body.get(&entity.to_raw())?;
        self.rigid_body_set.get_mut(*handle)
    }
}

impl PhysicsEngine for PhysicsWorld {
    fn register(&mut self, entity: EntityId, body: &BodyDescriptor) {
        let raw_id = entity.to_raw();
        if self.entity_to_body.contains_key(&raw_id) {
            return;
        }

        let rb = RigidBodyBuilder::dynamic()
            .translation(to_vector(body.position))
            .rotation(body.rotation)
            .linear_damping(body.linear_damping)
            .angular_damping(body.angular_damping)
            .can_sleep(false)
            .build();
        let body_handle = self.rigid_body_set.insert(rb);
        self.entity_to_body.insert(raw_id, body_handle);

        let collider = ColliderBuilder::ball(body.radius)
            .mass(body.mass)
            .collision_groups(body.layer.interaction_groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        self.collider_to_entity.insert(collider_handle, raw_id);
    }

    fn unregister(&mut self, entity: EntityId) {
        let raw_id = entity.to_raw();
        if let Some(body_handle) = self.entity_to_body.remove(&raw_id) {
            if let Some(rb) = self.rigid_body_set.get(body_handle) {
                for collider in rb.colliders() {
                    self.collider_to_entity.remove(collider);
                }
            }
            self.rigid_body_set.remove(
                body_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }
    }

    fn has_entity(&self, entity: EntityId) -> bool {
        self.entity_to_body.contains_key(&entity.to_raw())
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn apply_force(&mut self, entity: EntityId, force: Vec2) {
        if let Some(rb) = self.body_mut(entity) {
            rb.add_force(to_vector(force), true);
        }
    }

    fn apply_torque(&mut self, entity: EntityId, torque: f32) {
        if let Some(rb) = self.body_mut(entity) {
            rb.add_torque(torque, true);
        }
    }

    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.body(entity).map(|rb| from_vector(rb.translation()))
    }

    fn set_position(&mut self, entity: EntityId, position: Vec2) {
        if let Some(rb) = self.body_mut(entity) {
            rb.set_translation(to_vector(position), true);
        }
    }

    fn rotation(&self, entity: EntityId) -> Option<f32> {
        self.body(entity).map(|rb| rb.rotation().angle())
    }

    fn velocity(&self, entity: EntityId) -> Option<Vec2> {
        self.body(entity).map(|rb| from_vector(rb.linvel()))
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: Vec2) {
        if let Some(rb) = self.body_mut(entity) {
            rb.set_linvel(to_vector(velocity), true);
        }
    }

    fn angular_velocity(&self, entity: EntityId) -> Option<f32> {
        self.body(entity).map(|rb| rb.angvel())
    }

    fn set_angular_velocity(&mut self, entity: EntityId, angular_velocity: f32) {
        if let Some(rb) = self.body_mut(entity) {
            rb.set_angvel(angular_velocity, true);
        }
    }

    fn mass(&self, entity: EntityId) -> Option<f32> {
        self.body(entity).map(|rb| rb.mass())
    }

    fn set_enabled(&mut self, entity: EntityId, enabled: bool) {
        if let Some(rb) = self.body_mut(entity) {
            rb.set_enabled(enabled);
        }
    }

    fn set_layer(&mut self, entity: EntityId, layer: CollisionLayer) {
        let Some(rb) = self.body(entity) else {
            return;
        };
        let handles: Vec<ColliderHandle> = rb.colliders().to_vec();
        let groups = layer.interaction_groups();
        for handle in handles {
            if let Some(collider) = self.collider_set.get_mut(handle) {
                collider.set_collision_groups(groups);
            }
        }
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        self.integration_params.dt = dt;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        // One-shot forces: nothing carries over into the next step.
        for (_, rb) in self.rigid_body_set.iter_mut() {
            rb.reset_forces(false);
            rb.reset_torques(false);
        }

        let mut collisions = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let entity_a = self.collider_to_entity.get(&h1).copied();
                let entity_b = self.collider_to_entity.get(&h2).copied();
                if let (Some(a), Some(b)) = (entity_a, entity_b) {
                    collisions.push(CollisionPair::new(
                        EntityId::from_raw(a),
                        EntityId::from_raw(b),
                    ));
                }
            }
        }
        sort_pairs(&mut collisions);
        collisions
    }
}

// ---------------------------------------------------------------------------
// ManualPhysics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ManualBody {
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    angular_velocity: f32,
    mass: f32,
    force: Vec2,
    torque: f32,
    enabled: bool,
    layer: CollisionLayer,
}

/// Deterministic scripted backend.
///
/// Integrates with explicit Euler (`v += F/m·dt`, `x += v·dt`; torque is
/// divided by mass as well) and never detects contacts on its own. Call
/// [`queue_collision`](Self::queue_collision) to have the next step report a
/// pair. Queued pairs are dropped at step time if either body is gone,
/// disabled, or on a layer that does not interact with the other.
#[derive(Debug, Default)]
pub struct ManualPhysics {
    bodies: BTreeMap<EntityId, ManualBody>,
    queued: Vec<CollisionPair>,
}

impl ManualPhysics {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a contact between `a` and `b` on the next step.
    pub fn queue_collision(&mut self, a: EntityId, b: EntityId) {
        self.queued.push(CollisionPair::new(a, b));
    }

    /// Current collision layer of a body.
    pub fn layer(&self, entity: EntityId) -> Option<CollisionLayer> {
        self.bodies.get(&entity).map(|b| b.layer)
    }

    /// Whether the body takes part in the simulation.
    pub fn is_enabled(&self, entity: EntityId) -> Option<bool> {
        self.bodies.get(&entity).map(|b| b.enabled)
    }

    fn reportable(&self, pair: &CollisionPair) -> bool {
        match (self.bodies.get(&pair.entity_a), self.bodies.get(&pair.entity_b)) {
            (Some(a), Some(b)) => a.enabled && b.enabled && a.layer.interacts_with(b.layer),
            _ => false,
        }
    }
}

impl PhysicsEngine for ManualPhysics {
    fn register(&mut self, entity: EntityId, body: &BodyDescriptor) {
        self.bodies.entry(entity).or_insert(ManualBody {
            position: body.position,
            rotation: body.rotation,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: body.mass,
            force: Vec2::ZERO,
            torque: 0.0,
            enabled: true,
            layer: body.layer,
        });
    }

    fn unregister(&mut self, entity: EntityId) {
        self.bodies.remove(&entity);
    }

    fn has_entity(&self, entity: EntityId) -> bool {
        self.bodies.contains_key(&entity)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn apply_force(&mut self, entity: EntityId, force: Vec2) {
        if let Some(b) = self.bodies.get_mut(&entity) {
            b.force += force;
        }
    }

    fn apply_torque(&mut self, entity: EntityId, torque: f32) {
        if let Some(b) = self.bodies.get_mut(&entity) {
            b.torque += torque;
        }
    }

    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.bodies.get(&entity).map(|b| b.position)
    }

    fn set_position(&mut self, entity: EntityId, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(&entity) {
            b.position = position;
        }
    }

    fn rotation(&self, entity: EntityId) -> Option<f32> {
        self.bodies.get(&entity).map(|b| b.rotation)
    }

    fn velocity(&self, entity: EntityId) -> Option<Vec2> {
        self.bodies.get(&entity).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&entity) {
            b.velocity = velocity;
        }
    }

    fn angular_velocity(&self, entity: EntityId) -> Option<f32> {
        self.bodies.get(&entity).map(|b| b.angular_velocity)
    }

    fn set_angular_velocity(&mut self, entity: EntityId, angular_velocity: f32) {
        if let Some(b) = self.bodies.get_mut(&entity) {
            b.angular_velocity = angular_velocity;
        }
    }

    fn mass(&self, entity: EntityId) -> Option<f32> {
        self.bodies.get(&entity).map(|b| b.mass)
    }

    fn set_enabled(&mut self, entity: EntityId, enabled: bool) {
        if let Some(b) = self.bodies.get_mut(&entity) {
            b.enabled = enabled;
        }
    }

    fn set_layer(&mut self, entity: EntityId, layer: CollisionLayer) {
        if let Some(b) = self.bodies.get_mut(&entity) {
            b.layer = layer;
        }
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        for body in self.bodies.values_mut() {
            if body.enabled {
                body.velocity += body.force / body.mass * dt;
                body.position += body.velocity * dt;
                body.angular_velocity += body.torque / body.mass * dt;
                body.rotation += body.angular_velocity * dt;
            }
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }

        let queued = std::mem::take(&mut self.queued);
        let mut collisions: Vec<CollisionPair> =
            queued.into_iter().filter(|p| self.reportable(p)).collect();
        sort_pairs(&mut collisions);
        collisions
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(position: Vec2, layer: CollisionLayer) -> BodyDescriptor {
        BodyDescriptor {
            position,
            rotation: 0.0,
            radius: 0.5,
            mass: 1.0,
            layer,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    const LAYERS: [CollisionLayer; 4] = [
        CollisionLayer::Player,
        CollisionLayer::Asteroid,
        CollisionLayer::Bullet,
        CollisionLayer::Ignore,
    ];

    #[test]
    fn layer_table_is_symmetric() {
        for a in LAYERS {
            for b in LAYERS {
                assert_eq!(a.interacts_with(b), b.interacts_with(a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn rapier_groups_match_layer_table() {
        for a in LAYERS {
            for b in LAYERS {
                assert_eq!(
                    a.interaction_groups().test(b.interaction_groups()),
                    a.interacts_with(b),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn pair_puts_lower_id_first() {
        let lo = EntityId::new(1, 0);
        let hi = EntityId::new(7, 0);
        assert_eq!(CollisionPair::new(hi, lo), CollisionPair::new(lo, hi));
        assert_eq!(CollisionPair::new(hi, lo).entity_a, lo);
    }

    #[test]
    fn register_is_idempotent() {
        let mut pw = PhysicsWorld::new();
        let e = EntityId::new(0, 0);
        pw.register(e, &ball(Vec2::ZERO, CollisionLayer::Asteroid));
        pw.register(e, &ball(Vec2::ZERO, CollisionLayer::Asteroid));
        assert_eq!(pw.body_count(), 1);
        pw.unregister(e);
        assert!(!pw.has_entity(e));
        assert_eq!(pw.body_count(), 0);
    }

    #[test]
    fn unregister_drops_only_its_own_colliders() {
        let mut pw = PhysicsWorld::new();
        let keep = EntityId::new(0, 0);
        let gone = EntityId::new(1, 0);
        pw.register(keep, &ball(Vec2::ZERO, CollisionLayer::Asteroid));
        pw.register(gone, &ball(Vec2::X * 5.0, CollisionLayer::Asteroid));
        assert_eq!(pw.collider_to_entity.len(), 2);

        pw.unregister(gone);
        assert_eq!(pw.collider_to_entity.len(), 1);
        assert!(pw.collider_to_entity.values().all(|&raw| raw == keep.to_raw()));
        assert_eq!(pw.collider_set.len(), 1);
    }

    #[test]
    fn unknown_entity_is_ignored() {
        let mut pw = PhysicsWorld::new();
        let e = EntityId::new(42, 0);
        pw.apply_force(e, Vec2::X);
        pw.set_position(e, Vec2::ONE);
        pw.unregister(e);
        assert_eq!(pw.position(e), None);
        assert_eq!(pw.mass(e), None);
    }

    #[test]
    fn one_shot_force_does_not_persist() {
        let mut pw = PhysicsWorld::new();
        let e = EntityId::new(0, 0);
        pw.register(e, &ball(Vec2::ZERO, CollisionLayer::Asteroid));
        pw.apply_force(e, Vec2::new(50.0, 0.0));
        pw.step(0.02);
        let v1 = pw.velocity(e).unwrap();
        assert!(v1.x > 0.0);
        pw.step(0.02);
        let v2 = pw.velocity(e).unwrap();
        assert!((v2.x - v1.x).abs() < 1e-4, "velocity kept growing: {v1} -> {v2}");
    }

    #[test]
    fn collider_mass_is_applied() {
        let mut pw = PhysicsWorld::new();
        let e = EntityId::new(0, 0);
        let mut desc = ball(Vec2::ZERO, CollisionLayer::Asteroid);
        desc.mass = 1.5;
        pw.register(e, &desc);
        pw.step(0.02);
        assert!((pw.mass(e).unwrap() - 1.5).abs() < 1e-4);
    }

    #[test]
    fn overlapping_asteroids_report_a_contact() {
        let mut pw = PhysicsWorld::new();
        let a = EntityId::new(0, 0);
        let b = EntityId::new(1, 0);
        pw.register(b, &ball(Vec2::new(0.4, 0.0), CollisionLayer::Asteroid));
        pw.register(a, &ball(Vec2::ZERO, CollisionLayer::Asteroid));
        let pairs = pw.step(0.02);
        assert_eq!(pairs, vec![CollisionPair::new(a, b)]);
    }

    #[test]
    fn ignore_layer_suppresses_contacts() {
        let mut pw = PhysicsWorld::new();
        let ship = EntityId::new(0, 0);
        let rock = EntityId::new(1, 0);
        pw.register(ship, &ball(Vec2::ZERO, CollisionLayer::Ignore));
        pw.register(rock, &ball(Vec2::new(0.4, 0.0), CollisionLayer::Asteroid));
        assert!(pw.step(0.02).is_empty());
    }

    #[test]
    fn manual_integration_is_explicit_euler() {
        let mut mp = ManualPhysics::new();
        let e = EntityId::new(0, 0);
        mp.register(e, &ball(Vec2::ZERO, CollisionLayer::Bullet));
        mp.apply_force(e, Vec2::new(0.0, 500.0));
        mp.step(0.02);
        assert_eq!(mp.velocity(e), Some(Vec2::new(0.0, 10.0)));
        assert_eq!(mp.position(e), Some(Vec2::new(0.0, 0.2)));
        mp.step(0.02);
        assert_eq!(mp.velocity(e), Some(Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn manual_queue_is_filtered_and_sorted() {
        let mut mp = ManualPhysics::new();
        let ship = EntityId::new(0, 0);
        let rock = EntityId::new(1, 0);
        let shot = EntityId::new(2, 0);
        mp.register(ship, &ball(Vec2::ZERO, CollisionLayer::Player));
        mp.register(rock, &ball(Vec2::ZERO, CollisionLayer::Asteroid));
        mp.register(shot, &ball(Vec2::ZERO, CollisionLayer::Bullet));

        mp.queue_collision(shot, rock);
        mp.queue_collision(shot, ship); // player and bullet never meet
        mp.queue_collision(rock, ship);
        mp.queue_collision(rock, shot); // duplicate
        let pairs = mp.step(0.02);
        assert_eq!(
            pairs,
            vec![CollisionPair::new(ship, rock), CollisionPair::new(rock, shot)]
        );
        assert!(mp.step(0.02).is_empty(), "queue drains after one step");
    }

    #[test]
    fn manual_disabled_body_neither_moves_nor_collides() {
        let mut mp = ManualPhysics::new();
        let ship = EntityId::new(0, 0);
        let rock = EntityId::new(1, 0);
        mp.register(ship, &ball(Vec2::ZERO, CollisionLayer::Player));
        mp.register(rock, &ball(Vec2::ZERO, CollisionLayer::Asteroid));
        mp.set_enabled(ship, false);
        mp.set_velocity(ship, Vec2::ONE);
        mp.queue_collision(ship, rock);
        assert!(mp.step(0.02).is_empty());
        assert_eq!(mp.position(ship), Some(Vec2::ZERO));
    }
}
