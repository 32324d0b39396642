//! Periodic asteroid spawner.
//!
//! Every `spawn_rate` seconds the spawner drops `amount_per_spawn` asteroids
//! on a ring of radius `spawn_distance` around its origin, each aimed back
//! toward the origin with up to `trajectory_variance` degrees of deviation.
//! The first wave fires one full interval after creation. The spawner keeps
//! running in every game phase.

use driftrock_ecs::entity::EntityId;
use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::config::SpawnerConfig;
use crate::entity::EntityDescriptor;
use crate::physics::PhysicsEngine;
use crate::random::random_unit_vector;
use crate::world::World;

/// Countdown-driven asteroid source.
#[derive(Debug, Clone)]
pub struct AsteroidSpawner {
    config: SpawnerConfig,
    countdown: f32,
}

impl AsteroidSpawner {
    /// Create a spawner whose first wave is one interval away.
    pub fn new(config: &SpawnerConfig) -> Self {
        Self {
            config: config.clone(),
            countdown: config.spawn_rate,
        }
    }

    /// Seconds until the next wave.
    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    /// Count down by `dt`; fire as many waves as have come due. Returns the
    /// handles of everything spawned.
    pub fn update<P: PhysicsEngine>(&mut self, dt: f32, world: &mut World<P>) -> Vec<EntityId> {
        self.countdown -= dt;
        let mut spawned = Vec::new();
        while self.countdown <= 0.0 && self.config.spawn_rate > 0.0 {
            self.countdown += self.config.spawn_rate;
            spawned.extend(self.spawn(world));
        }
        spawned
    }

    /// Spawn one wave now.
    pub fn spawn<P: PhysicsEngine>(&self, world: &mut World<P>) -> Vec<EntityId> {
        let (min_size, max_size) = {
            let a = &world.config().asteroid;
            (a.min_size, a.max_size)
        };
        let variance_limit = self.config.trajectory_variance;

        (0..self.config.amount_per_spawn)
            .map(|_| {
                let rng = world.rng_mut();
                let direction = random_unit_vector(&mut *rng);
                let variance = rng.gen_range(-variance_limit..=variance_limit);
                let size = rng.gen_range(min_size..=max_size);

                let rotation = variance.to_radians();
                let position = self.config.origin + direction * self.config.spawn_distance;
                let trajectory = Vec2::from_angle(rotation).rotate(-direction);

                let id = world.spawn(EntityDescriptor::Asteroid {
                    position,
                    rotation,
                    size,
                    trajectory: Some(trajectory),
                });
                debug!(entity = %id, size, variance, "asteroid spawned");
                id
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::entity::EntityTag;
    use crate::physics::ManualPhysics;

    fn world() -> World<ManualPhysics> {
        World::new(GameConfig::default(), ManualPhysics::new()).unwrap()
    }

    #[test]
    fn first_wave_waits_one_interval() {
        let mut w = world();
        let mut spawner = AsteroidSpawner::new(&SpawnerConfig::default());
        for _ in 0..3 {
            assert!(spawner.update(0.25, &mut w).is_empty());
        }
        assert_eq!(spawner.update(0.25, &mut w).len(), 1);
        assert_eq!(spawner.countdown(), 1.0);
    }

    #[test]
    fn long_frame_fires_every_due_wave() {
        let mut w = world();
        let mut spawner = AsteroidSpawner::new(&SpawnerConfig::default());
        assert_eq!(spawner.update(3.0, &mut w).len(), 3);
    }

    #[test]
    fn spawns_on_ring_within_size_range() {
        let mut w = world();
        let config = SpawnerConfig {
            amount_per_spawn: 16,
            ..Default::default()
        };
        let spawner = AsteroidSpawner::new(&config);
        for id in spawner.spawn(&mut w) {
            let e = w.entity(id).unwrap();
            assert!((e.position.length() - 12.0).abs() < 1e-3);
            let size = e.as_asteroid().unwrap().size;
            assert!((0.35..=1.65).contains(&size));
            assert!(e.rotation.abs() <= 15f32.to_radians() + 1e-6);
        }
        assert_eq!(w.count(EntityTag::Asteroid), 16);
    }

    #[test]
    fn trajectory_points_back_at_origin() {
        let mut w = world();
        let config = SpawnerConfig {
            trajectory_variance: 0.0,
            ..Default::default()
        };
        let id = AsteroidSpawner::new(&config).spawn(&mut w)[0];
        w.tick(0.02);
        let e = w.entity(id).unwrap();
        let velocity = w.physics().velocity(id).unwrap();
        // inward means velocity opposes the spawn offset
        assert!(velocity.dot(e.position) < 0.0);
        assert!(velocity.perp_dot(e.position).abs() < 1e-3);
    }

    #[test]
    fn zero_amount_is_a_steady_state() {
        let mut w = world();
        let config = SpawnerConfig {
            amount_per_spawn: 0,
            ..Default::default()
        };
        let mut spawner = AsteroidSpawner::new(&config);
        assert!(spawner.update(5.0, &mut w).is_empty());
        assert!(w.is_empty());
    }
}
