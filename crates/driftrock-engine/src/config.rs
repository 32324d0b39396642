//! Game configuration.
//!
//! [`GameConfig`] groups every tunable of the simulation. All sections
//! deserialize with `#[serde(default)]`, so a JSON document only has to name
//! the values it overrides:
//!
//! ```
//! use driftrock_engine::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "bullet": { "speed": 650.0 } }"#).unwrap();
//! assert_eq!(config.bullet.speed, 650.0);
//! assert_eq!(config.rules.starting_lives, 3);
//! ```
//!
//! Configs built by hand should go through [`GameConfig::validate`] before
//! they reach a [`Simulation`](crate::tick::Simulation); the simulation
//! constructor calls it too.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Why a configuration was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds a value the simulation cannot run with.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    let reason = reason.into();
    warn!(field, %reason, "rejected game config");
    ConfigError::Invalid { field, reason }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive and finite, got {value}")))
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be non-negative and finite, got {value}")))
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Fixed-timestep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per fixed step.
    pub fixed_dt: f32,
    /// Most fixed steps a single [`advance`](crate::tick::Simulation::advance)
    /// call may run; leftover frame time is dropped.
    pub max_substeps: u32,
    /// Seed for the world's random number generator.
    pub seed: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 0.02,
            max_substeps: 8,
            seed: 0,
        }
    }
}

/// Asteroid tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidConfig {
    /// Smallest size a spawned asteroid can have; halves below this do not
    /// split further.
    pub min_size: f32,
    /// Largest size a spawned asteroid can have.
    pub max_size: f32,
    /// Magnitude of the one-time trajectory force.
    pub movement_speed: f32,
    /// Seconds before an asteroid is removed without scoring.
    pub max_lifetime: f32,
    /// Number of cosmetic sprite variants to pick from.
    pub sprite_variants: u32,
    /// Radius of the disc around the parent where split children appear.
    pub split_offset_radius: f32,
}

impl Default for AsteroidConfig {
    fn default() -> Self {
        Self {
            min_size: 0.35,
            max_size: 1.65,
            movement_speed: 50.0,
            max_lifetime: 30.0,
            sprite_variants: 4,
            split_offset_radius: 0.5,
        }
    }
}

/// Bullet tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    /// Magnitude of the one-time launch force.
    pub speed: f32,
    /// Seconds before an unused bullet is removed.
    pub max_lifetime: f32,
    /// Collider radius.
    pub radius: f32,
    /// Body mass.
    pub mass: f32,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            speed: 500.0,
            max_lifetime: 10.0,
            radius: 0.1,
            mass: 1.0,
        }
    }
}

/// Player ship tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Thrust force applied every fixed step while thrusting.
    pub thrust_speed: f32,
    /// Torque applied every fixed step while turning.
    pub rotation_speed: f32,
    /// Seconds between death and respawn.
    pub respawn_delay: f32,
    /// Seconds of asteroid immunity after each (re)spawn.
    pub respawn_invulnerability: f32,
    /// Wrap the ship to the opposite edge when it leaves the viewport.
    pub screen_wrapping: bool,
    /// Collider radius.
    pub radius: f32,
    /// Body mass.
    pub mass: f32,
    /// Linear velocity damping of the ship body.
    pub linear_damping: f32,
    /// Angular velocity damping of the ship body.
    pub angular_damping: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            thrust_speed: 1.0,
            rotation_speed: 0.1,
            respawn_delay: 3.0,
            respawn_invulnerability: 3.0,
            screen_wrapping: true,
            radius: 0.5,
            mass: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.05,
        }
    }
}

/// Asteroid spawner tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Seconds between spawn waves; the first wave fires after one interval.
    pub spawn_rate: f32,
    /// Asteroids per wave.
    pub amount_per_spawn: u32,
    /// Distance from the origin at which asteroids appear.
    pub spawn_distance: f32,
    /// Maximum deviation, in degrees, of a trajectory from straight inward.
    pub trajectory_variance: f32,
    /// Centre of the spawn ring.
    pub origin: Vec2,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 1.0,
            amount_per_spawn: 1,
            spawn_distance: 12.0,
            trajectory_variance: 15.0,
            origin: Vec2::ZERO,
        }
    }
}

/// Largest accepted [`SpawnerConfig::trajectory_variance`], in degrees.
pub const MAX_TRAJECTORY_VARIANCE: f32 = 45.0;

/// Scoring and lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Lives at the start of every game.
    pub starting_lives: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { starting_lives: 3 }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Every tunable of the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Fixed-timestep settings.
    pub tick: TickConfig,
    /// Asteroid tunables.
    pub asteroid: AsteroidConfig,
    /// Bullet tunables.
    pub bullet: BulletConfig,
    /// Player ship tunables.
    pub player: PlayerConfig,
    /// Spawner tunables.
    pub spawner: SpawnerConfig,
    /// Scoring and lives.
    pub rules: RulesConfig,
}

impl GameConfig {
    /// Parse a JSON document and validate the result.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("tick.fixed_dt", self.tick.fixed_dt)?;
        if self.tick.max_substeps == 0 {
            return Err(invalid("tick.max_substeps", "must be at least 1"));
        }

        let a = &self.asteroid;
        require_positive("asteroid.min_size", a.min_size)?;
        require_positive("asteroid.max_size", a.max_size)?;
        if a.min_size > a.max_size {
            return Err(invalid(
                "asteroid.max_size",
                format!("must be >= min_size ({} > {})", a.min_size, a.max_size),
            ));
        }
        require_non_negative("asteroid.movement_speed", a.movement_speed)?;
        require_positive("asteroid.max_lifetime", a.max_lifetime)?;
        if a.sprite_variants == 0 {
            return Err(invalid("asteroid.sprite_variants", "must be at least 1"));
        }
        require_non_negative("asteroid.split_offset_radius", a.split_offset_radius)?;

        let b = &self.bullet;
        require_non_negative("bullet.speed", b.speed)?;
        require_positive("bullet.max_lifetime", b.max_lifetime)?;
        require_positive("bullet.radius", b.radius)?;
        require_positive("bullet.mass", b.mass)?;

        let p = &self.player;
        require_non_negative("player.thrust_speed", p.thrust_speed)?;
        require_non_negative("player.rotation_speed", p.rotation_speed)?;
        require_non_negative("player.respawn_delay", p.respawn_delay)?;
        require_non_negative("player.respawn_invulnerability", p.respawn_invulnerability)?;
        require_positive("player.radius", p.radius)?;
        require_positive("player.mass", p.mass)?;
        require_non_negative("player.linear_damping", p.linear_damping)?;
        require_non_negative("player.angular_damping", p.angular_damping)?;

        let s = &self.spawner;
        require_positive("spawner.spawn_rate", s.spawn_rate)?;
        require_non_negative("spawner.spawn_distance", s.spawn_distance)?;
        if !(0.0..=MAX_TRAJECTORY_VARIANCE).contains(&s.trajectory_variance) {
            return Err(invalid(
                "spawner.trajectory_variance",
                format!(
                    "must be within 0..={MAX_TRAJECTORY_VARIANCE} degrees, got {}",
                    s.trajectory_variance
                ),
            ));
        }
        if !s.origin.is_finite() {
            return Err(invalid("spawner.origin", "must be finite"));
        }

        if self.rules.starting_lives < 1 {
            return Err(invalid(
                "rules.starting_lives",
                format!("must be at least 1, got {}", self.rules.starting_lives),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn defaults_match_tuned_values() {
        let c = GameConfig::default();
        assert_eq!(c.asteroid.min_size, 0.35);
        assert_eq!(c.asteroid.max_size, 1.65);
        assert_eq!(c.asteroid.movement_speed, 50.0);
        assert_eq!(c.asteroid.max_lifetime, 30.0);
        assert_eq!(c.bullet.speed, 500.0);
        assert_eq!(c.bullet.max_lifetime, 10.0);
        assert_eq!(c.player.respawn_delay, 3.0);
        assert_eq!(c.player.respawn_invulnerability, 3.0);
        assert_eq!(c.spawner.spawn_distance, 12.0);
        assert_eq!(c.spawner.trajectory_variance, 15.0);
        assert_eq!(c.rules.starting_lives, 3);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let c = GameConfig::from_json_str("{}").unwrap();
        assert_eq!(c, GameConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_fields() {
        let c = GameConfig::from_json_str(r#"{"spawner": {"amount_per_spawn": 0}}"#).unwrap();
        assert_eq!(c.spawner.amount_per_spawn, 0);
        assert_eq!(c.spawner.spawn_rate, 1.0);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn negative_count_is_a_parse_error() {
        let err = GameConfig::from_json_str(r#"{"spawner": {"amount_per_spawn": -1}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_dt_is_rejected() {
        let mut c = GameConfig::default();
        c.tick.fixed_dt = 0.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "tick.fixed_dt", .. })
        ));
    }

    #[test]
    fn sizes_out_of_order_are_rejected() {
        let mut c = GameConfig::default();
        c.asteroid.min_size = 2.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "asteroid.max_size", .. })
        ));
    }

    #[test]
    fn variance_outside_range_is_rejected() {
        let mut c = GameConfig::default();
        c.spawner.trajectory_variance = 46.0;
        assert!(c.validate().is_err());
        c.spawner.trajectory_variance = 45.0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn nan_is_rejected() {
        let mut c = GameConfig::default();
        c.player.thrust_speed = f32::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_lives_is_rejected() {
        let mut c = GameConfig::default();
        c.rules.starting_lives = 0;
        assert!(c.validate().is_err());
    }
}
