//! Score, lives and the playing/game-over cycle.
//!
//! [`GameState`] is the only thing that changes score or lives. Entities
//! report [`GameEvent`]s; the state turns them into points, lost lives,
//! respawns and effects.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::GameConfig;
use crate::countdown::Countdown;
use crate::events::GameEvent;
use crate::host::{Effect, EffectKind, HudState};
use crate::physics::PhysicsEngine;
use crate::world::World;

/// Asteroids smaller than this are worth [`SMALL_ASTEROID_POINTS`].
pub const SMALL_ASTEROID_SIZE: f32 = 0.7;
/// Asteroids smaller than this (and not small) are worth
/// [`MEDIUM_ASTEROID_POINTS`].
pub const MEDIUM_ASTEROID_SIZE: f32 = 1.4;
/// Points for a small asteroid.
pub const SMALL_ASTEROID_POINTS: u32 = 100;
/// Points for a medium asteroid.
pub const MEDIUM_ASTEROID_POINTS: u32 = 50;
/// Points for a large asteroid.
pub const LARGE_ASTEROID_POINTS: u32 = 25;

/// Points for shooting an asteroid of the given size. Smaller is worth more.
pub fn score_for_size(size: f32) -> u32 {
    if size < SMALL_ASTEROID_SIZE {
        SMALL_ASTEROID_POINTS
    } else if size < MEDIUM_ASTEROID_SIZE {
        MEDIUM_ASTEROID_POINTS
    } else {
        LARGE_ASTEROID_POINTS
    }
}

/// Whether the game is running or waiting for a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Normal play.
    Playing,
    /// Out of lives; waiting for restart.
    GameOver,
}

/// Score, lives, phase and the pending respawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    score: u32,
    lives: i32,
    phase: GamePhase,
    respawn_countdown: Option<Countdown>,
    starting_lives: i32,
    respawn_delay: f32,
}

impl GameState {
    /// A state with zero score and full lives. Call
    /// [`new_game`](Self::new_game) to also reset the world.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            score: 0,
            lives: config.rules.starting_lives,
            phase: GamePhase::Playing,
            respawn_countdown: None,
            starting_lives: config.rules.starting_lives,
            respawn_delay: config.player.respawn_delay,
        }
    }

    /// Clear the field and start over: no asteroids, score 0, full lives,
    /// no pending respawn, the ship at the origin.
    ///
    /// Bullets already in flight are left alone.
    pub fn new_game<P: PhysicsEngine>(&mut self, world: &mut World<P>) {
        let cleared = world.clear_asteroids();
        self.score = 0;
        self.lives = self.starting_lives;
        self.phase = GamePhase::Playing;
        self.respawn_countdown = None;
        world.respawn_player(Vec2::ZERO);
        info!(cleared, lives = self.lives, "new game");
    }

    /// Credit an asteroid kill. Returns the points awarded.
    pub fn on_asteroid_destroyed(&mut self, size: f32) -> u32 {
        let points = score_for_size(size);
        self.score = self.score.saturating_add(points);
        points
    }

    /// Take the ship out, lose a life, then either schedule a respawn or
    /// end the game.
    pub fn on_player_death<P: PhysicsEngine>(&mut self, world: &mut World<P>) {
        world.deactivate_player();
        self.lives -= 1;
        if self.lives <= 0 {
            self.phase = GamePhase::GameOver;
            self.respawn_countdown = None;
            info!(score = self.score, "game over");
        } else {
            self.respawn_countdown = Some(Countdown::new(self.respawn_delay));
            info!(lives = self.lives, delay = self.respawn_delay, "respawn scheduled");
        }
    }

    /// React to one event. Returns the effect to show, if any.
    pub fn handle_event<P: PhysicsEngine>(
        &mut self,
        event: &GameEvent,
        world: &mut World<P>,
    ) -> Option<Effect> {
        match *event {
            GameEvent::AsteroidDestroyed { size, position, .. } => {
                let points = self.on_asteroid_destroyed(size);
                tracing::debug!(size, points, score = self.score, "asteroid scored");
                Some(Effect {
                    kind: EffectKind::AsteroidExplosion,
                    position,
                })
            }
            GameEvent::PlayerDied { position, .. } => {
                if self.phase == GamePhase::GameOver {
                    return None;
                }
                self.on_player_death(world);
                Some(Effect {
                    kind: EffectKind::PlayerExplosion,
                    position,
                })
            }
        }
    }

    /// Count down a pending respawn and bring the ship back at the origin
    /// when it reaches zero.
    pub fn update<P: PhysicsEngine>(&mut self, dt: f32, world: &mut World<P>) {
        let Some(countdown) = self.respawn_countdown.as_mut() else {
            return;
        };
        if countdown.tick(dt) {
            self.respawn_countdown = None;
            world.respawn_player(Vec2::ZERO);
        }
    }

    /// Current score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Remaining lives.
    pub fn lives(&self) -> i32 {
        self.lives
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Whether the game is over.
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Seconds until the ship respawns, if a respawn is pending.
    pub fn respawn_countdown(&self) -> Option<f32> {
        self.respawn_countdown.map(|c| c.remaining())
    }

    /// What the HUD should show.
    pub fn hud(&self) -> HudState {
        HudState {
            score: self.score,
            lives: self.lives,
            game_over: self.is_game_over(),
        }
    }
}
