//! Fixed-timestep simulation driver.
//!
//! [`Simulation`] is what a host talks to. It owns the [`World`], the
//! [`GameState`], the [`AsteroidSpawner`], the viewport and the render sink,
//! and runs one fixed step per [`step`](Simulation::step):
//!
//! 1. Restart, if the game is over and restart was pressed.
//! 2. Player input (thrust, turn, fire).
//! 3. [`World::tick`].
//! 4. Game-state event handling: score, lives, effects.
//! 5. Respawn countdown.
//! 6. Spawner countdown.
//! 7. HUD push.
//!
//! Hosts with a variable frame rate call [`advance`](Simulation::advance)
//! instead, which turns wall-clock time into whole fixed steps.
//!
//! # Example
//!
//! ```
//! use driftrock_engine::prelude::*;
//!
//! let mut sim = Simulation::with_rapier(GameConfig::default()).unwrap();
//! for _ in 0..10 {
//!     sim.step(&InputSnapshot::default());
//! }
//! assert_eq!(sim.tick_count(), 10);
//! assert_eq!(sim.lives(), 3);
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{ConfigError, GameConfig};
use crate::digest;
use crate::entity::EntityTag;
use crate::events::{GameEvent, StepReport};
use crate::game_state::{GamePhase, GameState};
use crate::host::{
    Bounds, FixedViewport, HudState, InputSnapshot, NullSink, RenderSink, Viewport,
};
use crate::physics::{PhysicsEngine, PhysicsWorld};
use crate::spawner::AsteroidSpawner;
use crate::world::World;

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// What happened during the last fixed step.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Tick number of the step (before the counter advanced).
    pub tick: u64,
    /// Asteroids alive after the step.
    pub asteroids: usize,
    /// Bullets alive after the step.
    pub bullets: usize,
    /// Counters from the world step.
    pub world: StepReport,
    /// Events the step produced.
    pub events: usize,
    /// Asteroids the spawner added.
    pub spawned_by_spawner: usize,
    /// Wall-clock time for the whole step.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// The host-facing game loop.
pub struct Simulation<P: PhysicsEngine = PhysicsWorld> {
    world: World<P>,
    game: GameState,
    spawner: AsteroidSpawner,
    viewport: Box<dyn Viewport>,
    sink: Box<dyn RenderSink>,
    tick_counter: u64,
    fixed_dt: f32,
    max_substeps: u32,
    accumulator: f32,
    /// Edge inputs seen by `advance` but not yet consumed by a step.
    pending_edges: InputSnapshot,
    /// Last unusable rectangle the viewport reported, so it is logged once.
    rejected_bounds: Option<Bounds>,
    last_diagnostics: TickDiagnostics,
}

impl Simulation<PhysicsWorld> {
    /// A rapier-backed simulation with a fixed default viewport and no
    /// render sink.
    pub fn with_rapier(config: GameConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            PhysicsWorld::new(),
            Box::new(FixedViewport::default()),
            Box::new(NullSink),
        )
    }
}

impl<P: PhysicsEngine> Simulation<P> {
    /// Validate `config`, build the world and start a new game.
    pub fn new(
        config: GameConfig,
        physics: P,
        viewport: Box<dyn Viewport>,
        sink: Box<dyn RenderSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let bounds = viewport.world_bounds();
        if !bounds.is_valid() {
            return Err(ConfigError::Invalid {
                field: "viewport.bounds",
                reason: format!("must have positive finite area, got {bounds:?}"),
            });
        }

        let fixed_dt = config.tick.fixed_dt;
        let max_substeps = config.tick.max_substeps;
        let game = GameState::new(&config);
        let spawner = AsteroidSpawner::new(&config.spawner);
        let mut world = World::new(config, physics)?;
        world.set_bounds(bounds);

        let mut sim = Self {
            world,
            game,
            spawner,
            viewport,
            sink,
            tick_counter: 0,
            fixed_dt,
            max_substeps,
            accumulator: 0.0,
            pending_edges: InputSnapshot::default(),
            rejected_bounds: None,
            last_diagnostics: TickDiagnostics::default(),
        };
        sim.game.new_game(&mut sim.world);
        sim.sink.on_hud(sim.game.hud());
        Ok(sim)
    }

    /// Run exactly one fixed step with `input`. Returns the step's events.
    pub fn step(&mut self, input: &InputSnapshot) -> Vec<GameEvent> {
        let start = Instant::now();
        let phase_before = self.game.phase();

        if self.game.is_game_over() && input.restart {
            self.game.new_game(&mut self.world);
        }

        self.refresh_bounds();
        self.world.apply_input(input);
        let events = self.world.tick(self.fixed_dt);

        for event in &events {
            if let Some(effect) = self.game.handle_event(event, &mut self.world) {
                self.sink.on_effect(effect);
            }
        }
        self.game.update(self.fixed_dt, &mut self.world);
        let spawned = self.spawner.update(self.fixed_dt, &mut self.world);

        let tick = self.tick_counter;
        self.tick_counter += 1;

        let phase = self.game.phase();
        if phase != phase_before {
            info!(tick, ?phase, score = self.game.score(), "phase changed");
            self.sink.on_phase_change(phase);
        }
        self.sink.on_hud(self.game.hud());

        self.last_diagnostics = TickDiagnostics {
            tick,
            asteroids: self.world.count(EntityTag::Asteroid),
            bullets: self.world.count(EntityTag::Bullet),
            world: *self.world.last_report(),
            events: events.len(),
            spawned_by_spawner: spawned.len(),
            total_time: start.elapsed(),
        };
        events
    }

    /// Run `count` steps with the same held input and no edges after the
    /// first.
    pub fn run_steps(&mut self, count: u64, input: &InputSnapshot) {
        let mut current = *input;
        for _ in 0..count {
            self.step(&current);
            current = input.without_edges();
        }
    }

    /// Accumulate `frame_dt` seconds of wall-clock time and run as many
    /// fixed steps as fit, up to `max_substeps`. Returns the number of steps
    /// run.
    ///
    /// Edge inputs (`fire`, `restart`) are delivered to the first step that
    /// runs, even if that happens on a later frame.
    pub fn advance(&mut self, frame_dt: f32, input: &InputSnapshot) -> u32 {
        self.pending_edges.fire |= input.fire;
        self.pending_edges.restart |= input.restart;
        if !(frame_dt.is_finite() && frame_dt > 0.0) {
            return 0;
        }

        self.accumulator += frame_dt;
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_substeps {
            let current = InputSnapshot {
                fire: self.pending_edges.fire,
                restart: self.pending_edges.restart,
                ..input.without_edges()
            };
            self.pending_edges = InputSnapshot::default();
            self.step(&current);
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }

        if self.accumulator >= self.fixed_dt {
            debug!(
                dropped = self.accumulator,
                max_substeps = self.max_substeps,
                "frame too long, dropping time"
            );
            self.accumulator = 0.0;
        }
        steps
    }

    /// Pull the viewport rectangle into the world. Unusable bounds leave the
    /// previous ones in place.
    fn refresh_bounds(&mut self) {
        let bounds = self.viewport.world_bounds();
        if self.world.set_bounds(bounds) {
            self.rejected_bounds = None;
        } else if self.rejected_bounds != Some(bounds) {
            warn!(
                ?bounds,
                kept = ?self.world.bounds(),
                "viewport bounds have no area, keeping previous"
            );
            self.rejected_bounds = Some(bounds);
        }
    }

    /// Start over regardless of phase.
    pub fn new_game(&mut self) {
        self.game.new_game(&mut self.world);
    }

    // -- accessors ----------------------------------------------------------

    /// Steps run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds, computed as `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt as f64
    }

    /// Seconds per fixed step.
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Seed the world RNG was built from.
    pub fn seed(&self) -> u64 {
        self.world.config().tick.seed
    }

    /// Current score.
    pub fn score(&self) -> u32 {
        self.game.score()
    }

    /// Remaining lives.
    pub fn lives(&self) -> i32 {
        self.game.lives()
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    /// HUD values.
    pub fn hud(&self) -> HudState {
        self.game.hud()
    }

    /// The world.
    pub fn world(&self) -> &World<P> {
        &self.world
    }

    /// Mutable world, for hosts and tests that place entities by hand.
    pub fn world_mut(&mut self) -> &mut World<P> {
        &mut self.world
    }

    /// The game state.
    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// The spawner.
    pub fn spawner(&self) -> &AsteroidSpawner {
        &self.spawner
    }

    /// Diagnostics from the last step.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// BLAKE3 hex digest of the observable state. Equal runs give equal
    /// digests; it is not a save format.
    pub fn state_hash(&self) -> String {
        digest::state_hash(self.tick_counter, &self.game, &self.spawner, &self.world)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
