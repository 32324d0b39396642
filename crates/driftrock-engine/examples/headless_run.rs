//! Headless demo: an autopilot plays for a while, the run is recorded, and
//! the recording is replayed into a fresh simulation to check determinism.
//!
//! Run with: `cargo run --example headless_run -- [config.json] [seconds]`
//!
//! Set `RUST_LOG=debug` to watch entities come and go.

use std::f32::consts::TAU;

use anyhow::Context;
use driftrock_engine::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// Host side
// ---------------------------------------------------------------------------

/// Logs what a renderer would draw.
struct LogSink {
    last_hud: Option<HudState>,
}

impl RenderSink for LogSink {
    fn on_hud(&mut self, hud: HudState) {
        if self.last_hud != Some(hud) {
            info!(score = hud.score, lives = hud.lives, game_over = hud.game_over, "hud");
            self.last_hud = Some(hud);
        }
    }

    fn on_effect(&mut self, effect: Effect) {
        info!(kind = ?effect.kind, position = ?effect.position, "effect");
    }

    fn on_phase_change(&mut self, phase: GamePhase) {
        info!(?phase, "phase");
    }
}

/// Turn toward the nearest asteroid, fire when roughly facing it, and
/// restart after game over.
fn autopilot<P: PhysicsEngine>(sim: &Simulation<P>, tick: u64) -> InputSnapshot {
    if sim.phase() == GamePhase::GameOver {
        return InputSnapshot {
            restart: true,
            ..Default::default()
        };
    }
    let Some(ship) = sim.world().player() else {
        return InputSnapshot::default();
    };
    let target = sim
        .world()
        .entities()
        .filter(|e| e.tag() == EntityTag::Asteroid)
        .min_by(|a, b| {
            a.position
                .distance_squared(ship.position)
                .total_cmp(&b.position.distance_squared(ship.position))
        });
    let Some(target) = target else {
        return InputSnapshot {
            thrust: tick % 120 < 20,
            ..Default::default()
        };
    };

    let wanted = (target.position - ship.position).to_angle() - std::f32::consts::FRAC_PI_2;
    let error = (wanted - ship.rotation).rem_euclid(TAU);
    let turn_left = error > 0.05 && error < std::f32::consts::PI;
    let turn_right = error >= std::f32::consts::PI && error < TAU - 0.05;
    InputSnapshot {
        turn_left,
        turn_right,
        fire: !turn_left && !turn_right && tick % 15 == 0,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            GameConfig::from_json_str(&json).with_context(|| format!("parsing config {path}"))?
        }
        None => GameConfig::default(),
    };
    let seconds: f32 = match args.next() {
        Some(s) => s.parse().with_context(|| format!("bad duration {s:?}"))?,
        None => 30.0,
    };

    let mut sim = Simulation::new(
        config.clone(),
        PhysicsWorld::new(),
        Box::new(FixedViewport::default()),
        Box::new(LogSink { last_hud: None }),
    )?;
    let mut recorder = ReplayRecorder::for_simulation(&sim, 60);

    let ticks = (seconds / sim.fixed_dt()).ceil() as u64;
    let mut shots = 0usize;
    let mut peak_asteroids = 0usize;
    for tick in 0..ticks {
        let input = autopilot(&sim, tick);
        shots += usize::from(input.fire);
        recorder.record_step(&mut sim, &input)?;
        peak_asteroids = peak_asteroids.max(sim.last_diagnostics().asteroids);
    }
    info!(
        ticks = sim.tick_count(),
        sim_time = sim.sim_time(),
        score = sim.score(),
        lives = sim.lives(),
        shots,
        peak_asteroids,
        hash = %sim.state_hash(),
        "run finished"
    );

    let log = recorder.finish();
    let json = serde_json::to_string(&log).context("serializing replay log")?;
    info!(entries = log.entries.len(), bytes = json.len(), "replay recorded");

    let mut fresh = Simulation::with_rapier(config)?;
    let result = replay(&mut fresh, &log)?;
    match result.first_divergence {
        None => info!(ticks = result.ticks_replayed, "replay matched"),
        Some(divergence) => anyhow::bail!(
            "replay diverged at tick {}: expected {}, got {}",
            divergence.tick,
            divergence.expected_hash,
            divergence.actual_hash
        ),
    }
    Ok(())
}
