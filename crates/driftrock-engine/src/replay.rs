//! Deterministic replay with input recording and checkpoint verification.
//!
//! A [`ReplayRecorder`] writes down every non-empty [`InputSnapshot`] and a
//! periodic [`state_hash`](Simulation::state_hash) checkpoint. The resulting
//! [`ReplayLog`] is plain serde data. [`replay`] feeds the recorded inputs to
//! a freshly built [`Simulation`] with the same seed and fixed dt, and
//! reports the first checkpoint whose digest differs.
//!
//! # Recording
//!
//! ```
//! use driftrock_engine::prelude::*;
//!
//! let mut sim = Simulation::with_rapier(GameConfig::default()).unwrap();
//! let mut recorder = ReplayRecorder::for_simulation(&sim, 10);
//! let fire = InputSnapshot { fire: true, ..Default::default() };
//! recorder.record_step(&mut sim, &fire).unwrap();
//! for _ in 0..29 {
//!     recorder.record_step(&mut sim, &InputSnapshot::default()).unwrap();
//! }
//! let log = recorder.finish();
//! assert_eq!(log.total_ticks, 30);
//!
//! let mut fresh = Simulation::with_rapier(GameConfig::default()).unwrap();
//! let result = replay(&mut fresh, &log).unwrap();
//! assert!(result.completed);
//! assert!(result.first_divergence.is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::GameEvent;
use crate::host::InputSnapshot;
use crate::physics::PhysicsEngine;
use crate::tick::Simulation;

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// A recorded run: the parameters needed to rebuild it plus an ordered list
/// of inputs and checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    /// RNG seed of the recorded simulation.
    pub seed: u64,
    /// Fixed step of the recorded simulation, in seconds.
    pub fixed_dt: f32,
    /// Number of steps recorded. Replay runs exactly this many.
    pub total_ticks: u64,
    /// Inputs and checkpoints in recording order.
    pub entries: Vec<ReplayEntry>,
}

/// One entry in a [`ReplayLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// Input fed to the step that ran at `tick`. Ticks without an entry
    /// replay with an empty input.
    Input {
        /// Tick the input belongs to.
        tick: u64,
        /// The input.
        input: InputSnapshot,
    },
    /// Digest taken before the step at `tick` ran.
    Checkpoint {
        /// Tick the digest belongs to.
        tick: u64,
        /// BLAKE3 hex digest.
        state_hash: String,
    },
}

// ---------------------------------------------------------------------------
// Results and errors
// ---------------------------------------------------------------------------

/// Outcome of [`replay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Whether every recorded step ran and every checkpoint matched.
    pub completed: bool,
    /// Steps run before finishing or diverging.
    pub ticks_replayed: u64,
    /// The first checkpoint that did not match, if any.
    pub first_divergence: Option<ReplayDivergence>,
}

/// A checkpoint whose digest differs from the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    /// Tick of the checkpoint.
    pub tick: u64,
    /// Digest in the log.
    pub expected_hash: String,
    /// Digest computed during replay.
    pub actual_hash: String,
}

/// Problems with a log or the simulation it is replayed into. Every check
/// runs before the simulation is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ReplayError {
    /// Two input entries for one tick.
    #[error("replay log contains duplicate Input entry at tick {tick}")]
    DuplicateInput {
        /// The tick.
        tick: u64,
    },
    /// Two checkpoint entries for one tick.
    #[error("replay log contains duplicate Checkpoint entry at tick {tick}")]
    DuplicateCheckpoint {
        /// The tick.
        tick: u64,
    },
    /// An entry lies past the end of the recorded run.
    #[error("entry at tick {tick} lies outside the recorded {total_ticks} ticks")]
    TickOutOfRange {
        /// The entry's tick.
        tick: u64,
        /// The log's length.
        total_ticks: u64,
    },
    /// A tick so large the log length no longer fits in a `u64`.
    #[error("tick {tick} overflows the replay length")]
    TickOverflow {
        /// The tick offered.
        tick: u64,
    },
    /// Ticks handed to the recorder went backwards or repeated.
    #[error("tick {tick} recorded after tick {previous}")]
    OutOfOrder {
        /// The tick offered.
        tick: u64,
        /// The tick recorded before it.
        previous: u64,
    },
    /// The target simulation has already stepped.
    #[error("replay target has already run {tick_count} ticks")]
    NotFresh {
        /// Steps the target has run.
        tick_count: u64,
    },
    /// The target was built with another seed.
    #[error("seed mismatch: log recorded with {expected}, simulation uses {actual}")]
    SeedMismatch {
        /// Seed in the log.
        expected: u64,
        /// Seed of the target.
        actual: u64,
    },
    /// The target was built with another fixed dt.
    #[error("fixed dt mismatch: log recorded with {expected}, simulation uses {actual}")]
    DtMismatch {
        /// Fixed dt in the log.
        expected: f32,
        /// Fixed dt of the target.
        actual: f32,
    },
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Builds a [`ReplayLog`] one step at a time.
///
/// Call [`record_tick`](Self::record_tick) before each step, or let
/// [`record_step`](Self::record_step) do the recording and the stepping.
#[derive(Debug, Clone)]
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many ticks; 0 records one whenever a hash is
    /// offered.
    checkpoint_interval: u64,
    last_tick: Option<u64>,
}

impl ReplayRecorder {
    /// Start a log for a simulation built with `seed` and `fixed_dt`.
    pub fn new(seed: u64, fixed_dt: f32, checkpoint_interval: u64) -> Self {
        Self {
            log: ReplayLog {
                seed,
                fixed_dt,
                total_ticks: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            last_tick: None,
        }
    }

    /// Start a log matching `sim`'s seed and fixed dt.
    pub fn for_simulation<P: PhysicsEngine>(sim: &Simulation<P>, checkpoint_interval: u64) -> Self {
        Self::new(sim.seed(), sim.fixed_dt(), checkpoint_interval)
    }

    /// Record the input for `tick` and, if `state_hash` is given and the
    /// tick is on the interval, a checkpoint. Call before the step runs.
    pub fn record_tick(
        &mut self,
        tick: u64,
        input: &InputSnapshot,
        state_hash: Option<String>,
    ) -> Result<(), ReplayError> {
        if let Some(previous) = self.last_tick {
            if tick <= previous {
                return Err(ReplayError::OutOfOrder { tick, previous });
            }
        }
        let total_ticks = tick
            .checked_add(1)
            .ok_or(ReplayError::TickOverflow { tick })?;
        self.last_tick = Some(tick);
        self.log.total_ticks = total_ticks;

        if let Some(hash) = state_hash {
            let due = self.checkpoint_interval == 0 || tick % self.checkpoint_interval == 0;
            if due {
                self.log.entries.push(ReplayEntry::Checkpoint {
                    tick,
                    state_hash: hash,
                });
            }
        }
        if !input.is_empty() {
            self.log.entries.push(ReplayEntry::Input {
                tick,
                input: *input,
            });
        }
        Ok(())
    }

    /// Record the step `sim` is about to run, then run it.
    pub fn record_step<P: PhysicsEngine>(
        &mut self,
        sim: &mut Simulation<P>,
        input: &InputSnapshot,
    ) -> Result<Vec<GameEvent>, ReplayError> {
        let tick = sim.tick_count();
        let due = self.checkpoint_interval == 0 || tick % self.checkpoint_interval == 0;
        let hash = due.then(|| sim.state_hash());
        self.record_tick(tick, input, hash)?;
        Ok(sim.step(input))
    }

    /// Finish and return the log.
    pub fn finish(self) -> ReplayLog {
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Run `log` against a freshly constructed `sim` and compare checkpoints.
///
/// Stops at the first divergence. On error nothing has been stepped.
pub fn replay<P: PhysicsEngine>(
    sim: &mut Simulation<P>,
    log: &ReplayLog,
) -> Result<ReplayResult, ReplayError> {
    if sim.tick_count() != 0 {
        return Err(ReplayError::NotFresh {
            tick_count: sim.tick_count(),
        });
    }
    if sim.seed() != log.seed {
        return Err(ReplayError::SeedMismatch {
            expected: log.seed,
            actual: sim.seed(),
        });
    }
    if sim.fixed_dt() != log.fixed_dt {
        return Err(ReplayError::DtMismatch {
            expected: log.fixed_dt,
            actual: sim.fixed_dt(),
        });
    }

    let mut inputs: BTreeMap<u64, InputSnapshot> = BTreeMap::new();
    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();
    for entry in &log.entries {
        match entry {
            ReplayEntry::Input { tick, input } => {
                if *tick >= log.total_ticks {
                    return Err(ReplayError::TickOutOfRange {
                        tick: *tick,
                        total_ticks: log.total_ticks,
                    });
                }
                if inputs.insert(*tick, *input).is_some() {
                    return Err(ReplayError::DuplicateInput { tick: *tick });
                }
            }
            ReplayEntry::Checkpoint { tick, state_hash } => {
                if *tick >= log.total_ticks {
                    return Err(ReplayError::TickOutOfRange {
                        tick: *tick,
                        total_ticks: log.total_ticks,
                    });
                }
                if checkpoints.insert(*tick, state_hash.as_str()).is_some() {
                    return Err(ReplayError::DuplicateCheckpoint { tick: *tick });
                }
            }
        }
    }

    let mut ticks_replayed = 0;
    for tick in 0..log.total_ticks {
        if let Some(expected) = checkpoints.get(&tick) {
            let actual = sim.state_hash();
            if actual != *expected {
                warn!(tick, expected = *expected, actual = %actual, "replay diverged");
                return Ok(ReplayResult {
                    completed: false,
                    ticks_replayed,
                    first_divergence: Some(ReplayDivergence {
                        tick,
                        expected_hash: (*expected).to_owned(),
                        actual_hash: actual,
                    }),
                });
            }
        }
        let input = inputs.get(&tick).copied().unwrap_or_default();
        sim.step(&input);
        ticks_replayed += 1;
    }

    debug!(ticks_replayed, checkpoints = checkpoints.len(), "replay complete");
    Ok(ReplayResult {
        completed: true,
        ticks_replayed,
        first_divergence: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::host::{FixedViewport, NullSink};
    use crate::physics::ManualPhysics;

    fn sim(seed: u64) -> Simulation<ManualPhysics> {
        let mut config = GameConfig::default();
        config.tick.seed = seed;
        Simulation::new(
            config,
            ManualPhysics::new(),
            Box::new(FixedViewport::default()),
            Box::new(NullSink),
        )
        .unwrap()
    }

    fn script(tick: u64) -> InputSnapshot {
        InputSnapshot {
            thrust: tick % 7 < 3,
            turn_left: tick % 11 < 4,
            fire: tick % 13 == 0,
            ..Default::default()
        }
    }

    fn record(ticks: u64) -> ReplayLog {
        let mut s = sim(42);
        let mut recorder = ReplayRecorder::for_simulation(&s, 25);
        for tick in 0..ticks {
            recorder.record_step(&mut s, &script(tick)).unwrap();
        }
        recorder.finish()
    }

    #[test]
    fn recorder_skips_empty_inputs() {
        let mut recorder = ReplayRecorder::new(0, 0.02, 0);
        recorder
            .record_tick(0, &InputSnapshot::default(), None)
            .unwrap();
        recorder
            .record_tick(1, &script(0), Some("h".to_owned()))
            .unwrap();
        let log = recorder.finish();
        assert_eq!(log.total_ticks, 2);
        assert_eq!(log.entries.len(), 2);
    }

    #[test]
    fn recorder_rejects_out_of_order_ticks() {
        let mut recorder = ReplayRecorder::new(0, 0.02, 0);
        recorder.record_tick(3, &script(0), None).unwrap();
        assert_eq!(
            recorder.record_tick(3, &script(0), None),
            Err(ReplayError::OutOfOrder {
                tick: 3,
                previous: 3
            })
        );
    }

    #[test]
    fn recorder_rejects_overflowing_tick() {
        let mut recorder = ReplayRecorder::new(0, 0.02, 0);
        assert_eq!(
            recorder.record_tick(u64::MAX, &script(0), None),
            Err(ReplayError::TickOverflow { tick: u64::MAX })
        );
    }

    #[test]
    fn same_seed_replays_without_divergence() {
        let log = record(200);
        assert_eq!(log.total_ticks, 200);
        let result = replay(&mut sim(42), &log).unwrap();
        assert!(result.completed);
        assert_eq!(result.ticks_replayed, 200);
        assert_eq!(result.first_divergence, None);
    }

    #[test]
    fn tampered_checkpoint_is_reported() {
        let mut log = record(100);
        for entry in &mut log.entries {
            if let ReplayEntry::Checkpoint { tick: 50, state_hash } = entry {
                *state_hash = "0".repeat(64);
            }
        }
        let result = replay(&mut sim(42), &log).unwrap();
        assert!(!result.completed);
        assert_eq!(result.ticks_replayed, 50);
        assert_eq!(result.first_divergence.unwrap().tick, 50);
    }

    #[test]
    fn validation_runs_before_stepping() {
        let log = record(10);

        let mut stepped = sim(42);
        stepped.step(&InputSnapshot::default());
        assert_eq!(
            replay(&mut stepped, &log),
            Err(ReplayError::NotFresh { tick_count: 1 })
        );

        let mut other_seed = sim(7);
        assert!(matches!(
            replay(&mut other_seed, &log),
            Err(ReplayError::SeedMismatch { .. })
        ));
        assert_eq!(other_seed.tick_count(), 0);

        let mut duplicated = log.clone();
        duplicated.entries.push(duplicated.entries[0].clone());
        let mut fresh = sim(42);
        assert!(replay(&mut fresh, &duplicated).is_err());
        assert_eq!(fresh.tick_count(), 0);

        let mut overrun = log;
        overrun.entries.push(ReplayEntry::Input {
            tick: 10,
            input: script(0),
        });
        assert_eq!(
            replay(&mut sim(42), &overrun),
            Err(ReplayError::TickOutOfRange {
                tick: 10,
                total_ticks: 10
            })
        );
    }

    #[test]
    fn log_survives_json() {
        let log = record(30);
        let json = serde_json::to_string(&log).unwrap();
        let back: ReplayLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
    }
}
