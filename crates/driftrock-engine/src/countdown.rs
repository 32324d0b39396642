//! Fixed-step timers that end on the right step.
//!
//! Subtracting an `f32` step from a timer every tick drifts: after a few
//! thousand steps the remainder can be most of a step off, so a timer that
//! should end on an exact step boundary ends one step late or early. A
//! [`Countdown`] sums elapsed time in `f64` instead and compares it against
//! its duration once per step.

use serde::{Deserialize, Serialize};

/// Fraction of a step by which the elapsed time may fall short of the
/// duration and still count as elapsed. Covers the representation error of
/// an `f32` step (at most one part in 2^24 per step).
const STEP_SLACK: f64 = 1e-3;

/// A timer that ends on the first step at which the summed steps reach its
/// duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    duration: f32,
    elapsed: f64,
    remaining: f32,
}

impl Countdown {
    /// A timer of `duration` seconds. Negative and non-finite durations end
    /// on the first step.
    pub fn new(duration: f32) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            duration,
            elapsed: 0.0,
            remaining: duration,
        }
    }

    /// Count one step of `dt` seconds. Returns `true` once the timer has
    /// run out, on that step and every later one.
    pub fn tick(&mut self, dt: f32) -> bool {
        let dt = f64::from(dt);
        self.elapsed += dt;
        let left = f64::from(self.duration) - self.elapsed;
        if left <= STEP_SLACK * dt {
            self.remaining = 0.0;
            true
        } else {
            self.remaining = left as f32;
            false
        }
    }

    /// Seconds left as of the last [`tick`](Self::tick).
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Whether the timer has run out.
    pub fn is_done(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Seconds counted so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Length the timer was started with.
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps_until_done(duration: f32, dt: f32) -> u32 {
        let mut c = Countdown::new(duration);
        let mut n = 0;
        loop {
            n += 1;
            if c.tick(dt) {
                return n;
            }
            assert!(n < 1_000_000, "never finished");
        }
    }

    #[test]
    fn ends_on_exact_step_boundary() {
        assert_eq!(steps_until_done(3.0, 0.02), 150);
        assert_eq!(steps_until_done(3.0, 1.0 / 60.0), 180);
        assert_eq!(steps_until_done(1.0, 0.01), 100);
    }

    #[test]
    fn long_timers_do_not_drift() {
        // f32 subtraction is most of a step off by here.
        assert_eq!(steps_until_done(60.0, 0.005), 12_000);
        assert_eq!(steps_until_done(30.0, 0.02), 1_500);
        assert_eq!(steps_until_done(60.0, 1.0 / 120.0), 7_200);
    }

    #[test]
    fn partial_step_rounds_up() {
        assert_eq!(steps_until_done(3.01, 0.02), 151);
        assert_eq!(steps_until_done(0.001, 0.02), 1);
    }

    #[test]
    fn uneven_steps_add_up() {
        let mut c = Countdown::new(3.0);
        assert!(!c.tick(2.5));
        assert_eq!(c.remaining(), 0.5);
        assert!(c.tick(0.5));
    }

    #[test]
    fn zero_and_bad_durations_end_on_first_step() {
        assert_eq!(steps_until_done(0.0, 0.02), 1);
        assert_eq!(steps_until_done(-1.0, 0.02), 1);
        assert_eq!(steps_until_done(f32::NAN, 0.02), 1);
    }

    #[test]
    fn remaining_tracks_elapsed_steps() {
        let mut c = Countdown::new(1.0);
        assert_eq!(c.remaining(), 1.0);
        assert!(!c.is_done());
        c.tick(0.25);
        assert_eq!(c.remaining(), 0.75);
        c.tick(0.25);
        c.tick(0.25);
        assert!(c.tick(0.25));
        assert!(c.is_done());
        assert_eq!(c.remaining(), 0.0);
        assert_eq!(c.elapsed(), 1.0);
        assert!(c.tick(0.25), "stays done");
    }
}
