//! Types exchanged with the host application.
//!
//! The simulation never polls devices or draws anything. Each step it reads
//! an [`InputSnapshot`], asks a [`Viewport`] for the visible world rectangle,
//! and pushes HUD state and one-off effects into a [`RenderSink`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::game_state::GamePhase;

// ---------------------------------------------------------------------------
// InputSnapshot
// ---------------------------------------------------------------------------

/// Input state for one step.
///
/// `thrust`, `turn_left` and `turn_right` are levels (held keys); `fire` and
/// `restart` are edges (pressed this frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Thrust held.
    pub thrust: bool,
    /// Turn counter-clockwise held.
    pub turn_left: bool,
    /// Turn clockwise held.
    pub turn_right: bool,
    /// Fire pressed this frame.
    pub fire: bool,
    /// Restart pressed this frame. Only acted on during game over.
    pub restart: bool,
}

impl InputSnapshot {
    /// Whether nothing is pressed or held.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The same snapshot with the edge-triggered fields cleared.
    pub fn without_edges(&self) -> Self {
        Self {
            fire: false,
            restart: false,
            ..*self
        }
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Axis-aligned world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl Bounds {
    /// Build bounds from two corners in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Bounds centred on the origin.
    pub fn centered(half_extents: Vec2) -> Self {
        Self::from_corners(-half_extents, half_extents)
    }

    /// Whether the rectangle has positive, finite area.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmplt(self.max).all()
    }
}

/// Source of the visible world rectangle.
pub trait Viewport {
    /// World-space rectangle currently on screen.
    fn world_bounds(&self) -> Bounds;
}

/// A viewport that never moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedViewport(pub Bounds);

impl Viewport for FixedViewport {
    fn world_bounds(&self) -> Bounds {
        self.0
    }
}

impl Default for FixedViewport {
    /// A 16:9 camera with orthographic size 10.
    fn default() -> Self {
        Self(Bounds::centered(Vec2::new(17.78, 10.0)))
    }
}

// ---------------------------------------------------------------------------
// RenderSink
// ---------------------------------------------------------------------------

/// What the HUD shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudState {
    /// Current score.
    pub score: u32,
    /// Remaining lives.
    pub lives: i32,
    /// Whether the game-over overlay is visible.
    pub game_over: bool,
}

/// Kind of one-off visual effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// An asteroid was shot.
    AsteroidExplosion,
    /// The ship was destroyed.
    PlayerExplosion,
}

/// A one-off visual effect at a world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// What to play.
    pub kind: EffectKind,
    /// Where to play it.
    pub position: Vec2,
}

/// Receives presentation updates. Fire-and-forget; every method defaults to
/// doing nothing.
pub trait RenderSink {
    /// Called once per fixed step with the current HUD values.
    fn on_hud(&mut self, _hud: HudState) {}
    /// Called when something explodes.
    fn on_effect(&mut self, _effect: Effect) {}
    /// Called when the game phase changes.
    fn on_phase_change(&mut self, _phase: GamePhase) {}
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {}
