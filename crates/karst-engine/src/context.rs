//! Per-tick context handed to every system: timestep, input snapshot,
//! particle sink, and the seeded RNG.

use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// InputState
// ---------------------------------------------------------------------------

/// Snapshot of the control inputs for one tick.
///
/// The core never polls a device; the host samples whatever it wants
/// (keyboard, gamepad, replay file, AI policy) and hands the result in here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Held while the jump control is down; the movement system latches the
    /// release edge itself.
    pub jump_held: bool,
    pub climb_held: bool,
}

impl InputState {
    /// Horizontal axis in `{-1, 0, 1}` from the left/right holds.
    pub fn horizontal(&self) -> f32 {
        (self.right as i32 - self.left as i32) as f32
    }

    /// Vertical axis in `{-1, 0, 1}` from the up/down holds.
    pub fn vertical(&self) -> f32 {
        (self.up as i32 - self.down as i32) as f32
    }
}

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

/// Visual flavor tag for an emitted particle burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    /// Jump bursts.
    Aether,
    /// Ground-contact scuffs.
    Dust,
}

/// A request for a burst of particles at a world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleBurst {
    pub count: u32,
    pub x: f32,
    pub y: f32,
    pub element: Element,
    /// Lifetime in ticks, already rolled by the emitting system.
    pub lifetime: u32,
}

/// Receives particle bursts emitted by systems.
///
/// The core only decides *when* and *where* bursts happen; rendering them is
/// the host's problem. Headless runs plug in [`NullParticles`].
pub trait ParticleSink {
    fn emit(&mut self, burst: ParticleBurst);
}

/// Discards every burst.
#[derive(Debug, Default)]
pub struct NullParticles;

impl ParticleSink for NullParticles {
    fn emit(&mut self, _burst: ParticleBurst) {}
}

/// Records every burst, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingParticles {
    pub bursts: Vec<ParticleBurst>,
}

impl ParticleSink for RecordingParticles {
    fn emit(&mut self, burst: ParticleBurst) {
        self.bursts.push(burst);
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The host's camera window, for render-side culling queries.
///
/// The core never moves the camera; the host updates this and asks which
/// entities fall inside. Colliders partially inside still count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center_x: f32,
    pub center_y: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl Viewport {
    pub fn new(center_x: f32, center_y: f32, half_width: f32, half_height: f32) -> Self {
        Self {
            center_x,
            center_y,
            half_width,
            half_height,
        }
    }

    /// Whether a rectangle centered at `(x, y)` with full extents
    /// `width`/`height` overlaps the viewport.
    pub fn overlaps(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        (x - self.center_x).abs() <= self.half_width + width / 2.0
            && (y - self.center_y).abs() <= self.half_height + height / 2.0
    }

    /// Whether the point `(x, y)` lies inside the viewport.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.overlaps(x, y, 0.0, 0.0)
    }
}

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// Everything a system may read or use besides the world itself.
pub struct TickContext<'a> {
    /// Fixed timestep in seconds.
    pub dt: f32,
    /// The stage whose entities participate this tick (global entities
    /// always do).
    pub stage: u32,
    /// Control input sampled by the host for this tick.
    pub input: InputState,
    /// Sink for particle bursts.
    pub particles: &'a mut dyn ParticleSink,
    /// Seeded RNG; all in-simulation randomness goes through here so runs
    /// replay bit-identically.
    pub rng: &'a mut Pcg64,
}
