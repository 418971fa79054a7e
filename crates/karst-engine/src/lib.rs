//! Karst Engine -- deterministic 2D platformer simulation core.
//!
//! This crate builds on [`karst_ecs`] to provide the simulation itself: a
//! fixed-timestep [`Simulation`](tick::Simulation) driving movement, physics
//! integration, the swept collision engine, damage and health bookkeeping,
//! and position integration, in a fixed order every tick.
//!
//! # Quick Start
//!
//! ```
//! use karst_engine::prelude::*;
//!
//! let mut sim = Simulation::new(TickConfig::default());
//! sim.set_bootstrap(Box::new(|world, rng| {
//!     karst_engine::level::demo_level(world, rng).unwrap();
//! }));
//!
//! sim.set_input(InputState { right: true, ..Default::default() });
//! sim.run_ticks(60);
//! assert_eq!(sim.tick_count(), 60);
//! ```

#![deny(unsafe_code)]

pub mod collision;
pub mod combat;
pub mod context;
pub mod legacy;
pub mod level;
pub mod movement;
pub mod physics;
pub mod position;
pub mod sweep;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use karst_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use karst_ecs::prelude::*;

    // Engine-specific exports.
    pub use crate::context::{
        Element, InputState, NullParticles, ParticleBurst, ParticleSink, RecordingParticles,
        TickContext, Viewport,
    };
    pub use crate::sweep::{ray_vs_rect, swept_rect, RayHit};
    pub use crate::tick::{Simulation, SystemFn, TickConfig};
}
