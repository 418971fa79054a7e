//! Fixed-timestep simulation driver.
//!
//! A [`Simulation`] runs the registered systems in a fixed order every tick,
//! then purges entities queued for destruction. Because system order is
//! fixed, arenas iterate in attach order, and every random draw goes through
//! one seeded RNG, two simulations built by the same calls and fed the same
//! inputs stay bit-identical for as long as they run.
//!
//! # Example
//!
//! ```
//! use karst_engine::tick::{Simulation, TickConfig};
//! use karst_ecs::prelude::*;
//!
//! let mut sim = Simulation::new(TickConfig::default());
//! let e = sim.world_mut().spawn(Scene::Global, "pebble");
//! sim.world_mut().attach(e, Position::new(0.0, 100.0)).unwrap();
//! sim.world_mut().attach(e, Physics::new(0.0, 2000.0)).unwrap();
//!
//! sim.run_ticks(10);
//! assert_eq!(sim.tick_count(), 10);
//! assert!(sim.world().get::<Position>(e).unwrap().y < 100.0);
//! ```

use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::debug;

use karst_ecs::world::World;

use crate::collision::collision_system;
use crate::combat::{damage_system, health_system};
use crate::context::{InputState, NullParticles, ParticleSink, TickContext};
use crate::movement::movement_system;
use crate::physics::physics_system;
use crate::position::position_system;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep driver.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Seconds per tick. Must be positive and finite.
    pub fixed_dt: f32,
    /// Seed for the simulation RNG.
    pub seed: u64,
}

impl Default for TickConfig {
    /// 60 Hz, seed zero.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// A system function run once per tick.
pub type SystemFn = fn(&mut World, &mut TickContext);

struct RegisteredSystem {
    name: String,
    func: SystemFn,
}

/// One-time world setup run at the start of the first tick.
pub type BootstrapFn = Box<dyn FnOnce(&mut World, &mut Pcg64)>;

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// The deterministic platformer simulation.
///
/// Construction installs the standard pipeline: movement, physics,
/// collision, damage, health, position. The order matters: movement shapes
/// velocities and climb state, physics applies ambient forces, collision
/// deflects, damage and health mark casualties, position integrates, and the
/// purge at the end of the tick removes everything queued along the way.
pub struct Simulation {
    world: World,
    systems: Vec<RegisteredSystem>,
    tick_counter: u64,
    fixed_dt: f32,
    active_stage: u32,
    input: InputState,
    particles: Box<dyn ParticleSink>,
    rng: Pcg64,
    bootstrap: Option<BootstrapFn>,
}

impl Simulation {
    /// A simulation with the standard system pipeline.
    pub fn new(config: TickConfig) -> Self {
        let mut sim = Self::bare(config);
        sim.add_system("movement", movement_system);
        sim.add_system("physics", physics_system);
        sim.add_system("collision", collision_system);
        sim.add_system("damage", damage_system);
        sim.add_system("health", health_system);
        sim.add_system("position", position_system);
        sim
    }

    /// A simulation with no systems registered, for hosts that compose their
    /// own pipeline.
    pub fn bare(config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            world: World::new(),
            systems: Vec::new(),
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            active_stage: 1,
            input: InputState::default(),
            particles: Box::new(NullParticles),
            rng: Pcg64::seed_from_u64(config.seed),
            bootstrap: None,
        }
    }

    /// Register a system; systems run in registration order.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
        });
    }

    /// Names of the registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Install world setup to run at the start of the first tick.
    pub fn set_bootstrap(&mut self, f: BootstrapFn) {
        self.bootstrap = Some(f);
    }

    /// Replace the particle sink (defaults to [`NullParticles`]).
    pub fn set_particle_sink(&mut self, sink: Box<dyn ParticleSink>) {
        self.particles = sink;
    }

    /// Set the control input the next ticks will see.
    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    /// Switch the active stage. Global entities keep simulating; staged
    /// entities freeze until their stage is active again.
    pub fn set_stage(&mut self, stage: u32) {
        self.active_stage = stage;
    }

    pub fn active_stage(&self) -> u32 {
        self.active_stage
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Execute one tick: bootstrap (first tick only), systems in order, then
    /// the destruction purge. Returns the number of entities purged.
    pub fn tick(&mut self) -> usize {
        self.tick_counter += 1;

        if self.tick_counter == 1 {
            if let Some(bootstrap) = self.bootstrap.take() {
                bootstrap(&mut self.world, &mut self.rng);
            }
        }

        let mut ctx = TickContext {
            dt: self.fixed_dt,
            stage: self.active_stage,
            input: self.input,
            particles: self.particles.as_mut(),
            rng: &mut self.rng,
        };
        for system in &self.systems {
            (system.func)(&mut self.world, &mut ctx);
        }

        let purged = self.world.purge_dead();
        if purged > 0 {
            debug!(tick = self.tick_counter, purged, "tick purge");
        }
        purged
    }

    /// Run `count` ticks; returns the total number of entities purged.
    pub fn run_ticks(&mut self, count: u64) -> usize {
        let mut purged = 0;
        for _ in 0..count {
            purged += self.tick();
        }
        purged
    }

    /// Ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Simulated seconds elapsed. Multiplies rather than accumulates, so no
    /// float drift over long runs.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt as f64
    }
}
