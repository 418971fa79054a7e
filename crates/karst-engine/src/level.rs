//! Seeded demo level: a player, a floor strip, and scattered platforms.
//!
//! Intended as a [`Simulation`](crate::tick::Simulation) bootstrap and as a
//! realistic workload for tests and benchmarks. All randomness comes from
//! the provided RNG, so the same seed always builds the same level.

use rand::Rng;
use rand_pcg::Pcg64;

use karst_ecs::prelude::*;

/// Number of randomly scattered platforms.
const SCATTERED_PLATFORMS: usize = 25;
/// Number of segments in the ground strip.
const FLOOR_SEGMENTS: usize = 50;

/// Build the demo level. Returns the player entity.
pub fn demo_level(world: &mut World, rng: &mut Pcg64) -> Result<EntityId, EcsError> {
    let player = world.spawn(Scene::Global, "the player");
    world.attach(player, Position::new(0.0, 100.0))?;
    world.attach(player, Physics::new(5000.0, 2000.0))?;
    world.attach(player, Collider::body(40.0, 120.0, EntityClass::Player))?;
    let mut mv = Movement::new(6000.0, 1000.0, 2.5);
    mv.max_coyote_time = 0.5;
    world.attach(player, mv)?;
    world.attach(player, Health::new(1000.0))?;

    for _ in 0..SCATTERED_PLATFORMS {
        let width = rng.gen_range(300.0..1300.0);
        let height = rng.gen_range(300.0..1300.0);
        let x = rng.gen_range(0.0..5000.0);
        let y = rng.gen_range(0.0..5000.0);
        spawn_platform(world, x, y, width, height)?;
    }

    for i in 0..FLOOR_SEGMENTS {
        spawn_platform(world, i as f32 * 500.0, -200.0, 540.0, 80.0)?;
    }

    Ok(player)
}

fn spawn_platform(
    world: &mut World,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Result<(), EcsError> {
    let e = world.spawn(Scene::Global, "floor");
    world.attach(e, Position::fixed(x, y))?;
    world.attach(e, Physics::new(0.1, 0.0))?;
    world.attach(e, Collider::climbable_platform(width, height))?;
    Ok(())
}
