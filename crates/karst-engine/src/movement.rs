//! Player/actor locomotion: walking, jumping with coyote time and variable
//! height, and ladder climbing.
//!
//! Runs first in the tick so the physics system sees up-to-date climb and
//! jump state, and the collision engine sees the velocities the actor wants.

use rand::Rng;

use karst_ecs::component::{Collider, Health, Movement, Physics, Position};
use karst_ecs::world::World;

use crate::context::{Element, ParticleBurst, TickContext};

/// Launch impulse per unit of `max_jump_height`.
const JUMP_IMPULSE: f32 = 250.0;
/// Gravity scale while a held jump is still rising.
const HELD_JUMP_GRAVITY: f32 = 0.6;
/// Falling faster than this forfeits full air control.
const AIR_CONTROL_SPEED: f32 = 100.0;

/// Apply one tick of control input to every participating actor.
pub fn movement_system(world: &mut World, ctx: &mut TickContext) {
    let dt = ctx.dt;
    let input = ctx.input;

    for slot in 0..world.movements.len() {
        let Some(entity) = world.movements.entity_at(slot) else {
            continue;
        };
        if !world.participates(entity, ctx.stage) {
            continue;
        }
        // Attaching a movement commits the entity to the full platformer kit;
        // a missing companion is a content bug and should surface loudly.
        let Some(pos) = world.get::<Position>(entity) else {
            panic!("movement actor {entity} has no position component");
        };
        let (pos_x, pos_y) = (pos.x, pos.y);
        let Some(col) = world.get::<Collider>(entity) else {
            panic!("movement actor {entity} has no collider component");
        };
        let (on_platform, col_height, col_offset_y) = (col.on_platform, col.height, col.offset_y);
        let Some(health) = world.get::<Health>(entity) else {
            panic!("movement actor {entity} has no health component");
        };
        if health.dead {
            continue;
        }
        let Some(mut phys) = world.get::<Physics>(entity).cloned() else {
            panic!("movement actor {entity} has no physics component");
        };
        let Some(mut mv) = world.get::<Movement>(entity).cloned() else {
            continue;
        };

        // Drop off the climb when the grip is released or the collider has
        // left the climbable band.
        let bottom = pos_y - col_height / 2.0 + col_offset_y;
        let top = pos_y + col_height / 2.0 + col_offset_y;
        if mv.climbing
            && (!mv.should_climb || bottom > mv.max_climb_height || top < mv.min_climb_height)
        {
            mv.climbing = false;
        }

        if on_platform {
            mv.jumping = false;
            mv.jumps = 0;
            mv.coyote_time = 0.0;
        } else if mv.climbing {
            mv.jumping = false;
        }

        mv.should_climb = input.climb_held && mv.can_climb;

        if mv.coyote_time < mv.max_coyote_time && !on_platform {
            mv.coyote_time += dt;
        }

        if !input.jump_held && !mv.released_jump {
            mv.released_jump = true;
        }

        let can_jump = input.jump_held
            && mv.can_move
            && mv.released_jump
            && (on_platform
                || mv.coyote_time < mv.max_coyote_time
                || (!on_platform && mv.max_jumps > 1 && mv.jumps < mv.max_jumps));

        if can_jump {
            // A first jump taken after coyote time ran out was really a fall;
            // it costs the ground jump too.
            if !on_platform && mv.jumps == 0 && mv.coyote_time > mv.max_coyote_time {
                mv.jumps += 2;
            } else {
                mv.jumps += 1;
            }

            if phys.velocity_y < 0.0 {
                phys.velocity_y = 0.0;
            }

            ctx.particles.emit(ParticleBurst {
                count: 25,
                x: pos_x,
                y: pos_y,
                element: Element::Aether,
                lifetime: ctx.rng.gen_range(1..=40),
            });

            mv.released_jump = false;
            mv.coyote_time = mv.max_coyote_time;
            mv.can_move = true;
            mv.jumping = true;
            mv.preparing_to_jump = false;
            mv.should_climb = false;
            phys.velocity_y += JUMP_IMPULSE * mv.max_jump_height;
        }

        // Holding the jump through the rise floats a little longer.
        if !mv.released_jump && mv.jumping && phys.velocity_y > 0.0 {
            phys.gravity_mod = phys.base_gravity_mod * HELD_JUMP_GRAVITY;
        } else {
            phys.gravity_mod = phys.base_gravity_mod;
        }

        if input.up && mv.can_move && mv.climbing {
            if phys.velocity_y < mv.max_speed {
                phys.velocity_y += mv.acceleration * dt;
            }
        } else if input.down && mv.can_move && mv.climbing && phys.velocity_y > -mv.max_speed {
            phys.velocity_y -= mv.acceleration * dt;
        }

        if input.right && mv.can_move && !mv.climbing {
            if phys.velocity_x < mv.max_speed {
                kick_up_dust(ctx, &phys, on_platform, pos_x, pos_y);
                phys.velocity_x += mv.acceleration * dt * control_mod(&mv, &phys, on_platform);
            }
        } else if input.left && mv.can_move && !mv.climbing && phys.velocity_x > -mv.max_speed {
            kick_up_dust(ctx, &phys, on_platform, pos_x, pos_y);
            phys.velocity_x -= mv.acceleration * dt * control_mod(&mv, &phys, on_platform);
        }

        if let Some(slot) = world.get_mut::<Movement>(entity) {
            *slot = mv;
        }
        if let Some(slot) = world.get_mut::<Physics>(entity) {
            *slot = phys;
        }
    }
}

/// Ground acceleration scale: full on the ground, `air_control` mid-jump or
/// in fast vertical motion.
fn control_mod(mv: &Movement, phys: &Physics, on_platform: bool) -> f32 {
    if mv.jumping || (!on_platform && phys.velocity_y.abs() > AIR_CONTROL_SPEED) {
        mv.air_control
    } else {
        1.0
    }
}

/// Scuff burst when accelerating from a standstill on the ground.
fn kick_up_dust(ctx: &mut TickContext, phys: &Physics, on_platform: bool, x: f32, y: f32) {
    if phys.velocity_x.abs() < 0.5 && on_platform {
        ctx.particles.emit(ParticleBurst {
            count: 10,
            x,
            y: y - 30.0,
            element: Element::Dust,
            lifetime: ctx.rng.gen_range(1..=10),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InputState, RecordingParticles};
    use karst_ecs::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn actor(world: &mut World) -> EntityId {
        let e = world.spawn(Scene::Global, "actor");
        world.attach(e, Position::new(0.0, 100.0)).unwrap();
        world.attach(e, Physics::new(5000.0, 2000.0)).unwrap();
        world
            .attach(e, Collider::body(40.0, 120.0, EntityClass::Player))
            .unwrap();
        world.attach(e, Health::new(100.0)).unwrap();
        world.attach(e, Movement::new(6000.0, 1000.0, 2.5)).unwrap();
        e
    }

    fn run(world: &mut World, input: InputState, sink: &mut RecordingParticles) {
        let mut rng = Pcg64::seed_from_u64(99);
        let mut ctx = TickContext {
            dt: 1.0 / 60.0,
            stage: 1,
            input,
            particles: sink,
            rng: &mut rng,
        };
        movement_system(world, &mut ctx);
    }

    fn ground(world: &mut World, e: EntityId) {
        world.get_mut::<Collider>(e).unwrap().on_platform = true;
    }

    #[test]
    fn grounded_jump_launches_upward() {
        let mut world = World::new();
        let e = actor(&mut world);
        ground(&mut world, e);

        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                jump_held: true,
                ..Default::default()
            },
            &mut sink,
        );

        let phys = world.get::<Physics>(e).unwrap();
        assert_eq!(phys.velocity_y, 250.0 * 2.5);
        let mv = world.get::<Movement>(e).unwrap();
        assert!(mv.jumping);
        assert_eq!(mv.jumps, 1);
        assert!(!mv.released_jump);
        // Jump burst emitted.
        assert_eq!(sink.bursts.len(), 1);
        assert_eq!(sink.bursts[0].element, Element::Aether);
        assert_eq!(sink.bursts[0].count, 25);
    }

    #[test]
    fn held_jump_does_not_autorepeat() {
        let mut world = World::new();
        let e = actor(&mut world);
        ground(&mut world, e);
        let input = InputState {
            jump_held: true,
            ..Default::default()
        };

        let mut sink = RecordingParticles::default();
        run(&mut world, input, &mut sink);
        let vy_after_first = world.get::<Physics>(e).unwrap().velocity_y;

        // Airborne next tick, button still held: the release latch blocks a
        // second launch.
        world.get_mut::<Collider>(e).unwrap().on_platform = false;
        run(&mut world, input, &mut sink);
        let mv = world.get::<Movement>(e).unwrap();
        assert_eq!(mv.jumps, 1);
        assert_eq!(world.get::<Physics>(e).unwrap().velocity_y, vy_after_first);
    }

    #[test]
    fn double_jump_after_release() {
        let mut world = World::new();
        let e = actor(&mut world);
        ground(&mut world, e);
        let jump = InputState {
            jump_held: true,
            ..Default::default()
        };

        let mut sink = RecordingParticles::default();
        run(&mut world, jump, &mut sink);
        world.get_mut::<Collider>(e).unwrap().on_platform = false;
        run(&mut world, InputState::default(), &mut sink); // release
        run(&mut world, jump, &mut sink); // airborne second jump

        assert_eq!(world.get::<Movement>(e).unwrap().jumps, 2);
    }

    #[test]
    fn coyote_jump_shortly_after_walkoff() {
        let mut world = World::new();
        let e = actor(&mut world);
        // Airborne, but coyote_time still zero: walked off this tick.
        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                jump_held: true,
                ..Default::default()
            },
            &mut sink,
        );
        let mv = world.get::<Movement>(e).unwrap();
        assert!(mv.jumping);
        assert_eq!(mv.jumps, 1);
    }

    #[test]
    fn late_airborne_jump_spends_both_jumps() {
        let mut world = World::new();
        let e = actor(&mut world);
        // Coyote time long expired: this actor has been falling a while.
        world.get_mut::<Movement>(e).unwrap().coyote_time = 0.5;

        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                jump_held: true,
                ..Default::default()
            },
            &mut sink,
        );
        assert_eq!(world.get::<Movement>(e).unwrap().jumps, 2);
    }

    #[test]
    fn held_rising_jump_softens_gravity() {
        let mut world = World::new();
        let e = actor(&mut world);
        ground(&mut world, e);
        let jump = InputState {
            jump_held: true,
            ..Default::default()
        };
        let mut sink = RecordingParticles::default();
        run(&mut world, jump, &mut sink);

        let phys = world.get::<Physics>(e).unwrap();
        assert_eq!(phys.gravity_mod, phys.base_gravity_mod * 0.6);

        // Released: gravity restores even while still rising.
        world.get_mut::<Collider>(e).unwrap().on_platform = false;
        run(&mut world, InputState::default(), &mut sink);
        let phys = world.get::<Physics>(e).unwrap();
        assert_eq!(phys.gravity_mod, phys.base_gravity_mod);
    }

    #[test]
    fn walking_from_standstill_kicks_dust() {
        let mut world = World::new();
        let e = actor(&mut world);
        ground(&mut world, e);

        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                right: true,
                ..Default::default()
            },
            &mut sink,
        );

        assert!(world.get::<Physics>(e).unwrap().velocity_x > 0.0);
        assert_eq!(sink.bursts.len(), 1);
        assert_eq!(sink.bursts[0].element, Element::Dust);
        assert_eq!(sink.bursts[0].y, 70.0);
    }

    #[test]
    fn air_control_limits_acceleration() {
        let mut world = World::new();
        let e = actor(&mut world);
        world.get_mut::<Physics>(e).unwrap().velocity_y = -500.0;

        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                right: true,
                ..Default::default()
            },
            &mut sink,
        );

        let vx = world.get::<Physics>(e).unwrap().velocity_x;
        let full = 6000.0 / 60.0;
        assert!((vx - full * 0.5).abs() < 1e-3, "expected halved accel, got {vx}");
    }

    #[test]
    fn climbing_moves_vertically_and_blocks_walking() {
        let mut world = World::new();
        let e = actor(&mut world);
        {
            let mv = world.get_mut::<Movement>(e).unwrap();
            mv.climbing = true;
            mv.should_climb = true;
            mv.min_climb_height = -1000.0;
            mv.max_climb_height = 1000.0;
        }

        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                up: true,
                right: true,
                climb_held: true,
                ..Default::default()
            },
            &mut sink,
        );

        let phys = world.get::<Physics>(e).unwrap();
        assert!(phys.velocity_y > 0.0);
        assert_eq!(phys.velocity_x, 0.0);
        assert!(world.get::<Movement>(e).unwrap().climbing);
    }

    #[test]
    fn climb_ends_above_the_band() {
        let mut world = World::new();
        let e = actor(&mut world);
        {
            let mv = world.get_mut::<Movement>(e).unwrap();
            mv.climbing = true;
            mv.should_climb = true;
            mv.min_climb_height = 0.0;
            mv.max_climb_height = 90.0; // actor bottom is at 40
        }

        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                climb_held: true,
                ..Default::default()
            },
            &mut sink,
        );
        // bottom (40) <= 90 keeps the climb...
        assert!(world.get::<Movement>(e).unwrap().climbing);

        world.get_mut::<Movement>(e).unwrap().max_climb_height = 30.0;
        run(
            &mut world,
            InputState {
                climb_held: true,
                ..Default::default()
            },
            &mut sink,
        );
        // ...but past the top of the band it drops.
        assert!(!world.get::<Movement>(e).unwrap().climbing);
    }

    #[test]
    fn dead_actor_ignores_input() {
        let mut world = World::new();
        let e = actor(&mut world);
        ground(&mut world, e);
        world.get_mut::<Health>(e).unwrap().dead = true;

        let mut sink = RecordingParticles::default();
        run(
            &mut world,
            InputState {
                jump_held: true,
                right: true,
                ..Default::default()
            },
            &mut sink,
        );

        assert_eq!(world.get::<Physics>(e).unwrap().velocity_y, 0.0);
        assert_eq!(world.get::<Physics>(e).unwrap().velocity_x, 0.0);
        assert!(sink.bursts.is_empty());
    }

    #[test]
    #[should_panic(expected = "no health component")]
    fn movement_without_health_is_a_contract_violation() {
        let mut world = World::new();
        let e = world.spawn(Scene::Global, "incomplete");
        world.attach(e, Position::new(0.0, 100.0)).unwrap();
        world.attach(e, Physics::new(5000.0, 2000.0)).unwrap();
        world
            .attach(e, Collider::body(40.0, 120.0, EntityClass::Player))
            .unwrap();
        world.attach(e, Movement::new(6000.0, 1000.0, 2.5)).unwrap();

        let mut sink = RecordingParticles::default();
        run(&mut world, InputState::default(), &mut sink);
    }
}
