//! The collision engine: swept narrow phase, time-of-impact ordering,
//! contact response, and damage-trigger interactions.
//!
//! Every active collider A sweeps against every other collider B. Triggers
//! only detect (and run the damage exchange); solid movers record hits,
//! sort them by time of impact, and resolve earliest-first, re-validating
//! each hit against the state left behind by the previous resolution.

use std::cmp::Ordering;

use glam::Vec2;
use tracing::debug;

use karst_ecs::component::{Collider, Damage, Health, Movement, Physics, Position};
use karst_ecs::entity::EntityId;
use karst_ecs::world::World;

use crate::context::TickContext;
use crate::sweep::{swept_rect, RayHit};

/// Run the collision pass for one tick.
pub fn collision_system(world: &mut World, ctx: &mut TickContext) {
    let dt = ctx.dt;
    let entities = world.colliders.entities();

    for &a in &entities {
        let Some(col_a) = world.get::<Collider>(a) else {
            continue;
        };
        if !col_a.active || !world.participates(a, ctx.stage) {
            continue;
        }
        let (a_trigger, a_platform) = (col_a.trigger, col_a.platform);

        // Transient contact state is rebuilt from scratch every tick.
        if let Some(col_a) = world.get_mut::<Collider>(a) {
            col_a.on_platform = false;
            col_a.collided_this_tick = false;
        }

        // The sweep needs a velocity; bodies without physics cannot initiate
        // contact (they can still be swept against as B).
        if !world.physics.contains(a) {
            continue;
        }

        if a_trigger {
            for &b in &entities {
                if b != a {
                    trigger_exchange(world, a, b, dt);
                }
            }
        } else if !a_platform {
            let mut hits: Vec<(EntityId, f32)> = Vec::new();
            for &b in &entities {
                if b == a {
                    continue;
                }
                if let Some(hit) = sweep_pair(world, a, b, dt) {
                    if let Some(col_a) = world.get_mut::<Collider>(a) {
                        col_a.collided_this_tick = true;
                    }
                    if let Some(col_b) = world.get_mut::<Collider>(b) {
                        col_b.collided_this_tick = true;
                    }
                    hits.push((b, hit.time));
                }
            }

            // Earliest impact first; stable, so ties keep iteration order.
            hits.sort_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(Ordering::Equal));

            for (b, _) in hits {
                resolve_contact(world, a, b, dt);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Narrow phase
// ---------------------------------------------------------------------------

/// Swept test of mover `a` against obstacle `b` in their current state.
///
/// Mirrors the engine's contact convention: the ray starts at A's raw
/// position, the target is B's collider rectangle inflated by A's extents.
/// Static-vs-static pairs are excluded outright.
fn sweep_pair(world: &World, a: EntityId, b: EntityId, dt: f32) -> Option<RayHit> {
    let col_a = world.get::<Collider>(a)?;
    let col_b = world.get::<Collider>(b)?;
    let pos_a = world.get::<Position>(a)?;
    let pos_b = world.get::<Position>(b)?;
    if pos_a.is_static && pos_b.is_static {
        return None;
    }
    let phys_a = world.get::<Physics>(a)?;

    swept_rect(
        Vec2::new(pos_a.x, pos_a.y),
        Vec2::new(col_a.width, col_a.height),
        phys_a.velocity(),
        dt,
        col_b.center(pos_b),
        Vec2::new(col_b.width, col_b.height),
    )
}

// ---------------------------------------------------------------------------
// Trigger pass
// ---------------------------------------------------------------------------

/// Overlap test between trigger `a` and collider `b`, followed by the damage
/// exchange. The exchange runs for whichever side is a damaging trigger;
/// the two directions are independent, not mutually exclusive.
fn trigger_exchange(world: &mut World, a: EntityId, b: EntityId, dt: f32) {
    if sweep_pair(world, a, b, dt).is_none() {
        return;
    }

    let a_damages = world
        .get::<Collider>(a)
        .is_some_and(|c| c.trigger && c.does_damage);
    if a_damages {
        apply_trigger_damage(world, a, b, dt);
    }

    let b_damages = world
        .get::<Collider>(b)
        .is_some_and(|c| c.trigger && c.does_damage);
    if b_damages {
        apply_trigger_damage(world, b, a, dt);
    }
}

/// One direction of the damage exchange: `source` hits `target`.
///
/// Every hit consumes a use, even a class mismatch; damage itself only lands
/// when the target accepts damage and its class is among the source's
/// targets. Exhausted sources deactivate their collider and, unless marked
/// to persist visually, queue their entity for destruction.
///
/// # Panics
///
/// A damaging trigger without a [`Damage`] component, or a damage-accepting
/// collider without a [`Health`] component, is a malformed entity; both
/// panic rather than silently skipping the hit.
fn apply_trigger_damage(world: &mut World, source: EntityId, target: EntityId, dt: f32) {
    let (target_takes, target_class) = match world.get::<Collider>(target) {
        Some(col) => (col.takes_damage, col.class),
        None => return,
    };

    let Some(dmg) = world.get::<Damage>(source) else {
        panic!("damaging trigger {source} has no damage component");
    };
    let amount = dmg.damage;
    let class_hit = target_takes && dmg.hits(target_class);

    if class_hit {
        let Some(health) = world.get_mut::<Health>(target) else {
            panic!("damage-accepting collider {target} has no health component");
        };
        health.health -= amount;
        debug!(source = %source, target = %target, amount, "trigger damage");
    }

    let (exhausted, show_after_uses) = {
        let dmg = match world.get_mut::<Damage>(source) {
            Some(dmg) => dmg,
            None => return,
        };
        if let Some(uses) = dmg.uses.as_mut() {
            *uses -= 1;
        }
        if let Some(lifetime) = dmg.lifetime.as_mut() {
            *lifetime -= dt;
        }
        (dmg.uses.is_some_and(|u| u <= 0), dmg.show_after_uses)
    };

    if exhausted {
        if let Some(col) = world.get_mut::<Collider>(source) {
            col.active = false;
        }
        if !show_after_uses {
            world.queue_dead(source);
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve one ordered contact of `a` against `b`.
///
/// The sweep is re-run against the current state first: an earlier
/// resolution in the same pass may already have deflected A clear of B, in
/// which case this contact is void.
fn resolve_contact(world: &mut World, a: EntityId, b: EntityId, dt: f32) {
    let Some(hit) = sweep_pair(world, a, b, dt) else {
        return;
    };

    // Cancel the penetrating portion of the motion: push back along the
    // contact normal by the speed that remains after the impact time.
    if let Some(phys_a) = world.get_mut::<Physics>(a) {
        let deflect = hit.normal
            * Vec2::new(phys_a.velocity_x.abs(), phys_a.velocity_y.abs())
            * (1.0 - hit.time);
        phys_a.velocity_x += deflect.x;
        phys_a.velocity_y += deflect.y;
    }

    let (b_platform, b_climbable, b_y, b_height) = match world.get::<Collider>(b) {
        Some(col_b) => {
            let b_y = world.get::<Position>(b).map(|p| p.y).unwrap_or(0.0);
            (col_b.platform, col_b.climbable, b_y, col_b.height)
        }
        None => return,
    };

    if b_platform && hit.normal.y == 1.0 {
        if let Some(col_a) = world.get_mut::<Collider>(a) {
            col_a.on_platform = true;
        }
    }

    if b_climbable && hit.normal.x != 0.0 {
        let wants_climb = world
            .get::<Movement>(a)
            .is_some_and(|m| m.can_climb && m.should_climb);
        if wants_climb {
            let first_grab = world.get::<Movement>(a).is_some_and(|m| !m.climbing);
            if first_grab {
                // Grabbing on kills all momentum and captures the climb band.
                if let Some(phys_a) = world.get_mut::<Physics>(a) {
                    phys_a.velocity_x = 0.0;
                    phys_a.velocity_y = 0.0;
                }
                if let Some(move_a) = world.get_mut::<Movement>(a) {
                    move_a.max_climb_height = b_y + b_height / 2.0;
                    move_a.min_climb_height = b_y - b_height / 2.0;
                }
            }
            if let Some(move_a) = world.get_mut::<Movement>(a) {
                move_a.climbing = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InputState, NullParticles};
    use karst_ecs::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn run(world: &mut World) {
        let mut particles = NullParticles;
        let mut rng = Pcg64::seed_from_u64(0);
        let mut ctx = TickContext {
            dt: 1.0 / 60.0,
            stage: 1,
            input: InputState::default(),
            particles: &mut particles,
            rng: &mut rng,
        };
        collision_system(world, &mut ctx);
    }

    fn platform(world: &mut World, x: f32, y: f32, w: f32, h: f32) -> EntityId {
        let e = world.spawn(Scene::Global, "platform");
        world.attach(e, Position::fixed(x, y)).unwrap();
        world.attach(e, Physics::new(0.1, 0.0)).unwrap();
        world.attach(e, Collider::platform(w, h)).unwrap();
        e
    }

    fn body(world: &mut World, x: f32, y: f32, vx: f32, vy: f32) -> EntityId {
        let e = world.spawn(Scene::Global, "body");
        world.attach(e, Position::new(x, y)).unwrap();
        world
            .attach(e, Physics::new(5000.0, 2000.0).with_velocity(vx, vy))
            .unwrap();
        world
            .attach(e, Collider::body(20.0, 20.0, EntityClass::Object))
            .unwrap();
        e
    }

    #[test]
    fn falling_body_lands_on_platform() {
        let mut world = World::new();
        let floor = platform(&mut world, 0.0, 0.0, 100.0, 10.0);
        let faller = body(&mut world, 0.0, 40.0, 0.0, -3000.0);

        run(&mut world);

        let col = world.get::<Collider>(faller).unwrap();
        assert!(col.on_platform);
        assert!(col.collided_this_tick);
        assert!(world.get::<Collider>(floor).unwrap().collided_this_tick);
        // Downward velocity cancelled up to the impact fraction.
        let vy = world.get::<Physics>(faller).unwrap().velocity_y;
        assert!(vy > -3000.0 && vy <= 0.0, "vy not deflected: {vy}");
    }

    #[test]
    fn corner_contact_still_deflects() {
        // A small body flying up-right into the exact lower-left corner of a
        // block. Both slab entries tie at t = 0.5; the contact must still
        // carry a face normal so the impact fraction is cancelled instead of
        // letting the body sail through.
        let mut world = World::new();
        platform(&mut world, 10.0, 10.0, 4.0, 4.0);
        let bullet = world.spawn(Scene::Global, "bullet");
        world.attach(bullet, Position::new(0.0, 0.0)).unwrap();
        world
            .attach(bullet, Physics::new(0.0, 0.0).with_velocity(840.0, 840.0))
            .unwrap();
        world
            .attach(bullet, Collider::body(2.0, 2.0, EntityClass::Object))
            .unwrap();

        run(&mut world);

        let col = world.get::<Collider>(bullet).unwrap();
        assert!(col.collided_this_tick);
        assert!(!col.on_platform);
        let phys = world.get::<Physics>(bullet).unwrap();
        assert_eq!(phys.velocity_x, 840.0);
        assert!((phys.velocity_y - 420.0).abs() < 1e-3, "vy: {}", phys.velocity_y);
    }

    #[test]
    fn horizontal_hit_does_not_ground() {
        let mut world = World::new();
        let _wall = platform(&mut world, 30.0, 0.0, 10.0, 100.0);
        let runner = body(&mut world, 0.0, 0.0, 1200.0, 0.0);

        run(&mut world);

        let col = world.get::<Collider>(runner).unwrap();
        assert!(col.collided_this_tick);
        assert!(!col.on_platform);
        let vx = world.get::<Physics>(runner).unwrap().velocity_x;
        assert!(vx < 1200.0, "vx not deflected: {vx}");
    }

    #[test]
    fn slow_body_does_not_collide_this_tick() {
        let mut world = World::new();
        let _wall = platform(&mut world, 100.0, 0.0, 10.0, 100.0);
        let walker = body(&mut world, 0.0, 0.0, 60.0, 0.0);

        run(&mut world);

        assert!(!world.get::<Collider>(walker).unwrap().collided_this_tick);
    }

    #[test]
    fn trigger_damages_matching_class_and_expires() {
        let mut world = World::new();
        let victim = world.spawn(Scene::Global, "victim");
        world.attach(victim, Position::new(30.0, 0.0)).unwrap();
        world.attach(victim, Physics::new(0.1, 0.0)).unwrap();
        world
            .attach(victim, Collider::body(20.0, 20.0, EntityClass::Enemy))
            .unwrap();
        world.attach(victim, Health::new(10.0)).unwrap();

        let dart = world.spawn(Scene::Global, "dart");
        world.attach(dart, Position::new(0.0, 0.0)).unwrap();
        world
            .attach(dart, Physics::new(0.1, 0.0).with_velocity(3000.0, 0.0))
            .unwrap();
        world
            .attach(dart, Collider::trigger(4.0, 4.0).damaging())
            .unwrap();
        world
            .attach(dart, Damage::new(10.0).with_uses(1))
            .unwrap();

        run(&mut world);

        assert_eq!(world.get::<Health>(victim).unwrap().health, 0.0);
        assert!(!world.get::<Collider>(dart).unwrap().active);
        assert!(world.dying().contains(&dart));
    }

    #[test]
    fn class_mismatch_still_consumes_a_use() {
        let mut world = World::new();
        let bystander = world.spawn(Scene::Global, "bystander");
        world.attach(bystander, Position::new(30.0, 0.0)).unwrap();
        world.attach(bystander, Physics::new(0.1, 0.0)).unwrap();
        world
            .attach(bystander, Collider::body(20.0, 20.0, EntityClass::Player))
            .unwrap();
        world.attach(bystander, Health::new(100.0)).unwrap();

        let dart = world.spawn(Scene::Global, "dart");
        world.attach(dart, Position::new(0.0, 0.0)).unwrap();
        world
            .attach(dart, Physics::new(0.1, 0.0).with_velocity(3000.0, 0.0))
            .unwrap();
        world
            .attach(dart, Collider::trigger(4.0, 4.0).damaging())
            .unwrap();
        // Damage::new does not target players.
        world.attach(dart, Damage::new(25.0).with_uses(1)).unwrap();

        run(&mut world);

        assert_eq!(world.get::<Health>(bystander).unwrap().health, 100.0);
        assert_eq!(world.get::<Damage>(dart).unwrap().uses, Some(0));
        assert!(world.dying().contains(&dart));
    }

    #[test]
    fn show_after_uses_keeps_entity_alive() {
        let mut world = World::new();
        let target = world.spawn(Scene::Global, "target");
        world.attach(target, Position::new(30.0, 0.0)).unwrap();
        world.attach(target, Physics::new(0.1, 0.0)).unwrap();
        world
            .attach(target, Collider::body(20.0, 20.0, EntityClass::Object))
            .unwrap();
        world.attach(target, Health::new(100.0)).unwrap();

        let spike = world.spawn(Scene::Global, "spike");
        world.attach(spike, Position::new(0.0, 0.0)).unwrap();
        world
            .attach(spike, Physics::new(0.1, 0.0).with_velocity(3000.0, 0.0))
            .unwrap();
        world
            .attach(spike, Collider::trigger(4.0, 4.0).damaging())
            .unwrap();
        let mut dmg = Damage::new(5.0).with_uses(1);
        dmg.show_after_uses = true;
        world.attach(spike, dmg).unwrap();

        run(&mut world);

        assert!(!world.get::<Collider>(spike).unwrap().active);
        assert!(!world.dying().contains(&spike));
    }

    #[test]
    fn climbable_wall_latches_climb_band() {
        let mut world = World::new();
        let wall = world.spawn(Scene::Global, "vine wall");
        world.attach(wall, Position::fixed(40.0, 10.0)).unwrap();
        world.attach(wall, Physics::new(0.1, 0.0)).unwrap();
        world
            .attach(wall, Collider::climbable_platform(10.0, 60.0))
            .unwrap();

        let climber = body(&mut world, 0.0, 10.0, 3000.0, 0.0);
        world
            .attach(climber, Movement::new(800.0, 300.0, 1.0))
            .unwrap();
        {
            let m = world.get_mut::<Movement>(climber).unwrap();
            m.should_climb = true;
        }

        // Non-platform solid branch only runs for non-platform A; the wall is
        // a platform so only the climber initiates.
        run(&mut world);

        let m = world.get::<Movement>(climber).unwrap();
        assert!(m.climbing);
        assert_eq!(m.max_climb_height, 40.0);
        assert_eq!(m.min_climb_height, -20.0);
        // Momentum drops on first grab.
        assert_eq!(world.get::<Physics>(climber).unwrap().velocity_x, 0.0);
    }

    #[test]
    fn contacts_resolve_earliest_first() {
        let mut world = World::new();
        // Two walls ahead; only the nearer one should absorb the motion,
        // after which the re-sweep invalidates the farther contact.
        let near = platform(&mut world, 30.0, 0.0, 10.0, 100.0);
        let far = platform(&mut world, 60.0, 0.0, 10.0, 100.0);
        let runner = body(&mut world, 0.0, 0.0, 4000.0, 0.0);

        run(&mut world);

        assert!(world.get::<Collider>(near).unwrap().collided_this_tick);
        // Both were recorded in the detection pass.
        assert!(world.get::<Collider>(far).unwrap().collided_this_tick);
        let vx = world.get::<Physics>(runner).unwrap().velocity_x;
        // One deflection at the near wall brings the remaining motion short
        // of the far wall.
        assert!(vx >= 0.0 && vx < 4000.0);
    }

    #[test]
    fn inactive_collider_is_ignored() {
        let mut world = World::new();
        let _floor = platform(&mut world, 0.0, 0.0, 100.0, 10.0);
        let faller = body(&mut world, 0.0, 40.0, 0.0, -3000.0);
        world.get_mut::<Collider>(faller).unwrap().active = false;

        run(&mut world);

        assert!(!world.get::<Collider>(faller).unwrap().on_platform);
        assert_eq!(world.get::<Physics>(faller).unwrap().velocity_y, -3000.0);
    }
}
