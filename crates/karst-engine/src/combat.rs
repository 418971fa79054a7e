//! Lifetime expiry and death bookkeeping.

use tracing::debug;

use karst_ecs::world::World;

use crate::context::TickContext;

/// Tick down limited-lifetime damage sources and destroy the expired ones.
///
/// Expiry is checked before the decrement, so a source whose lifetime just
/// crossed zero gets one final full tick before destruction.
pub fn damage_system(world: &mut World, ctx: &mut TickContext) {
    let dt = ctx.dt;

    for slot in 0..world.damages.len() {
        let Some(entity) = world.damages.entity_at(slot) else {
            continue;
        };
        if !world.participates(entity, ctx.stage) {
            continue;
        }
        let expired = match world.damages.at_mut(slot) {
            Some(dmg) => match dmg.lifetime.as_mut() {
                Some(lifetime) if *lifetime < 0.0 => true,
                Some(lifetime) => {
                    *lifetime -= dt;
                    false
                }
                None => false,
            },
            None => false,
        };
        if expired {
            debug!(entity = %entity, "damage source expired");
            world.queue_dead(entity);
        }
    }
}

/// Flip depleted health components to dead and queue their entities.
///
/// The `dead` flag doubles as the latch: once set, the entity is skipped,
/// so overkill damage after death never queues it a second time.
pub fn health_system(world: &mut World, ctx: &mut TickContext) {
    for slot in 0..world.healths.len() {
        let Some(entity) = world.healths.entity_at(slot) else {
            continue;
        };
        if !world.participates(entity, ctx.stage) {
            continue;
        }
        let died = match world.healths.at_mut(slot) {
            Some(health) if !health.dead && health.health <= 0.0 => {
                health.dead = true;
                true
            }
            _ => false,
        };
        if died {
            debug!(entity = %entity, "died");
            world.queue_dead(entity);
        }
    }
}
