//! Position integration: the last system of the tick.

use karst_ecs::component::Physics;
use karst_ecs::world::World;

use crate::context::TickContext;

/// Advance every participating body by its velocity over the fixed timestep.
///
/// Runs after collision resolution, so the velocities integrated here have
/// already had their penetrating components cancelled. Bodies without a
/// physics component never move; static positions keep zero velocity thanks
/// to the physics system, so no extra check is needed here.
pub fn position_system(world: &mut World, ctx: &mut TickContext) {
    let dt = ctx.dt;

    for slot in 0..world.positions.len() {
        let Some(entity) = world.positions.entity_at(slot) else {
            continue;
        };
        if !world.participates(entity, ctx.stage) {
            continue;
        }
        let Some(phys) = world.get::<Physics>(entity) else {
            continue;
        };
        let (vx, vy, vr) = (phys.velocity_x, phys.velocity_y, phys.rot_velocity);

        let Some(pos) = world.positions.at_mut(slot) else {
            continue;
        };
        pos.x += vx * dt;
        pos.y += vy * dt;
        pos.rotation += vr * dt;
    }
}
