//! Velocity integration: gravity, platform drag, climb braking.
//!
//! This system only updates velocities; positions advance later in the tick
//! (see [`crate::position`]), after the collision engine has had its chance
//! to cancel penetrating components.

use karst_ecs::world::World;

use crate::context::TickContext;

/// Velocities below this are snapped to zero so drag terminates.
const REST_EPSILON: f32 = 0.5;

/// Apply per-tick accelerations to every participating physics body.
pub fn physics_system(world: &mut World, ctx: &mut TickContext) {
    let dt = ctx.dt;

    for slot in 0..world.physics.len() {
        let Some(entity) = world.physics.entity_at(slot) else {
            continue;
        };
        if !world.participates(entity, ctx.stage) {
            continue;
        }

        let is_static = match world.positions.get(entity) {
            Some(pos) => pos.is_static,
            None => continue,
        };
        let on_platform = world.colliders.get(entity).map(|c| c.on_platform);
        let climbing = world.movements.get(entity).map(|m| m.climbing);

        let Some(phys) = world.physics.at_mut(slot) else {
            continue;
        };

        if is_static {
            // Static bodies shed any velocity something else gave them.
            phys.velocity_x = 0.0;
            phys.velocity_y = 0.0;
            phys.rot_velocity = 0.0;
            continue;
        }

        match on_platform {
            Some(on_platform) => {
                match climbing {
                    Some(climbing) => {
                        if !climbing && !on_platform {
                            phys.velocity_y -= phys.gravity_mod * dt;
                        } else if climbing {
                            // Brake toward a hang at a quarter of ground drag,
                            // clamped so braking never reverses direction.
                            let brake = (phys.drag / 4.0) * dt;
                            if phys.velocity_y > 0.0 {
                                phys.velocity_y = (phys.velocity_y - brake).max(0.0);
                            } else if phys.velocity_y < 0.0 {
                                phys.velocity_y = (phys.velocity_y + brake).min(0.0);
                            }
                        }
                    }
                    None => {
                        if !on_platform {
                            phys.velocity_y -= phys.gravity_mod * dt;
                        }
                    }
                }

                if on_platform {
                    // Ground drag. Horizontal decay clamps at the zero
                    // crossing; vertical and rotational decay do not, the
                    // rest snap below swallows the residue.
                    let decay = phys.drag * dt;
                    if phys.velocity_x > 0.0 {
                        phys.velocity_x = (phys.velocity_x - decay).max(0.0);
                    } else if phys.velocity_x < 0.0 {
                        phys.velocity_x = (phys.velocity_x + decay).min(0.0);
                    }

                    if phys.velocity_y > 0.0 {
                        phys.velocity_y -= decay;
                    } else if phys.velocity_y < 0.0 {
                        phys.velocity_y += decay;
                    }

                    if phys.rot_velocity > 0.0 {
                        phys.rot_velocity -= decay;
                    } else if phys.rot_velocity < 0.0 {
                        phys.rot_velocity += decay;
                    }
                }
            }
            // No collider: nothing to stand on, gravity always applies.
            None => phys.velocity_y -= phys.gravity_mod * dt,
        }

        if phys.velocity_x.abs() < REST_EPSILON {
            phys.velocity_x = 0.0;
        }
        if phys.velocity_y.abs() < REST_EPSILON {
            phys.velocity_y = 0.0;
        }
        if phys.rot_velocity.abs() < REST_EPSILON {
            phys.rot_velocity = 0.0;
        }
    }
}
