//! Discrete collision path for rotated colliders.
//!
//! The swept engine in [`crate::collision`] treats colliders as axis-aligned.
//! Rotated rectangles go through this older diagonal-versus-edge scheme: each
//! rectangle casts lines from its center to its corners and checks them
//! against the other rectangle's edges. Resolution walks the tick backwards
//! in coarse sub-steps, pushing the movable body out along the accumulated
//! penetration and damping its velocity on those axes.
//!
//! Not wired into the tick loop; hosts that allow rotated solids call it
//! directly after the position pass.

use glam::Vec2;

use karst_ecs::component::{Collider, Physics, Position};

/// Corner positions of a collider in world space, honoring the position's
/// rotation. Order: top-left, top-right, bottom-right, bottom-left.
pub fn corners(pos: &Position, col: &Collider) -> [Vec2; 4] {
    let center = Vec2::new(pos.x, pos.y);
    let (hw, hh) = (col.width / 2.0, col.height / 2.0);
    let (ox, oy) = (col.offset_x, col.offset_y);
    [
        center + pos.rotate(Vec2::new(ox - hw, oy + hh)),
        center + pos.rotate(Vec2::new(ox + hw, oy + hh)),
        center + pos.rotate(Vec2::new(ox + hw, oy - hh)),
        center + pos.rotate(Vec2::new(ox - hw, oy - hh)),
    ]
}

fn rotated_center(pos: &Position, col: &Collider) -> Vec2 {
    Vec2::new(pos.x, pos.y) + pos.rotate(Vec2::new(col.offset_x, col.offset_y))
}

/// Segment intersection parameter along `line_a..line_b`, when both segments
/// cross within `[0, 1)`.
fn intersect(line_a: Vec2, line_b: Vec2, edge_a: Vec2, edge_b: Vec2) -> Option<f32> {
    let h = (edge_b.x - edge_a.x) * (line_a.y - line_b.y)
        - (line_a.x - line_b.x) * (edge_b.y - edge_a.y);
    if h == 0.0 {
        return None;
    }
    let t1 = ((edge_a.y - edge_b.y) * (line_a.x - edge_a.x)
        + (edge_b.x - edge_a.x) * (line_a.y - edge_a.y))
        / h;
    let t2 = ((line_a.y - line_b.y) * (line_a.x - edge_a.x)
        + (line_b.x - line_a.x) * (line_a.y - edge_a.y))
        / h;
    if (0.0..1.0).contains(&t1) && (0.0..1.0).contains(&t2) {
        Some(t1)
    } else {
        None
    }
}

/// Penetration of `a`'s center-to-corner diagonals through `b`'s edges,
/// summed over all crossings. Zero when no diagonal crosses an edge.
fn diagonal_penetration(
    center: Vec2,
    diag_corners: &[Vec2; 4],
    edge_corners: &[Vec2; 4],
) -> Vec2 {
    let mut displacement = Vec2::ZERO;
    for corner in diag_corners {
        for q in 0..4 {
            let edge_a = edge_corners[q];
            let edge_b = edge_corners[(q + 1) % 4];
            if let Some(t1) = intersect(center, *corner, edge_a, edge_b) {
                displacement += (1.0 - t1) * (*corner - center);
            }
        }
    }
    displacement
}

/// Discrete overlap test between two possibly rotated colliders.
///
/// A rectangle fully containing the other's center reports no overlap; the
/// diagonals only register once they cross an edge. Callers relying on this
/// path keep colliders small relative to their closing speed.
pub fn rotated_overlap(pos_a: &Position, col_a: &Collider, pos_b: &Position, col_b: &Collider) -> bool {
    let ca = rotated_center(pos_a, col_a);
    let cb = rotated_center(pos_b, col_b);
    let corners_a = corners(pos_a, col_a);
    let corners_b = corners(pos_b, col_b);

    diagonal_penetration(ca, &corners_a, &corners_b) != Vec2::ZERO
        || diagonal_penetration(cb, &corners_b, &corners_a) != Vec2::ZERO
}

/// Detect and separate two rotated colliders over the tick just taken.
///
/// Walks sub-steps of the tick from 0.9 of the displacement down to zero,
/// testing at each rewound state. Wherever diagonals penetrate, the movable
/// body is pushed back by the penetration and its velocity is damped along
/// the push direction. Static bodies never move; when both are static
/// nothing is resolved. Returns whether any overlap was found.
pub fn resolve_rotated_overlap(
    pos_a: &mut Position,
    phys_a: &mut Physics,
    col_a: &Collider,
    pos_b: &mut Position,
    phys_b: &mut Physics,
    col_b: &Collider,
    dt: f32,
) -> bool {
    // Coarse sub-step spacing derived from the timestep, floored at 0.1.
    let step = (((dt * 100.0 + 0.5) as i32) as f32 / 100.0 * 5.0).max(0.1);
    let mut collided = false;

    let mut it = 0.9f32;
    while it > -0.1 {
        let rewind_a = Vec2::new(phys_a.velocity_x, phys_a.velocity_y) * it * dt;
        let rewind_b = Vec2::new(phys_b.velocity_x, phys_b.velocity_y) * it * dt;

        let at_a = Position {
            x: pos_a.x + rewind_a.x,
            y: pos_a.y + rewind_a.y,
            ..pos_a.clone()
        };
        let at_b = Position {
            x: pos_b.x + rewind_b.x,
            y: pos_b.y + rewind_b.y,
            ..pos_b.clone()
        };

        let ca = rotated_center(&at_a, col_a);
        let cb = rotated_center(&at_b, col_b);
        let corners_a = corners(&at_a, col_a);
        let corners_b = corners(&at_b, col_b);

        let push_a = diagonal_penetration(ca, &corners_a, &corners_b);
        if push_a != Vec2::ZERO {
            collided = true;
            apply_push(pos_a, phys_a, pos_b, phys_b, col_a, push_a);
        }

        let push_b = diagonal_penetration(cb, &corners_b, &corners_a);
        if push_b != Vec2::ZERO {
            collided = true;
            apply_push(pos_b, phys_b, pos_a, phys_a, col_b, push_b);
        }

        it -= step;
    }

    collided
}

/// Separate one penetrating body: move the non-static side out by the
/// penetration vector and damp its velocity along the push axes.
fn apply_push(
    pos_this: &mut Position,
    phys_this: &mut Physics,
    pos_other: &mut Position,
    phys_other: &mut Physics,
    col_this: &Collider,
    push: Vec2,
) {
    let dir = push.normalize_or_zero();
    if !pos_this.is_static {
        phys_this.velocity_x -= dir.x * phys_this.velocity_x;
        phys_this.velocity_y -= dir.y * phys_this.velocity_y;
        pos_this.x -= push.x;
        pos_this.y -= push.y;
    } else if !pos_other.is_static && !col_this.platform {
        phys_other.velocity_x -= dir.x * phys_other.velocity_x;
        phys_other.velocity_y -= dir.y * phys_other.velocity_y;
        pos_other.x += push.x;
        pos_other.y += push.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karst_ecs::component::EntityClass;

    fn square(x: f32, y: f32, size: f32) -> (Position, Collider) {
        (
            Position::new(x, y),
            Collider::body(size, size, EntityClass::Object),
        )
    }

    #[test]
    fn partial_overlap_detected() {
        let (pos_a, col_a) = square(0.0, 0.0, 10.0);
        let (pos_b, col_b) = square(8.0, 0.0, 10.0);
        assert!(rotated_overlap(&pos_a, &col_a, &pos_b, &col_b));
    }

    #[test]
    fn disjoint_rectangles_do_not_overlap() {
        let (pos_a, col_a) = square(0.0, 0.0, 10.0);
        let (pos_b, col_b) = square(25.0, 0.0, 10.0);
        assert!(!rotated_overlap(&pos_a, &col_a, &pos_b, &col_b));
    }

    #[test]
    fn rotation_changes_the_answer() {
        // A thin rect that misses axis-aligned but clips when rotated 45
        // degrees toward its neighbor.
        let pos_a = Position::new(0.0, 0.0);
        let col_a = Collider::body(40.0, 2.0, EntityClass::Object);
        let (pos_b, col_b) = square(16.0, 12.0, 10.0);
        assert!(!rotated_overlap(&pos_a, &col_a, &pos_b, &col_b));

        let mut tilted = pos_a.clone();
        tilted.rotation = 45.0;
        assert!(rotated_overlap(&tilted, &col_a, &pos_b, &col_b));
    }

    #[test]
    fn resolver_separates_movable_from_static() {
        let (mut pos_a, col_a) = square(0.0, 0.0, 10.0);
        let mut phys_a = Physics::new(0.0, 0.0);
        let mut pos_b = Position::fixed(8.0, 0.0);
        let col_b = Collider::body(10.0, 10.0, EntityClass::Object);
        let mut phys_b = Physics::new(0.0, 0.0);

        let hit = resolve_rotated_overlap(
            &mut pos_a, &mut phys_a, &col_a, &mut pos_b, &mut phys_b, &col_b,
            1.0 / 60.0,
        );

        assert!(hit);
        // Static body stays, movable body got pushed out.
        assert_eq!(pos_b.x, 8.0);
        assert!(pos_a.x < 0.0);
        assert!(!rotated_overlap(&pos_a, &col_a, &pos_b, &col_b));
    }

    #[test]
    fn two_static_bodies_are_left_alone() {
        let mut pos_a = Position::fixed(0.0, 0.0);
        let col_a = Collider::body(10.0, 10.0, EntityClass::Object);
        let mut phys_a = Physics::new(0.0, 0.0);
        let mut pos_b = Position::fixed(8.0, 0.0);
        let col_b = Collider::body(10.0, 10.0, EntityClass::Object);
        let mut phys_b = Physics::new(0.0, 0.0);

        resolve_rotated_overlap(
            &mut pos_a, &mut phys_a, &col_a, &mut pos_b, &mut phys_b, &col_b,
            1.0 / 60.0,
        );

        assert_eq!((pos_a.x, pos_b.x), (0.0, 8.0));
    }
}
