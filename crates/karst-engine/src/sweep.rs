//! Continuous (swept) rectangle collision tests.
//!
//! The narrow phase treats a moving rectangle as a ray from its center,
//! cast against the target rectangle inflated by the mover's half-extents
//! (Minkowski sum). The slab method then yields the entry time, exit time,
//! and contact normal in one pass.
//!
//! Times are normalized to the displacement `velocity * dt`: a hit with
//! `time` in `[0, 1)` happens inside the current tick.

use glam::Vec2;

// ---------------------------------------------------------------------------
// RayHit
// ---------------------------------------------------------------------------

/// Result of a ray-vs-rectangle slab test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Point on the inflated rectangle where the ray enters.
    pub contact: Vec2,
    /// Axis-aligned outward normal of the face entered. An exact corner hit
    /// reports the vertical face.
    pub normal: Vec2,
    /// Entry time along the ray, in units of the ray direction. May be
    /// negative or beyond 1; callers window it.
    pub time: f32,
}

// ---------------------------------------------------------------------------
// Slab test
// ---------------------------------------------------------------------------

/// Cast a ray from `origin` along `dir` against the rectangle centered at
/// `center` with full extents `size`.
///
/// Returns `None` when the ray misses, when the rectangle lies entirely
/// behind the origin, or when a degenerate axis produces NaN (a zero
/// direction component with the origin exactly on the slab boundary).
pub fn ray_vs_rect(origin: Vec2, dir: Vec2, center: Vec2, size: Vec2) -> Option<RayHit> {
    let half = size * 0.5;
    let inv_dir = Vec2::new(1.0 / dir.x, 1.0 / dir.y);

    let mut near = (center - half - origin) * inv_dir;
    let mut far = (center + half - origin) * inv_dir;

    if near.x.is_nan() || near.y.is_nan() || far.x.is_nan() || far.y.is_nan() {
        return None;
    }

    if near.x > far.x {
        std::mem::swap(&mut near.x, &mut far.x);
    }
    if near.y > far.y {
        std::mem::swap(&mut near.y, &mut far.y);
    }

    // Slab intervals must overlap for the ray to pass through the rect.
    if near.x > far.y || near.y > far.x {
        return None;
    }

    let time = near.x.max(near.y);
    let far_time = far.x.min(far.y);

    // Entire rect behind the ray origin.
    if far_time < 0.0 {
        return None;
    }

    // Dominant (later) slab entry picks the face; an exact tie counts as a
    // vertical hit so dead-center corner contacts still deflect.
    let normal = if near.x > near.y {
        if inv_dir.x < 0.0 {
            Vec2::new(1.0, 0.0)
        } else {
            Vec2::new(-1.0, 0.0)
        }
    } else if inv_dir.y < 0.0 {
        Vec2::new(0.0, 1.0)
    } else {
        Vec2::new(0.0, -1.0)
    };

    Some(RayHit {
        contact: origin + time * dir,
        normal,
        time,
    })
}

/// Swept test of a moving rectangle against a stationary one.
///
/// `a_center`/`a_size` describe the mover, displaced by `a_vel * dt` over the
/// tick; `b_center`/`b_size` the obstacle. Only hits that occur within this
/// tick (`0 <= time < 1`) are reported.
pub fn swept_rect(
    a_center: Vec2,
    a_size: Vec2,
    a_vel: Vec2,
    dt: f32,
    b_center: Vec2,
    b_size: Vec2,
) -> Option<RayHit> {
    let dir = a_vel * dt;
    let hit = ray_vs_rect(a_center, dir, b_center, a_size + b_size)?;
    if hit.time >= 0.0 && hit.time < 1.0 {
        Some(hit)
    } else {
        None
    }
}
