//! Wall redirect.
//!
//! While airborne, velocity pushing into a near-vertical surface is
//! projected onto the surface so the rider slides along the wall instead of
//! sticking to it.

use bevy::prelude::*;

/// Horizontal speed below which the wall probe is skipped.
pub const WALL_MIN_SPEED: f32 = 0.1;

/// Into-wall speeds smaller than this are treated as already tangential.
const TANGENT_EPSILON: f32 = 1e-5;

/// Direction for the wall probe: the normalized horizontal velocity, or
/// `None` when moving too slowly.
pub fn wall_probe_direction(velocity: Vec3) -> Option<Vec3> {
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
    let speed = horizontal.length();
    (speed >= WALL_MIN_SPEED).then(|| horizontal / speed)
}

/// Whether a surface with `normal` counts as a wall.
#[inline]
pub fn is_wall(normal: Vec3, slide_threshold: f32) -> bool {
    normal.dot(Vec3::Y).abs() < slide_threshold
}

/// Remove the component of `velocity` driving into the surface.
///
/// Velocity moving away from or along the surface is returned unchanged,
/// which makes the function idempotent.
pub fn redirect_along_wall(velocity: Vec3, normal: Vec3) -> Vec3 {
    let normal = normal.normalize_or_zero();
    let into_wall = velocity.dot(normal);
    if into_wall < -TANGENT_EPSILON {
        velocity - normal * into_wall
    } else {
        velocity
    }
}
