//! Ride spring.
//!
//! The rider floats above the ground on a spring-damper acting along the
//! probe ray. The spring compares the probe distance with `ride_height`;
//! the damper works on the velocity relative to whatever the rider stands
//! on, so a moving platform does not read as a compression.

use bevy::prelude::*;

use crate::config::RiderConfig;
use crate::detection::GroundContact;

/// Signed spring force magnitude along the negative probe direction.
///
/// Positive pushes the rider away from the ground, negative pulls it down.
/// The damper term opposes the rider's velocity along the ray relative to
/// the contacted body. Clamped to `±max_spring_force`.
pub fn spring_force(config: &RiderConfig, contact: &GroundContact, body_velocity: Vec3) -> f32 {
    let displacement = config.ride_height - contact.distance;
    // Positive when moving away from the ground.
    let separation_velocity = (-contact.ray_direction).dot(body_velocity - contact.velocity);
    let limit = config.max_spring_force.max(0.0);

    (displacement * config.spring_strength - separation_velocity * config.spring_damper)
        .clamp(-limit, limit)
}

/// World-space force on the rider for a spring magnitude.
///
/// The contacted body receives the negation of this at the hit point.
#[inline]
pub fn spring_force_vector(contact: &GroundContact, magnitude: f32) -> Vec3 {
    -contact.ray_direction * magnitude
}
