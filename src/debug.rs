//! Gizmo overlay for riders. Enable with the `debug-draw` feature.

use bevy::color::palettes::css::{GREEN, ORANGE, RED, YELLOW};
use bevy::prelude::*;

use crate::config::RiderConfig;
use crate::state::GroundRider;

/// Scale from spring force to drawn arrow length.
const FORCE_DRAW_SCALE: f32 = 0.02;

/// Draw each rider's ground probe, spring force and wall normal.
///
/// The probe is yellow up to the hit point and orange past it (or the whole
/// ray when airborne). The spring force is a red arrow from the body.
pub fn draw_rider_gizmos(mut gizmos: Gizmos, q_riders: Query<(&RiderConfig, &GroundRider)>) {
    for (config, rider) in &q_riders {
        let contact = rider.contact();
        let ray_end = contact.ray_origin + contact.ray_direction * config.max_ray_distance;

        if contact.grounded {
            gizmos.line(contact.ray_origin, contact.point, YELLOW);
            gizmos.line(contact.point, ray_end, ORANGE);
            gizmos.arrow(
                contact.ray_origin,
                contact.ray_origin - contact.ray_direction * rider.last_spring_force() * FORCE_DRAW_SCALE,
                RED,
            );
        } else {
            gizmos.line(contact.ray_origin, ray_end, ORANGE);
        }

        if let Some(normal) = rider.wall_normal() {
            gizmos.arrow(contact.ray_origin, contact.ray_origin + normal * 0.5, GREEN);
        }
    }
}
