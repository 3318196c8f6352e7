//! Ground and wall probes.
//!
//! The ground probe runs once per step and its [`GroundContact`] is the only
//! answer to "is the rider grounded" for the rest of that step. The wall
//! probe is cast on demand by the wall redirector, and the jump check casts
//! its own short confirmation ray.

use bevy::prelude::*;

use crate::backend::{RaycastRequest, RiderPhysicsBackend};
use crate::collision::CollisionData;
use crate::config::RiderConfig;

/// Result of the downward ground probe for one step.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    /// Whether the probe hit anything within `max_ray_distance`.
    pub grounded: bool,
    /// Distance from the probe origin to the hit point.
    pub distance: f32,
    /// The entity that was hit, if the backend reported one.
    pub body: Option<Entity>,
    /// Surface normal at the hit point.
    pub normal: Vec3,
    /// World-space hit point.
    pub point: Vec3,
    /// Linear velocity of the contacted body (zero for static ground).
    pub velocity: Vec3,
    /// Where the probe started.
    pub ray_origin: Vec3,
    /// Normalized probe direction.
    pub ray_direction: Vec3,
}

impl Default for GroundContact {
    fn default() -> Self {
        Self::airborne(Vec3::ZERO, Vec3::NEG_Y)
    }
}

impl GroundContact {
    /// A probe that found nothing.
    pub fn airborne(ray_origin: Vec3, ray_direction: Vec3) -> Self {
        Self {
            grounded: false,
            distance: 0.0,
            body: None,
            normal: Vec3::Y,
            point: ray_origin,
            velocity: Vec3::ZERO,
            ray_origin,
            ray_direction,
        }
    }

    /// A probe that hit `hit`, standing on something moving at `velocity`.
    pub fn from_hit(hit: CollisionData, velocity: Vec3, ray_origin: Vec3, ray_direction: Vec3) -> Self {
        Self {
            grounded: true,
            distance: hit.distance,
            body: hit.entity,
            normal: hit.normal,
            point: hit.point,
            velocity,
            ray_origin,
            ray_direction,
        }
    }
}

/// Cast the ground probe for `entity`.
///
/// The ray starts at the body position plus the rotated `ray_offset` and
/// points along the body's local down.
pub fn probe_ground<B: RiderPhysicsBackend>(
    world: &mut World,
    entity: Entity,
    config: &RiderConfig,
) -> GroundContact {
    let position = B::get_position(world, entity);
    let rotation = B::get_rotation(world, entity);
    let origin = position + rotation * config.ray_offset;
    let direction = (rotation * Vec3::NEG_Y).normalize_or(Vec3::NEG_Y);

    let request = RaycastRequest::new(origin, direction, config.max_ray_distance)
        .excluding(entity)
        .with_mask(config.ray_mask);

    match B::raycast(world, &request) {
        Some(hit) => {
            let velocity = hit
                .entity
                .map(|other| B::get_velocity(world, other))
                .unwrap_or(Vec3::ZERO);
            GroundContact::from_hit(hit, velocity, origin, direction)
        }
        None => GroundContact::airborne(origin, direction),
    }
}

/// Fresh straight-down check used by the jump controller.
///
/// Returns true if ground lies within `ride_height + ground_check_distance`
/// of the probe origin.
pub fn confirm_ground<B: RiderPhysicsBackend>(
    world: &mut World,
    entity: Entity,
    config: &RiderConfig,
) -> bool {
    let position = B::get_position(world, entity);
    let rotation = B::get_rotation(world, entity);
    let origin = position + rotation * config.ray_offset;

    let request = RaycastRequest::new(origin, Vec3::NEG_Y, config.jump_probe_distance())
        .excluding(entity)
        .with_mask(config.ray_mask);

    B::raycast(world, &request).is_some()
}

/// Cast the wall probe from the body position along `direction`.
pub fn probe_wall<B: RiderPhysicsBackend>(
    world: &mut World,
    entity: Entity,
    direction: Vec3,
    config: &RiderConfig,
) -> Option<CollisionData> {
    let position = B::get_position(world, entity);
    let request = RaycastRequest::new(position, direction, config.wall_check_distance)
        .excluding(entity)
        .with_mask(config.ray_mask);

    B::raycast(world, &request)
}
