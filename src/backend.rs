//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the ground rider. The controller never touches engine
//! types directly; every raycast, force and velocity write goes through
//! [`RiderPhysicsBackend`], which keeps the controller portable between
//! Rapier, the built-in headless integrator, or a custom engine.

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Fixed timestep used when no `Time<Fixed>` resource is present.
pub const FALLBACK_TIMESTEP: f32 = 1.0 / 60.0;

/// Trait for physics backend implementations.
///
/// All methods are static and operate on the ECS [`World`] plus the entity
/// that owns the rigid body. Accessors on entities that lack the backend's
/// components return neutral values (zero velocity, identity rotation, unit
/// mass) instead of failing.
///
/// See [`HeadlessBackend`](crate::headless::HeadlessBackend) for a minimal
/// implementation, and `Rapier3dBackend` (feature `rapier3d`) for an engine
/// integration.
pub trait RiderPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Cast a single ray and return the nearest hit.
    ///
    /// The request's `exclude` entity is never reported, and only colliders
    /// whose membership intersects the request's `mask` are considered.
    fn raycast(world: &mut World, request: &RaycastRequest) -> Option<CollisionData>;

    /// Get the world-space position of a body.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Teleport a body to a world-space position.
    fn set_position(world: &mut World, entity: Entity, position: Vec3);

    /// Get the world-space rotation of a body.
    fn get_rotation(world: &World, entity: Entity) -> Quat;

    /// Overwrite the world-space rotation of a body.
    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat);

    /// Get the current linear velocity of a body.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of a body.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Set the linear damping coefficient the engine applies each step.
    fn set_damping(world: &mut World, entity: Entity, damping: f32);

    /// Apply a continuous force through the body's center of mass.
    ///
    /// Forces accumulate over the current step and are consumed by the
    /// engine's integrator.
    fn apply_force(world: &mut World, entity: Entity, force: Vec3);

    /// Apply a continuous force at a world-space point.
    ///
    /// Used for the reaction force the rider pushes into the body it stands on.
    fn apply_force_at_point(world: &mut World, entity: Entity, force: Vec3, point: Vec3);

    /// Apply an instantaneous change in velocity, independent of mass.
    fn apply_velocity_change(world: &mut World, entity: Entity, delta_velocity: Vec3);

    /// Whether the entity is a dynamic body that can receive forces.
    ///
    /// Static ground returns `false`, so no reaction force is sent to it.
    fn is_dynamic(world: &World, entity: Entity) -> bool;

    /// Get the mass of a body.
    ///
    /// Used to turn accelerations into forces.
    fn get_mass(_world: &World, _entity: Entity) -> f32 {
        1.0
    }

    /// Get the fixed timestep in seconds.
    ///
    /// Reads the configured period of `Time<Fixed>`, not the elapsed delta,
    /// so every step of a replay uses the same value.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.timestep().as_secs_f32())
            .unwrap_or(FALLBACK_TIMESTEP)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// Helper struct for building raycasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastRequest {
    /// Origin point of the ray.
    pub origin: Vec3,
    /// Direction of the ray (normalized on construction).
    pub direction: Vec3,
    /// Maximum distance to cast.
    pub max_distance: f32,
    /// Entity to exclude from results.
    pub exclude: Option<Entity>,
    /// Collision layers the ray can hit.
    pub mask: u32,
}

impl RaycastRequest {
    /// Create a new raycast request against every layer.
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
            exclude: None,
            mask: u32::MAX,
        }
    }

    /// Exclude an entity from the raycast.
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    /// Restrict the raycast to the given collision layers.
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Point along the ray at the given distance.
    #[inline]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_normalizes_direction() {
        let request = RaycastRequest::new(Vec3::ZERO, Vec3::new(0.0, -4.0, 0.0), 2.0);
        assert_eq!(request.direction, Vec3::NEG_Y);
        assert_eq!(request.mask, u32::MAX);
        assert_eq!(request.exclude, None);
    }

    #[test]
    fn request_builders() {
        let entity = Entity::from_raw(7);
        let request = RaycastRequest::new(Vec3::ONE, Vec3::X, 1.0)
            .excluding(entity)
            .with_mask(0b0101);

        assert_eq!(request.exclude, Some(entity));
        assert_eq!(request.mask, 0b0101);
        assert_eq!(request.point_at(0.5), Vec3::new(1.5, 1.0, 1.0));
    }
}
