//! Headless physics backend.
//!
//! A small deterministic backend with no engine dependency. Bodies are point
//! masses ([`HeadlessBody`]) integrated with semi-implicit Euler; colliders
//! ([`HeadlessCollider`]) are one-sided planes and axis-aligned boxes that
//! answer ray queries analytically. There is no contact resolution: the ride
//! spring is what holds a rider up.
//!
//! This is enough to run the controller on a server for replay, and it is the
//! backend every test in this crate uses.

use bevy::prelude::*;

use crate::backend::{RaycastRequest, RiderPhysicsBackend};
use crate::collision::CollisionData;
use crate::GroundRiderSet;

const RAY_EPSILON: f32 = 1e-6;

/// Headless physics backend.
pub struct HeadlessBackend;

/// Gravity applied to every [`HeadlessBody`] (scaled per body).
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct HeadlessGravity(pub Vec3);

impl Default for HeadlessGravity {
    fn default() -> Self {
        Self(Vec3::new(0.0, -9.81, 0.0))
    }
}

/// A simulated point-mass body. Position and rotation live in [`Transform`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct HeadlessBody {
    pub velocity: Vec3,
    pub mass: f32,
    /// Linear damping, applied as `v *= 1 / (1 + dt * damping)`.
    pub damping: f32,
    pub gravity_scale: f32,
    /// Kinematic bodies move at their velocity and ignore forces and gravity.
    pub kinematic: bool,
    /// Force accumulated for the current step.
    pub force: Vec3,
}

impl Default for HeadlessBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            mass: 1.0,
            damping: 0.0,
            gravity_scale: 1.0,
            kinematic: false,
            force: Vec3::ZERO,
        }
    }
}

impl HeadlessBody {
    /// A body that moves at a fixed velocity, like a scripted platform.
    pub fn kinematic(velocity: Vec3) -> Self {
        Self {
            velocity,
            kinematic: true,
            ..default()
        }
    }

    /// Builder: set mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Advance one step and clear the accumulated force.
    pub fn step(&mut self, position: &mut Vec3, gravity: Vec3, dt: f32) {
        if !self.kinematic {
            let inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
            let acceleration = self.force * inv_mass + gravity * self.gravity_scale;
            self.velocity += acceleration * dt;
            self.velocity *= 1.0 / (1.0 + dt * self.damping.max(0.0));
        }
        *position += self.velocity * dt;
        self.force = Vec3::ZERO;
    }
}

/// Shapes the headless backend can raycast against.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum HeadlessShape {
    /// One-sided infinite plane through the entity position. Only rays
    /// travelling against the normal hit it.
    Plane { normal: Vec3 },
    /// Axis-aligned box centered on the entity position. Rotation is ignored.
    Cuboid { half_extents: Vec3 },
}

impl HeadlessShape {
    /// Intersect a ray with this shape placed at `center`.
    ///
    /// Returns the hit distance and the surface normal facing the ray.
    pub fn cast(&self, center: Vec3, request: &RaycastRequest) -> Option<(f32, Vec3)> {
        match *self {
            HeadlessShape::Plane { normal } => ray_plane(center, normal, request),
            HeadlessShape::Cuboid { half_extents } => ray_cuboid(center, half_extents, request),
        }
    }
}

/// A static or body-attached collider for the headless backend.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct HeadlessCollider {
    pub shape: HeadlessShape,
    /// Collision layers this collider belongs to.
    pub membership: u32,
}

impl HeadlessCollider {
    /// A ground plane with the given normal.
    pub fn plane(normal: Vec3) -> Self {
        Self {
            shape: HeadlessShape::Plane {
                normal: normal.normalize_or(Vec3::Y),
            },
            membership: u32::MAX,
        }
    }

    /// An axis-aligned box.
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self {
            shape: HeadlessShape::Cuboid {
                half_extents: half_extents.abs(),
            },
            membership: u32::MAX,
        }
    }

    /// Builder: set collision layers.
    pub fn with_membership(mut self, membership: u32) -> Self {
        self.membership = membership;
        self
    }
}

fn ray_plane(point: Vec3, normal: Vec3, request: &RaycastRequest) -> Option<(f32, Vec3)> {
    let denom = normal.dot(request.direction);
    if denom > -RAY_EPSILON {
        return None;
    }
    let distance = normal.dot(point - request.origin) / denom;
    (0.0..=request.max_distance)
        .contains(&distance)
        .then_some((distance, normal))
}

fn ray_cuboid(center: Vec3, half_extents: Vec3, request: &RaycastRequest) -> Option<(f32, Vec3)> {
    let min = center - half_extents;
    let max = center + half_extents;
    let origin = request.origin;
    let direction = request.direction;

    // Slab test. A ray starting inside reports distance zero.
    let mut t_enter = 0.0_f32;
    let mut t_exit = request.max_distance;
    let mut normal = -direction;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < RAY_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        let mut face = -Vec3::AXES[axis];
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
            face = Vec3::AXES[axis];
        }

        if t0 > t_enter {
            t_enter = t0;
            normal = face;
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    Some((t_enter, normal))
}

impl RiderPhysicsBackend for HeadlessBackend {
    fn plugin() -> impl Plugin {
        HeadlessBackendPlugin
    }

    fn raycast(world: &mut World, request: &RaycastRequest) -> Option<CollisionData> {
        let mut colliders = world.query::<(Entity, &Transform, &HeadlessCollider)>();
        colliders
            .iter(world)
            .filter(|(entity, _, collider)| {
                request.exclude != Some(*entity) && collider.membership & request.mask != 0
            })
            .filter_map(|(entity, transform, collider)| {
                collider
                    .shape
                    .cast(transform.translation, request)
                    .map(|(distance, normal)| {
                        CollisionData::new(distance, normal, request.point_at(distance), Some(entity))
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = position;
        }
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = rotation;
        }
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<HeadlessBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<HeadlessBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn set_damping(world: &mut World, entity: Entity, damping: f32) {
        if let Some(mut body) = world.get_mut::<HeadlessBody>(entity) {
            body.damping = damping;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        if let Some(mut body) = world.get_mut::<HeadlessBody>(entity) {
            body.force += force;
        }
    }

    fn apply_force_at_point(world: &mut World, entity: Entity, force: Vec3, _point: Vec3) {
        // Point masses have no rotational state.
        Self::apply_force(world, entity, force);
    }

    fn apply_velocity_change(world: &mut World, entity: Entity, delta_velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<HeadlessBody>(entity) {
            body.velocity += delta_velocity;
        }
    }

    fn is_dynamic(world: &World, entity: Entity) -> bool {
        world
            .get::<HeadlessBody>(entity)
            .is_some_and(|b| !b.kinematic)
    }

    fn get_mass(world: &World, entity: Entity) -> f32 {
        world
            .get::<HeadlessBody>(entity)
            .map(|b| b.mass)
            .filter(|&m| m > 0.0)
            .unwrap_or(1.0)
    }
}

/// Plugin that integrates [`HeadlessBody`] after the rider systems.
pub struct HeadlessBackendPlugin;

impl Plugin for HeadlessBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<HeadlessBody>();
        app.register_type::<HeadlessCollider>();
        app.register_type::<HeadlessGravity>();
        app.init_resource::<HeadlessGravity>();

        app.add_systems(
            FixedUpdate,
            integrate_headless_bodies.after(GroundRiderSet::Modulators),
        );
    }
}

/// Integrate every [`HeadlessBody`] by one fixed step.
pub fn integrate_headless_bodies(world: &mut World) {
    let dt = HeadlessBackend::get_fixed_timestep(world);
    let gravity = world
        .get_resource::<HeadlessGravity>()
        .copied()
        .unwrap_or_default()
        .0;

    let mut bodies = world.query::<(&mut Transform, &mut HeadlessBody)>();
    for (mut transform, mut body) in bodies.iter_mut(world) {
        body.step(&mut transform.translation, gravity, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(origin: Vec3, max_distance: f32) -> RaycastRequest {
        RaycastRequest::new(origin, Vec3::NEG_Y, max_distance)
    }

    #[test]
    fn plane_hit_from_above() {
        let hit = HeadlessShape::Plane { normal: Vec3::Y }.cast(Vec3::ZERO, &down_ray(Vec3::new(3.0, 2.0, -1.0), 5.0));
        assert_eq!(hit, Some((2.0, Vec3::Y)));
    }

    #[test]
    fn plane_is_one_sided() {
        let shape = HeadlessShape::Plane { normal: Vec3::Y };
        let up = RaycastRequest::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y, 5.0);
        assert_eq!(shape.cast(Vec3::ZERO, &up), None);
        // Below the plane looking down: behind the origin
        assert_eq!(shape.cast(Vec3::ZERO, &down_ray(Vec3::new(0.0, -1.0, 0.0), 5.0)), None);
    }

    #[test]
    fn plane_respects_max_distance() {
        let shape = HeadlessShape::Plane { normal: Vec3::Y };
        assert_eq!(shape.cast(Vec3::ZERO, &down_ray(Vec3::new(0.0, 3.0, 0.0), 2.0)), None);
    }

    #[test]
    fn cuboid_top_face() {
        let shape = HeadlessShape::Cuboid {
            half_extents: Vec3::new(1.0, 0.5, 1.0),
        };
        let hit = shape.cast(Vec3::ZERO, &down_ray(Vec3::new(0.2, 2.0, 0.3), 5.0));
        assert_eq!(hit, Some((1.5, Vec3::Y)));
    }

    #[test]
    fn cuboid_side_face() {
        let shape = HeadlessShape::Cuboid {
            half_extents: Vec3::new(0.5, 2.0, 2.0),
        };
        let request = RaycastRequest::new(Vec3::new(-3.0, 0.0, 0.0), Vec3::X, 5.0);
        assert_eq!(shape.cast(Vec3::ZERO, &request), Some((2.5, Vec3::NEG_X)));
    }

    #[test]
    fn cuboid_miss_beside() {
        let shape = HeadlessShape::Cuboid {
            half_extents: Vec3::splat(0.5),
        };
        assert_eq!(shape.cast(Vec3::ZERO, &down_ray(Vec3::new(2.0, 2.0, 0.0), 5.0)), None);
    }

    #[test]
    fn raycast_picks_nearest_and_honors_mask_and_exclude() {
        let mut world = World::new();
        let floor = world.spawn((Transform::default(), HeadlessCollider::plane(Vec3::Y))).id();
        let crate_box = world
            .spawn((
                Transform::from_xyz(0.0, 0.5, 0.0),
                HeadlessCollider::cuboid(Vec3::splat(0.5)).with_membership(0b10),
            ))
            .id();

        let request = down_ray(Vec3::new(0.0, 3.0, 0.0), 10.0);
        let hit = HeadlessBackend::raycast(&mut world, &request).unwrap();
        assert_eq!(hit.entity, Some(crate_box));
        assert_eq!(hit.distance, 2.0);
        assert_eq!(hit.point, Vec3::new(0.0, 1.0, 0.0));

        let masked = HeadlessBackend::raycast(&mut world, &request.with_mask(0b01)).unwrap();
        assert_eq!(masked.entity, Some(floor));

        let excluded = HeadlessBackend::raycast(&mut world, &request.excluding(crate_box)).unwrap();
        assert_eq!(excluded.entity, Some(floor));
    }

    #[test]
    fn body_step_applies_force_gravity_and_damping() {
        let mut body = HeadlessBody {
            force: Vec3::new(2.0, 0.0, 0.0),
            mass: 2.0,
            ..default()
        };
        let mut position = Vec3::ZERO;

        body.step(&mut position, Vec3::new(0.0, -10.0, 0.0), 0.5);

        assert_eq!(body.velocity, Vec3::new(0.5, -5.0, 0.0));
        assert_eq!(position, Vec3::new(0.25, -2.5, 0.0));
        assert_eq!(body.force, Vec3::ZERO);

        body.damping = 2.0;
        body.step(&mut position, Vec3::ZERO, 0.5);
        assert_eq!(body.velocity, Vec3::new(0.25, -2.5, 0.0));
    }

    #[test]
    fn kinematic_body_ignores_forces() {
        let mut body = HeadlessBody::kinematic(Vec3::X);
        body.force = Vec3::splat(100.0);
        let mut position = Vec3::ZERO;

        body.step(&mut position, Vec3::new(0.0, -10.0, 0.0), 1.0);

        assert_eq!(body.velocity, Vec3::X);
        assert_eq!(position, Vec3::X);
    }

    #[test]
    fn integrate_uses_fixed_timestep() {
        let mut world = World::new();
        world.insert_resource(Time::<Fixed>::from_hz(10.0));
        world.insert_resource(HeadlessGravity(Vec3::ZERO));
        let body = world
            .spawn((
                Transform::default(),
                HeadlessBody {
                    velocity: Vec3::new(1.0, 0.0, 0.0),
                    ..default()
                },
            ))
            .id();

        integrate_headless_bodies(&mut world);

        let translation = world.get::<Transform>(body).unwrap().translation;
        assert!((translation.x - 0.1).abs() < 1e-6);
    }
}
