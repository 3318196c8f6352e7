//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! Rapier should run in the fixed schedule
//! (`RapierPhysicsPlugin::default().in_fixed_schedule()`) so that every
//! rider step is followed by exactly one physics step.

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{RaycastRequest, RiderPhysicsBackend};
use crate::collision::CollisionData;
use crate::GroundRiderSet;

/// Rapier3D physics backend for the ground rider.
///
/// Forces are written into [`ExternalForce`], which Rapier keeps applying
/// until it is changed. The backend records its own contribution in
/// [`RiderAppliedForce`] and removes it at the start of the next step, so
/// forces set by user code are left alone.
pub struct Rapier3dBackend;

impl RiderPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn raycast(world: &mut World, request: &RaycastRequest) -> Option<CollisionData> {
        let mut state: SystemState<ReadRapierContext<'static, 'static>> = SystemState::new(world);
        let rapier_context = state.get(world);
        let context = rapier_context.single().ok()?;

        let mut filter = QueryFilter::default().exclude_sensors().groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(request.mask),
        ));
        if let Some(exclude) = request.exclude {
            filter = filter.exclude_rigid_body(exclude);
        }

        let (collider, hit) = context.cast_ray_and_get_normal(
            request.origin,
            request.direction,
            request.max_distance,
            true,
            filter,
        )?;

        Some(CollisionData::new(
            hit.time_of_impact,
            hit.normal,
            hit.point,
            Some(body_entity(world, collider)),
        ))
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| world.get::<GlobalTransform>(entity).map(|t| t.translation()))
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
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn set_damping(world: &mut World, entity: Entity, damping: f32) {
        if let Some(mut body_damping) = world.get_mut::<Damping>(entity) {
            if body_damping.linear_damping != damping {
                body_damping.linear_damping = damping;
            }
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        add_rider_force(
            world,
            entity,
            ExternalForce {
                force,
                torque: Vec3::ZERO,
            },
        );
    }

    fn apply_force_at_point(world: &mut World, entity: Entity, force: Vec3, point: Vec3) {
        let center_of_mass = world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.local_center_of_mass)
            .unwrap_or(Vec3::ZERO);
        let center_of_mass = world
            .get::<Transform>(entity)
            .map(|t| t.transform_point(center_of_mass))
            .unwrap_or(center_of_mass);

        add_rider_force(
            world,
            entity,
            ExternalForce::at_point(force, point, center_of_mass),
        );
    }

    fn apply_velocity_change(world: &mut World, entity: Entity, delta_velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel += delta_velocity;
        }
    }

    fn is_dynamic(world: &World, entity: Entity) -> bool {
        world
            .get::<RigidBody>(entity)
            .is_some_and(|body| matches!(body, RigidBody::Dynamic))
    }

    fn get_mass(world: &World, entity: Entity) -> f32 {
        world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|&mass| mass > 0.0 && mass.is_finite())
            .unwrap_or(1.0)
    }
}

/// The rigid body a collider belongs to.
///
/// Rapier attaches a collider to its nearest [`RigidBody`] ancestor, so a
/// platform built from child colliders reports its body entity. Colliders
/// with no body above them are returned as is.
pub fn body_entity(world: &World, collider: Entity) -> Entity {
    let mut current = collider;
    loop {
        if world.get::<RigidBody>(current).is_some() {
            return current;
        }
        match world.get::<ChildOf>(current) {
            Some(child_of) => current = child_of.parent(),
            None => return collider,
        }
    }
}

/// Forces the rider systems added to an entity's [`ExternalForce`] this step.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct RiderAppliedForce {
    pub force: Vec3,
    pub torque: Vec3,
}

fn add_rider_force(world: &mut World, entity: Entity, added: ExternalForce) {
    let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
        return;
    };

    if !entity_mut.contains::<ExternalForce>() {
        entity_mut.insert(ExternalForce::default());
    }
    if !entity_mut.contains::<RiderAppliedForce>() {
        entity_mut.insert(RiderAppliedForce::default());
    }

    if let Some(mut ext_force) = entity_mut.get_mut::<ExternalForce>() {
        ext_force.force += added.force;
        ext_force.torque += added.torque;
    }
    if let Some(mut applied) = entity_mut.get_mut::<RiderAppliedForce>() {
        applied.force += added.force;
        applied.torque += added.torque;
    }
}

/// Plugin that sets up Rapier3D-specific systems for the ground rider.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<RiderAppliedForce>();

        app.add_systems(
            FixedUpdate,
            clear_rider_forces.in_set(GroundRiderSet::Prepare),
        );
    }
}

/// Remove last step's rider forces from [`ExternalForce`].
///
/// This restores `ExternalForce` to the "external-only" state before the
/// rider systems add this step's forces.
pub fn clear_rider_forces(mut q: Query<(&mut ExternalForce, &mut RiderAppliedForce)>) {
    for (mut ext_force, mut applied) in &mut q {
        if *applied == RiderAppliedForce::default() {
            continue;
        }
        ext_force.force -= applied.force;
        ext_force.torque -= applied.torque;
        *applied = RiderAppliedForce::default();
    }
}

/// Bundle for creating a ground rider with Rapier3D physics.
///
/// Provides the rigid body, velocity tracking, external forces, axis locking,
/// damping and mass properties the backend reads and writes. Add a collider
/// and a [`RiderConfig`](crate::config::RiderConfig) alongside it.
///
/// Rapier's world gravity should match `RiderConfig::gravity`; the fall
/// gravity modulator scales the configured value.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use ground_rider::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         RiderConfig::default(),
///         Rapier3dRiderBundle::new(),
///         Collider::capsule_y(0.3, 0.3),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`], the rider stays upright
/// - `damping`: linear 0 (the damping modulator owns it), angular 1
#[derive(Bundle)]
pub struct Rapier3dRiderBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    /// Rider forces are added here and removed again next step.
    pub external_force: ExternalForce,
    pub applied_force: RiderAppliedForce,
    pub locked_axes: LockedAxes,
    pub damping: Damping,
    /// Computed by Rapier from the collider; read for mass and center of mass.
    pub mass_properties: ReadMassProperties,
}

impl Default for Rapier3dRiderBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dRiderBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            applied_force: RiderAppliedForce::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            mass_properties: ReadMassProperties::default(),
        }
    }

    /// Set the rigid body type.
    ///
    /// Kinematic bodies ignore the rider's forces; only the probes and
    /// velocity writes have an effect.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
