//! Rider state.
//!
//! - [`GroundRider`]: the controller's own mutable state, updated once per
//!   step and on jump events.
//! - [`Grounded`] / [`Airborne`] / [`TouchingWall`]: marker components kept
//!   in sync with [`GroundRider`] for use in queries.
//! - [`KinematicState`]: the minimal replayable snapshot, read and written
//!   through [`get_state`] and [`set_state`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::backend::RiderPhysicsBackend;
use crate::detection::GroundContact;

/// Running state of a ground rider.
///
/// Inserted automatically alongside [`RiderConfig`](crate::config::RiderConfig).
/// All times are measured on the rider's own clock, which advances by one
/// fixed timestep at the start of every step. The clock and timers are `f64`
/// so a long-lived rider keeps sub-step resolution.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct GroundRider {
    pub(crate) contact: GroundContact,
    pub(crate) clock: f64,
    pub(crate) last_grounded_time: Option<f64>,
    pub(crate) last_jump_time: Option<f64>,
    pub(crate) jump_damping_suppress_until: f64,
    pub(crate) last_spring_force: f32,
    pub(crate) last_control_multiplier: f32,
    pub(crate) wall_normal: Option<Vec3>,
}

impl Default for GroundRider {
    fn default() -> Self {
        Self {
            contact: GroundContact::default(),
            clock: 0.0,
            last_grounded_time: None,
            last_jump_time: None,
            jump_damping_suppress_until: 0.0,
            last_spring_force: 0.0,
            last_control_multiplier: 1.0,
            wall_normal: None,
        }
    }
}

impl GroundRider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this step's ground probe found ground.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.contact.grounded
    }

    /// This step's ground probe result.
    #[inline]
    pub fn contact(&self) -> &GroundContact {
        &self.contact
    }

    /// Current time on the rider's clock.
    #[inline]
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Align the rider's clock with an external simulation time.
    pub fn set_clock(&mut self, now: f64) {
        self.clock = now;
    }

    pub fn last_grounded_time(&self) -> Option<f64> {
        self.last_grounded_time
    }

    pub fn last_jump_time(&self) -> Option<f64> {
        self.last_jump_time
    }

    pub fn jump_damping_suppress_until(&self) -> f64 {
        self.jump_damping_suppress_until
    }

    /// Whether the post-jump damping suppression window is open.
    #[inline]
    pub fn damping_suppressed(&self) -> bool {
        self.clock < self.jump_damping_suppress_until
    }

    /// Spring force magnitude applied on the last grounded step (0 when airborne).
    pub fn last_spring_force(&self) -> f32 {
        self.last_spring_force
    }

    /// Control multiplier used by the last movement evaluation.
    pub fn last_control_multiplier(&self) -> f32 {
        self.last_control_multiplier
    }

    /// Normal of the wall hit by the last wall probe, if any.
    pub fn wall_normal(&self) -> Option<Vec3> {
        self.wall_normal
    }

    pub(crate) fn advance_clock(&mut self, dt: f32) {
        self.clock += f64::from(dt);
    }

    /// Store this step's probe result.
    pub(crate) fn record_contact(&mut self, contact: GroundContact) {
        if contact.grounded {
            self.last_grounded_time = Some(self.clock);
        } else {
            self.last_spring_force = 0.0;
        }
        self.contact = contact;
    }
}

/// Marker component indicating the rider is grounded.
///
/// Mutually exclusive with [`Airborne`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the rider is airborne.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component added while the wall redirector is sliding the rider
/// along a wall.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct TouchingWall {
    /// Normal of the wall surface.
    pub normal: Vec3,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self { normal: Vec3::X }
    }
}

impl TouchingWall {
    pub fn new(normal: Vec3) -> Self {
        Self { normal }
    }
}

/// Minimal replayable state of a rider's body.
///
/// `yaw` is the rotation about world +Y in radians.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
}

impl KinematicState {
    pub fn new(position: Vec3, velocity: Vec3, yaw: f32) -> Self {
        Self {
            position,
            velocity,
            yaw,
        }
    }

    /// Component-wise comparison within `tolerance`.
    pub fn abs_diff_eq(&self, other: &KinematicState, tolerance: f32) -> bool {
        self.position.abs_diff_eq(other.position, tolerance)
            && self.velocity.abs_diff_eq(other.velocity, tolerance)
            && (self.yaw - other.yaw).abs() <= tolerance
    }
}

/// Yaw (rotation about +Y) of a rotation, in radians.
#[inline]
pub fn yaw_of(rotation: Quat) -> f32 {
    rotation.to_euler(EulerRot::YXZ).0
}

/// Replace the yaw of `rotation`, keeping its pitch and roll.
#[inline]
pub fn with_yaw(rotation: Quat, yaw: f32) -> Quat {
    let (_, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll)
}

/// Snapshot the body of `entity`.
///
/// Pure read; returns `None` if the entity does not exist.
pub fn get_state<B: RiderPhysicsBackend>(world: &World, entity: Entity) -> Option<KinematicState> {
    if !world.entities().contains(entity) {
        return None;
    }
    Some(KinematicState {
        position: B::get_position(world, entity),
        velocity: B::get_velocity(world, entity),
        yaw: yaw_of(B::get_rotation(world, entity)),
    })
}

/// Overwrite the body of `entity` with `state`.
///
/// Used for reconciliation: whatever the simulation computed is replaced.
/// The rider's running state (timers, last contact) is left alone and is
/// refreshed by the next step's probe.
pub fn set_state<B: RiderPhysicsBackend>(world: &mut World, entity: Entity, state: &KinematicState) {
    if !world.entities().contains(entity) {
        return;
    }
    B::set_position(world, entity, state.position);
    B::set_velocity(world, entity, state.velocity);
    let rotation = B::get_rotation(world, entity);
    B::set_rotation(world, entity, with_yaw(rotation, state.yaw));
    trace!(?entity, ?state, "rider state overwritten");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessBackend, HeadlessBody};

    #[test]
    fn default_rider_is_airborne() {
        let rider = GroundRider::default();
        assert!(!rider.is_grounded());
        assert_eq!(rider.last_grounded_time(), None);
        assert_eq!(rider.last_jump_time(), None);
        assert!(!rider.damping_suppressed());
    }

    #[test]
    fn record_contact_tracks_grounded_time() {
        let mut rider = GroundRider::default();
        rider.advance_clock(0.5);
        rider.record_contact(GroundContact {
            grounded: true,
            distance: 1.0,
            ..default()
        });
        assert!(rider.is_grounded());
        assert_eq!(rider.last_grounded_time(), Some(0.5));

        rider.advance_clock(0.5);
        rider.record_contact(GroundContact::default());
        assert!(!rider.is_grounded());
        assert_eq!(rider.last_grounded_time(), Some(0.5));
        assert_eq!(rider.now(), 1.0);
    }

    #[test]
    fn yaw_helpers_keep_pitch() {
        let rotation = Quat::from_euler(EulerRot::YXZ, 0.3, 0.2, 0.0);
        let updated = with_yaw(rotation, -1.1);

        let (yaw, pitch, _) = updated.to_euler(EulerRot::YXZ);
        assert!((yaw + 1.1).abs() < 1e-5);
        assert!((pitch - 0.2).abs() < 1e-5);
        assert!((yaw_of(updated) + 1.1).abs() < 1e-5);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut world = World::new();
        let entity = world.spawn((Transform::default(), HeadlessBody::default())).id();
        let state = KinematicState::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.5, 2.0), 1.2);

        set_state::<HeadlessBackend>(&mut world, entity, &state);
        let read = get_state::<HeadlessBackend>(&world, entity).unwrap();

        assert!(read.abs_diff_eq(&state, 1e-5), "{read:?} != {state:?}");
    }

    #[test]
    fn get_set_get_is_a_no_op() {
        let mut world = World::new();
        let entity = world
            .spawn((
                Transform::from_xyz(0.5, 1.0, -2.0).with_rotation(Quat::from_rotation_y(0.7)),
                HeadlessBody {
                    velocity: Vec3::new(3.0, -1.0, 0.0),
                    ..default()
                },
            ))
            .id();

        let before = get_state::<HeadlessBackend>(&world, entity).unwrap();
        set_state::<HeadlessBackend>(&mut world, entity, &before);
        let after = get_state::<HeadlessBackend>(&world, entity).unwrap();

        assert!(after.abs_diff_eq(&before, 1e-6));
    }

    #[test]
    fn missing_entity_has_no_state() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        world.despawn(entity);

        assert_eq!(get_state::<HeadlessBackend>(&world, entity), None);
        // No panic
        set_state::<HeadlessBackend>(&mut world, entity, &KinematicState::default());
    }

    #[test]
    fn kinematic_state_wire_shape() {
        let state = KinematicState::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, 0.5);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"position":[1.0,2.0,3.0],"velocity":[0.0,0.0,0.0],"yaw":0.5}"#
        );
        let back: KinematicState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
