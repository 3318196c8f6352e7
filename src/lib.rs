//! # `ground_rider`
//!
//! A 3D floating rigidbody locomotion controller with physics backend abstraction.
//!
//! This crate provides a grounded character controller that:
//! - Floats above ground on a spring-damper ("ride spring") along a downward probe
//! - Turns 2D stick input into acceleration-limited horizontal motion
//! - Gates jumps by cooldown and coyote time
//! - Modulates fall gravity and velocity damping
//! - Slides airborne characters along walls instead of sticking to them
//! - Exposes a serializable [`KinematicState`](state::KinematicState) snapshot
//!   for prediction and reconciliation
//!
//! ## Architecture
//!
//! The controller uses a **floating rigidbody** approach where:
//! 1. A dynamic rigidbody handles collisions normally
//! 2. One raycast per step decides whether the rider is grounded
//! 3. A spring-damper applies forces to hold the ride height
//! 4. Movement, gravity and damping are layered on as forces and coefficients
//!
//! Every step runs in `FixedUpdate` and every timer is measured on the
//! rider's own clock, so the same inputs from the same state replay the same
//! trajectory.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use ground_rider::prelude::*;
//!
//! let mut app = App::new();
//! app.add_plugins(GroundRiderPlugin::<HeadlessBackend>::default());
//!
//! // Spawning a config pulls in `GroundRider` and `RiderIntent`.
//! let rider = app
//!     .world_mut()
//!     .spawn((Transform::from_xyz(0.0, 1.0, 0.0), HeadlessBody::default(), RiderConfig::default()))
//!     .id();
//!
//! app.world_mut()
//!     .get_mut::<RiderIntent>(rider)
//!     .unwrap()
//!     .apply_input_step(Vec2::new(1.0, 0.0), 1.0 / 60.0);
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod curve;
pub mod detection;
pub mod headless;
pub mod intent;
pub mod jump;
pub mod modulators;
pub mod movement;
pub mod state;
pub mod suspension;
pub mod systems;
pub mod wall;

#[cfg(feature = "rapier3d")]
pub mod rapier;

#[cfg(feature = "debug-draw")]
pub mod debug;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{RaycastRequest, RiderPhysicsBackend};
    pub use crate::collision::CollisionData;
    pub use crate::config::{ConfigError, RiderConfig};
    pub use crate::curve::{CurveError, Interpolation, ResponseCurve};
    pub use crate::detection::GroundContact;
    pub use crate::headless::{HeadlessBackend, HeadlessBody, HeadlessCollider, HeadlessGravity};
    pub use crate::intent::RiderIntent;
    pub use crate::jump::{jump, JumpPhase};
    pub use crate::state::{
        get_state, set_state, Airborne, GroundRider, Grounded, KinematicState, TouchingWall,
    };
    pub use crate::{GroundRiderPlugin, GroundRiderSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dRiderBundle};
}

/// Ordered phases of one rider step, chained in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroundRiderSet {
    /// Config validation and backend bookkeeping.
    Prepare,
    /// Clock advance and ground probe.
    Sensors,
    /// Buffered jump requests, checked against this step's contact.
    Jump,
    /// Ride spring and movement.
    Forces,
    /// Fall gravity, damping, wall redirect and state markers.
    Modulators,
}

/// Main plugin for the ground rider.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (raycasting, force application, etc.).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With the Rapier3D backend:
/// ```rust,ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use ground_rider::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(GroundRiderPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct GroundRiderPlugin<B: backend::RiderPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::RiderPhysicsBackend> Default for GroundRiderPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::RiderPhysicsBackend> Plugin for GroundRiderPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::RiderConfig>();
        app.register_type::<curve::ResponseCurve>();
        app.register_type::<curve::Interpolation>();
        app.register_type::<intent::RiderIntent>();
        app.register_type::<state::GroundRider>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();
        app.register_type::<state::KinematicState>();
        app.register_type::<detection::GroundContact>();
        app.register_type::<jump::JumpPhase>();

        app.configure_sets(
            FixedUpdate,
            (
                GroundRiderSet::Prepare,
                GroundRiderSet::Sensors,
                GroundRiderSet::Jump,
                GroundRiderSet::Forces,
                GroundRiderSet::Modulators,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::validate_rider_configs.in_set(GroundRiderSet::Prepare),
                systems::update_ground_probe::<B>.in_set(GroundRiderSet::Sensors),
                systems::apply_jump_requests::<B>.in_set(GroundRiderSet::Jump),
                (systems::apply_ride_spring::<B>, systems::apply_movement::<B>)
                    .chain()
                    .in_set(GroundRiderSet::Forces),
                (
                    systems::apply_fall_gravity::<B>,
                    systems::apply_damping::<B>,
                    systems::apply_wall_redirect::<B>,
                    systems::sync_state_markers,
                )
                    .chain()
                    .in_set(GroundRiderSet::Modulators),
            ),
        );

        #[cfg(feature = "debug-draw")]
        app.add_systems(Update, debug::draw_rider_gizmos);
    }
}
