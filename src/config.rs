//! Rider configuration.
//!
//! [`RiderConfig`] holds every tunable of the ground rider. It is set once
//! when the character is spawned and the controller never writes to it.
//! Optional behaviours (reversal boost, coyote time, fall gravity, speed
//! damping, wall redirect) are switched on and off here rather than through
//! separate controller types.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::{CurveError, ResponseCurve};
use crate::intent::RiderIntent;
use crate::state::GroundRider;

/// Errors reported by [`RiderConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("`{field}` must be within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("max_ray_distance ({max_ray_distance}) is shorter than ride_height ({ride_height})")]
    RayTooShort {
        ride_height: f32,
        max_ray_distance: f32,
    },
    #[error("invalid `{field}`")]
    Curve {
        field: &'static str,
        #[source]
        source: CurveError,
    },
}

/// Tunable parameters for a ground rider.
///
/// Spawning this component also inserts [`GroundRider`] and [`RiderIntent`].
///
/// # Example
///
/// ```rust
/// use ground_rider::prelude::*;
///
/// let config = RiderConfig::default()
///     .with_ride_height(0.8)
///     .with_spring(120.0, 12.0)
///     .with_coyote_time(0.1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[require(GroundRider, RiderIntent)]
#[serde(default)]
pub struct RiderConfig {
    // === Ride spring ===
    /// Target distance between the probe origin and the ground.
    pub ride_height: f32,
    /// Spring stiffness (force per meter of height error).
    pub spring_strength: f32,
    /// Damping on the closing velocity along the probe ray.
    pub spring_damper: f32,
    /// Absolute limit on the spring force.
    pub max_spring_force: f32,

    // === Ground probe ===
    /// Probe origin in the body's local space.
    pub ray_offset: Vec3,
    /// Probe length. Ground further away than this means airborne.
    pub max_ray_distance: f32,
    /// Collision layers the probes can hit.
    pub ray_mask: u32,

    // === Movement ===
    /// Target horizontal speed at full input.
    pub move_speed: f32,
    /// Horizontal speed that maps to 1.0 on the damping curve.
    pub max_speed: f32,
    /// Maximum acceleration toward the target velocity.
    pub acceleration: f32,
    /// Acceleration multiplier while airborne.
    pub air_control_multiplier: f32,
    /// Acceleration multiplier over `dot(previous_input, input)`, from -1
    /// (full reversal) to 1 (same direction). `None` means a flat 1.0.
    pub accel_direction_curve: Option<ResponseCurve>,

    // === Jump ===
    /// Upward velocity change applied by a jump.
    pub jump_force: f32,
    /// Minimum time between two jumps.
    pub jump_cooldown: f32,
    /// Grace window after the last grounded step during which a jump is
    /// still allowed.
    pub coyote_time: f32,
    /// Extra reach, beyond `ride_height`, of the confirmation probe cast on a
    /// jump request outside the coyote window.
    pub ground_check_distance: f32,
    /// How long after a jump the damping modulator keeps airborne damping.
    pub jump_damping_ignore_duration: f32,

    // === Damping ===
    /// Damping used while airborne or right after a jump.
    pub airborne_damping: f32,
    /// Grounded damping over normalized horizontal speed. `None` leaves the
    /// body's damping untouched.
    pub damping_curve: Option<ResponseCurve>,

    // === Gravity ===
    /// World gravity, used for the fall gravity modulator.
    pub gravity: Vec3,
    /// Gravity multiplier while falling. 1.0 or less disables it.
    pub fall_gravity_multiplier: f32,
    /// Downward speed that counts as falling rather than hanging at the apex.
    pub fall_velocity_threshold: f32,

    // === Wall redirect ===
    /// Remove the velocity component pushing into walls while airborne.
    pub wall_redirect: bool,
    /// Length of the wall probe along the horizontal velocity.
    pub wall_check_distance: f32,
    /// Surfaces with `|dot(normal, up)|` below this are walls.
    pub wall_slide_threshold: f32,
}

impl Default for RiderConfig {
    fn default() -> Self {
        Self {
            ride_height: 1.0,
            spring_strength: 50.0,
            spring_damper: 5.0,
            max_spring_force: 100.0,

            ray_offset: Vec3::ZERO,
            max_ray_distance: 2.0,
            ray_mask: u32::MAX,

            move_speed: 8.0,
            max_speed: 10.0,
            acceleration: 200.0,
            air_control_multiplier: 0.5,
            accel_direction_curve: Some(ResponseCurve::reversal_boost()),

            jump_force: 10.0,
            jump_cooldown: 0.2,
            coyote_time: 0.15,
            ground_check_distance: 0.1,
            jump_damping_ignore_duration: 0.2,

            airborne_damping: 0.0,
            damping_curve: Some(ResponseCurve::speed_damping()),

            gravity: Vec3::new(0.0, -9.81, 0.0),
            fall_gravity_multiplier: 2.0,
            fall_velocity_threshold: 0.01,

            wall_redirect: true,
            wall_check_distance: 0.6,
            wall_slide_threshold: 0.3,
        }
    }
}

impl RiderConfig {
    /// The bare rider: ride spring, clamped movement and a grounded-only jump.
    ///
    /// No reversal boost, coyote time, fall gravity, damping modulation or
    /// wall redirect.
    pub fn basic() -> Self {
        Self {
            air_control_multiplier: 1.0,
            accel_direction_curve: None,
            coyote_time: 0.0,
            jump_damping_ignore_duration: 0.0,
            damping_curve: None,
            fall_gravity_multiplier: 1.0,
            wall_redirect: false,
            ..default()
        }
    }

    /// Reach of the confirmation probe used by the jump check.
    #[inline]
    pub fn jump_probe_distance(&self) -> f32 {
        self.ride_height + self.ground_check_distance
    }

    /// Builder: set ride height.
    pub fn with_ride_height(mut self, height: f32) -> Self {
        self.ride_height = height;
        self
    }

    /// Builder: set spring strength and damper.
    pub fn with_spring(mut self, strength: f32, damper: f32) -> Self {
        self.spring_strength = strength;
        self.spring_damper = damper;
        self
    }

    /// Builder: set the spring force limit.
    pub fn with_max_spring_force(mut self, force: f32) -> Self {
        self.max_spring_force = force;
        self
    }

    /// Builder: set probe origin offset and length.
    pub fn with_ray(mut self, offset: Vec3, max_distance: f32) -> Self {
        self.ray_offset = offset;
        self.max_ray_distance = max_distance;
        self
    }

    /// Builder: set the collision layers the probes can hit.
    pub fn with_ray_mask(mut self, mask: u32) -> Self {
        self.ray_mask = mask;
        self
    }

    /// Builder: set move speed and acceleration.
    pub fn with_movement(mut self, move_speed: f32, acceleration: f32) -> Self {
        self.move_speed = move_speed;
        self.acceleration = acceleration;
        self
    }

    /// Builder: set the speed normalization for the damping curve.
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Builder: set air control multiplier.
    pub fn with_air_control(mut self, multiplier: f32) -> Self {
        self.air_control_multiplier = multiplier;
        self
    }

    /// Builder: set (or clear) the acceleration-direction curve.
    pub fn with_accel_direction_curve(mut self, curve: Option<ResponseCurve>) -> Self {
        self.accel_direction_curve = curve;
        self
    }

    /// Builder: set jump velocity change and cooldown.
    pub fn with_jump(mut self, force: f32, cooldown: f32) -> Self {
        self.jump_force = force;
        self.jump_cooldown = cooldown;
        self
    }

    /// Builder: set coyote time.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.coyote_time = time;
        self
    }

    /// Builder: set the confirmation probe reach beyond ride height.
    pub fn with_ground_check_distance(mut self, distance: f32) -> Self {
        self.ground_check_distance = distance;
        self
    }

    /// Builder: set the post-jump damping suppression window.
    pub fn with_jump_damping_ignore_duration(mut self, duration: f32) -> Self {
        self.jump_damping_ignore_duration = duration;
        self
    }

    /// Builder: set the airborne damping value.
    pub fn with_airborne_damping(mut self, damping: f32) -> Self {
        self.airborne_damping = damping;
        self
    }

    /// Builder: set (or clear) the grounded damping curve.
    pub fn with_damping_curve(mut self, curve: Option<ResponseCurve>) -> Self {
        self.damping_curve = curve;
        self
    }

    /// Builder: set world gravity.
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Builder: set fall gravity multiplier.
    pub fn with_fall_gravity(mut self, multiplier: f32) -> Self {
        self.fall_gravity_multiplier = multiplier;
        self
    }

    /// Builder: enable wall redirect with the given probe length and threshold.
    pub fn with_wall_redirect(mut self, check_distance: f32, slide_threshold: f32) -> Self {
        self.wall_redirect = true;
        self.wall_check_distance = check_distance;
        self.wall_slide_threshold = slide_threshold;
        self
    }

    /// Builder: disable wall redirect.
    pub fn without_wall_redirect(mut self) -> Self {
        self.wall_redirect = false;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("ride_height", self.ride_height)?;
        positive("max_ray_distance", self.max_ray_distance)?;
        if self.max_ray_distance < self.ride_height {
            return Err(ConfigError::RayTooShort {
                ride_height: self.ride_height,
                max_ray_distance: self.max_ray_distance,
            });
        }

        for (field, value) in [
            ("spring_strength", self.spring_strength),
            ("spring_damper", self.spring_damper),
            ("max_spring_force", self.max_spring_force),
            ("move_speed", self.move_speed),
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("air_control_multiplier", self.air_control_multiplier),
            ("jump_force", self.jump_force),
            ("jump_cooldown", self.jump_cooldown),
            ("coyote_time", self.coyote_time),
            ("ground_check_distance", self.ground_check_distance),
            ("jump_damping_ignore_duration", self.jump_damping_ignore_duration),
            ("airborne_damping", self.airborne_damping),
            ("fall_gravity_multiplier", self.fall_gravity_multiplier),
            ("fall_velocity_threshold", self.fall_velocity_threshold),
        ] {
            non_negative(field, value)?;
        }

        if self.wall_redirect {
            positive("wall_check_distance", self.wall_check_distance)?;
            if !(0.0..=1.0).contains(&self.wall_slide_threshold) {
                return Err(ConfigError::OutOfUnitRange {
                    field: "wall_slide_threshold",
                    value: self.wall_slide_threshold,
                });
            }
        }

        if let Some(curve) = &self.accel_direction_curve {
            curve.validate().map_err(|source| ConfigError::Curve {
                field: "accel_direction_curve",
                source,
            })?;
        }
        if let Some(curve) = &self.damping_curve {
            curve.validate().map_err(|source| ConfigError::Curve {
                field: "damping_curve",
                source,
            })?;
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    // Written negated so NaN fails too.
    if !(value > 0.0) || !value.is_finite() {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(RiderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn basic_disables_optional_features() {
        let config = RiderConfig::basic();

        assert_eq!(config.validate(), Ok(()));
        assert!(config.accel_direction_curve.is_none());
        assert!(config.damping_curve.is_none());
        assert!(!config.wall_redirect);
        assert_eq!(config.coyote_time, 0.0);
        assert_eq!(config.fall_gravity_multiplier, 1.0);
    }

    #[test]
    fn builders_set_fields() {
        let config = RiderConfig::default()
            .with_ride_height(0.5)
            .with_spring(300.0, 20.0)
            .with_max_spring_force(50.0)
            .with_movement(6.0, 90.0)
            .with_jump(7.0, 0.3)
            .with_coyote_time(0.2)
            .without_wall_redirect();

        assert_eq!(config.ride_height, 0.5);
        assert_eq!(config.spring_strength, 300.0);
        assert_eq!(config.spring_damper, 20.0);
        assert_eq!(config.max_spring_force, 50.0);
        assert_eq!(config.move_speed, 6.0);
        assert_eq!(config.acceleration, 90.0);
        assert_eq!(config.jump_force, 7.0);
        assert_eq!(config.jump_cooldown, 0.3);
        assert_eq!(config.coyote_time, 0.2);
        assert!(!config.wall_redirect);
        assert_eq!(config.jump_probe_distance(), 0.6);
    }

    #[test]
    fn rejects_non_positive_ride_height() {
        let err = RiderConfig::default().with_ride_height(0.0).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonPositive {
                field: "ride_height",
                value: 0.0
            }
        );
    }

    #[test]
    fn rejects_ray_shorter_than_ride_height() {
        let err = RiderConfig::default()
            .with_ride_height(1.5)
            .with_ray(Vec3::ZERO, 1.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::RayTooShort { .. }));
    }

    #[test]
    fn rejects_negative_and_nan() {
        let err = RiderConfig::default().with_spring(-1.0, 5.0).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Negative {
                field: "spring_strength",
                ..
            }
        ));

        let err = RiderConfig::default().with_air_control(f32::NAN).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Negative {
                field: "air_control_multiplier",
                ..
            }
        ));
    }

    #[test]
    fn wall_threshold_only_checked_when_enabled() {
        let enabled = RiderConfig::default().with_wall_redirect(0.5, 1.5);
        assert!(matches!(
            enabled.validate(),
            Err(ConfigError::OutOfUnitRange { .. })
        ));

        let mut disabled = enabled.without_wall_redirect();
        disabled.wall_check_distance = 0.0;
        assert_eq!(disabled.validate(), Ok(()));
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let config: RiderConfig =
            serde_json::from_str(r#"{"ride_height":0.75,"wall_redirect":false}"#).unwrap();

        assert_eq!(config.ride_height, 0.75);
        assert!(!config.wall_redirect);
        assert_eq!(config.move_speed, RiderConfig::default().move_speed);
    }
}
