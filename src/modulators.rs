//! Fall gravity and damping modulators.

use bevy::prelude::*;

use crate::config::RiderConfig;

/// Extra acceleration applied while falling.
///
/// Active only when airborne and moving down faster than
/// `fall_velocity_threshold`, so the apex of a jump is left alone. A
/// multiplier of 1 adds nothing.
pub fn fall_gravity_acceleration(config: &RiderConfig, grounded: bool, velocity: Vec3) -> Vec3 {
    if grounded || velocity.y >= -config.fall_velocity_threshold {
        return Vec3::ZERO;
    }
    config.gravity * (config.fall_gravity_multiplier - 1.0)
}

/// Horizontal speed as a fraction of `max_speed`, in `[0, 1]`.
pub fn normalized_speed(config: &RiderConfig, velocity: Vec3) -> f32 {
    if !(config.max_speed > 0.0) {
        return 1.0;
    }
    (velocity.xz().length() / config.max_speed).clamp(0.0, 1.0)
}

/// Damping coefficient for this step, or `None` when damping modulation is
/// disabled and the body keeps whatever damping it has.
pub fn damping_coefficient(
    config: &RiderConfig,
    grounded: bool,
    suppressed: bool,
    velocity: Vec3,
) -> Option<f32> {
    let curve = config.damping_curve.as_ref()?;
    if !grounded || suppressed {
        return Some(config.airborne_damping);
    }
    Some(curve.evaluate(normalized_speed(config, velocity)))
}
