//! Movement accumulator.
//!
//! Drives horizontal velocity toward `input * move_speed` with a bounded
//! acceleration. Vertical velocity is never touched here; the ride spring,
//! gravity and jumps own it.

use bevy::prelude::*;

use crate::config::RiderConfig;
use crate::intent::INPUT_DEADZONE_SQUARED;

/// How much the current input agrees with the previous one, in `[-1, 1]`.
///
/// Returns `1.0` (same direction) when either input is zero, so starting
/// from standstill never counts as a reversal.
pub fn direction_alignment(previous: Vec3, input: Vec3) -> f32 {
    let previous = previous.normalize_or_zero();
    let input = input.normalize_or_zero();
    if previous == Vec3::ZERO || input == Vec3::ZERO {
        return 1.0;
    }
    previous.dot(input).clamp(-1.0, 1.0)
}

/// Acceleration authority multiplier for this step.
///
/// `1` grounded or `air_control_multiplier` airborne, times the
/// acceleration-direction curve evaluated at the input alignment.
pub fn control_multiplier(config: &RiderConfig, grounded: bool, previous: Vec3, input: Vec3) -> f32 {
    let base = if grounded {
        1.0
    } else {
        config.air_control_multiplier
    };
    let turn = config
        .accel_direction_curve
        .as_ref()
        .map_or(1.0, |curve| curve.evaluate(direction_alignment(previous, input)));
    base * turn
}

/// Acceleration needed to reach the target velocity in one step, clamped to
/// `max_acceleration`.
///
/// Returns zero for input inside the dead zone and for a non-positive or
/// non-finite `dt`.
pub fn movement_acceleration(
    input: Vec3,
    velocity: Vec3,
    move_speed: f32,
    max_acceleration: f32,
    dt: f32,
) -> Vec3 {
    if !(dt > 0.0) || !dt.is_finite() || input.length_squared() < INPUT_DEADZONE_SQUARED {
        return Vec3::ZERO;
    }

    let mut target = input * move_speed;
    target.y = velocity.y;

    ((target - velocity) / dt).clamp_length_max(max_acceleration.max(0.0))
}
