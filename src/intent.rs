//! Movement intent.
//!
//! [`RiderIntent`] is the only thing an input source writes. The controller
//! never polls devices: an input system (or a network replay driver) calls
//! [`RiderIntent::set_move`] / [`RiderIntent::apply_input_step`] and
//! [`RiderIntent::request_jump`] between steps.

use bevy::prelude::*;

/// Input magnitudes (squared) below this are treated as no input.
pub const INPUT_DEADZONE_SQUARED: f32 = 0.01;

/// Desired movement for a ground rider.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use ground_rider::prelude::*;
///
/// let mut intent = RiderIntent::new();
/// intent.set_move(Vec3::new(3.0, 0.0, 4.0));
/// assert!((intent.move_input().length() - 1.0).abs() < 1e-6);
///
/// intent.apply_input_step(Vec2::new(0.0, -0.5), 1.0 / 60.0);
/// assert_eq!(intent.move_input(), Vec3::new(0.0, 0.0, -0.5));
/// ```
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
pub struct RiderIntent {
    move_input: Vec3,
    previous_input: Vec3,
    jump_requested: bool,
}

impl RiderIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the world-space move direction. Longer than unit length is clamped.
    pub fn set_move(&mut self, direction: Vec3) {
        self.move_input = direction.clamp_length_max(1.0);
    }

    /// Set the move direction from a 2D stick value, mapping `(x, y)` to the
    /// horizontal plane `(x, 0, y)`.
    ///
    /// `dt` is accepted for symmetry with a fixed-step driver; the rider
    /// always integrates with its own fixed timestep, so the value has no
    /// effect.
    pub fn apply_input_step(&mut self, direction: Vec2, _dt: f32) {
        self.set_move(Vec3::new(direction.x, 0.0, direction.y));
    }

    /// Clear the move direction.
    pub fn clear(&mut self) {
        self.move_input = Vec3::ZERO;
    }

    /// Buffer a jump for the end of the next step.
    ///
    /// Dropped silently if the rider cannot jump at that point.
    pub fn request_jump(&mut self) {
        self.jump_requested = true;
    }

    #[inline]
    pub fn move_input(&self) -> Vec3 {
        self.move_input
    }

    /// The input from the last step that applied movement.
    #[inline]
    pub fn previous_input(&self) -> Vec3 {
        self.previous_input
    }

    /// Whether the move input is outside the dead zone.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.move_input.length_squared() >= INPUT_DEADZONE_SQUARED
    }

    #[inline]
    pub fn jump_requested(&self) -> bool {
        self.jump_requested
    }

    pub(crate) fn commit_input(&mut self) {
        self.previous_input = self.move_input;
    }

    pub(crate) fn take_jump_request(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }
}
