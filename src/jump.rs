//! Jump controller.
//!
//! A jump fires a single upward velocity change. It is gated by the
//! cooldown since the previous jump and by ground: either the rider touched
//! ground within `coyote_time`, or a fresh straight-down probe finds ground
//! right now. A rejected jump changes nothing.

use bevy::prelude::*;

use crate::backend::RiderPhysicsBackend;
use crate::config::RiderConfig;
use crate::detection::confirm_ground;
use crate::state::GroundRider;

/// Where the rider is in its jump cycle, judged from its timers alone.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum JumpPhase {
    /// Not within coyote time; a jump needs the fresh ground probe.
    #[default]
    Idle,
    /// Recently grounded and off cooldown.
    Armed,
    /// A jump fired and the cooldown has not elapsed.
    Fired,
}

impl GroundRider {
    /// Whether `jump_cooldown` has elapsed since the last jump.
    pub fn cooldown_ready(&self, config: &RiderConfig) -> bool {
        self.last_jump_time
            .map_or(true, |t| self.clock - t >= f64::from(config.jump_cooldown))
    }

    /// Whether the rider was grounded within `coyote_time`.
    pub fn within_coyote(&self, config: &RiderConfig) -> bool {
        self.last_grounded_time
            .is_some_and(|t| self.clock - t <= f64::from(config.coyote_time))
    }

    pub fn jump_phase(&self, config: &RiderConfig) -> JumpPhase {
        if !self.cooldown_ready(config) {
            JumpPhase::Fired
        } else if self.within_coyote(config) {
            JumpPhase::Armed
        } else {
            JumpPhase::Idle
        }
    }

    pub(crate) fn record_jump(&mut self, config: &RiderConfig) {
        self.last_jump_time = Some(self.clock);
        self.jump_damping_suppress_until =
            self.clock + f64::from(config.jump_damping_ignore_duration);
    }
}

/// Whether `entity` may jump right now.
///
/// The ground probe is only cast when the rider is off cooldown and outside
/// coyote time.
pub fn can_jump<B: RiderPhysicsBackend>(
    world: &mut World,
    entity: Entity,
    config: &RiderConfig,
    rider: &GroundRider,
) -> bool {
    if !rider.cooldown_ready(config) {
        return false;
    }
    rider.within_coyote(config) || confirm_ground::<B>(world, entity, config)
}

/// Try to jump. Returns `true` if the impulse was applied.
///
/// Entities without a [`RiderConfig`] never jump.
pub fn jump<B: RiderPhysicsBackend>(world: &mut World, entity: Entity) -> bool {
    let Some((config, rider)) = world
        .get_entity(entity)
        .ok()
        .and_then(|e| Some((e.get::<RiderConfig>()?.clone(), e.get::<GroundRider>()?.clone())))
    else {
        return false;
    };

    if !can_jump::<B>(world, entity, &config, &rider) {
        debug!(?entity, now = rider.now(), "jump rejected");
        return false;
    }

    B::apply_velocity_change(world, entity, Vec3::Y * config.jump_force);
    if let Some(mut rider) = world.get_mut::<GroundRider>(entity) {
        rider.record_jump(&config);
    }
    debug!(?entity, now = rider.now(), force = config.jump_force, "jump fired");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessBackend, HeadlessBody, HeadlessCollider};

    const EPS: f64 = 1e-3;

    fn config() -> RiderConfig {
        RiderConfig::default().with_jump(10.0, 0.2).with_coyote_time(0.15)
    }

    fn rider_at(clock: f64) -> GroundRider {
        let mut rider = GroundRider::default();
        rider.set_clock(clock);
        rider
    }

    #[test]
    fn cooldown_boundaries() {
        let config = config();
        let mut rider = rider_at(1.0);
        assert!(rider.cooldown_ready(&config));

        rider.record_jump(&config);
        assert!(!rider.cooldown_ready(&config));
        assert_eq!(rider.jump_phase(&config), JumpPhase::Fired);

        rider.set_clock(1.0 + 0.2 - EPS);
        assert!(!rider.cooldown_ready(&config));
        rider.set_clock(1.0 + 0.2 + EPS);
        assert!(rider.cooldown_ready(&config));
    }

    #[test]
    fn coyote_boundaries() {
        let config = config();
        let mut rider = rider_at(2.0);
        assert!(!rider.within_coyote(&config));

        rider.last_grounded_time = Some(2.0);
        rider.set_clock(2.0 + 0.15 - EPS);
        assert!(rider.within_coyote(&config));
        assert_eq!(rider.jump_phase(&config), JumpPhase::Armed);

        rider.set_clock(2.0 + 0.15 + EPS);
        assert!(!rider.within_coyote(&config));
        assert_eq!(rider.jump_phase(&config), JumpPhase::Idle);
    }

    #[test]
    fn record_jump_opens_damping_window() {
        let config = config().with_jump_damping_ignore_duration(0.3);
        let mut rider = rider_at(4.0);
        rider.record_jump(&config);

        assert_eq!(rider.last_jump_time(), Some(4.0));
        assert!((rider.jump_damping_suppress_until() - 4.3).abs() < 1e-5);
        assert!(rider.damping_suppressed());
    }

    #[test]
    fn timers_keep_running_on_a_long_lived_clock() {
        let config = config();
        let start = 600_000.0;
        let mut rider = rider_at(start);
        rider.last_grounded_time = Some(start);
        rider.record_jump(&config);

        for _ in 0..600 {
            rider.advance_clock(1.0 / 60.0);
        }

        assert!((rider.now() - (start + 10.0)).abs() < 1e-3, "clock at {}", rider.now());
        assert!(rider.cooldown_ready(&config));
        assert!(!rider.within_coyote(&config));
        assert!(!rider.damping_suppressed());
        assert_eq!(rider.jump_phase(&config), JumpPhase::Idle);
    }

    #[test]
    fn jump_in_coyote_window_applies_impulse() {
        let mut world = World::new();
        let mut rider = rider_at(1.0);
        rider.last_grounded_time = Some(1.0 - 0.15 + EPS);
        let entity = world
            .spawn((Transform::from_xyz(0.0, 50.0, 0.0), HeadlessBody::default(), config(), rider))
            .id();

        assert!(jump::<HeadlessBackend>(&mut world, entity));
        assert_eq!(world.get::<HeadlessBody>(entity).unwrap().velocity, Vec3::Y * 10.0);
        assert_eq!(world.get::<GroundRider>(entity).unwrap().last_jump_time(), Some(1.0));
    }

    #[test]
    fn jump_after_coyote_without_ground_is_a_no_op() {
        let mut world = World::new();
        let mut rider = rider_at(1.0);
        rider.last_grounded_time = Some(1.0 - 0.15 - EPS);
        let before = rider.clone();
        let entity = world
            .spawn((Transform::from_xyz(0.0, 50.0, 0.0), HeadlessBody::default(), config(), rider))
            .id();

        assert!(!jump::<HeadlessBackend>(&mut world, entity));
        assert_eq!(world.get::<HeadlessBody>(entity).unwrap().velocity, Vec3::ZERO);
        assert_eq!(world.get::<GroundRider>(entity).unwrap(), &before);
    }

    #[test]
    fn fresh_probe_allows_jump_without_history() {
        let mut world = World::new();
        world.spawn((Transform::default(), HeadlessCollider::plane(Vec3::Y)));
        let entity = world
            .spawn((
                Transform::from_xyz(0.0, 1.05, 0.0),
                HeadlessBody::default(),
                config().with_ride_height(1.0).with_ground_check_distance(0.1),
                rider_at(3.0),
            ))
            .id();

        assert!(jump::<HeadlessBackend>(&mut world, entity));
    }

    #[test]
    fn missing_rider_cannot_jump() {
        let mut world = World::new();
        let entity = world.spawn((Transform::default(), HeadlessBody::default())).id();
        assert!(!jump::<HeadlessBackend>(&mut world, entity));
    }
}
