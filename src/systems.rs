//! Core controller systems.
//!
//! Every system here runs once per fixed step inside one of the
//! [`GroundRiderSet`](crate::GroundRiderSet)s. They are generic over the
//! physics backend so the same controller drives Rapier or the headless
//! integrator. Each system first collects the riders it needs (configs are
//! cloned out of the world) and then applies its effect through the backend.

use bevy::prelude::*;

use crate::backend::RiderPhysicsBackend;
use crate::config::RiderConfig;
use crate::detection::{probe_ground, probe_wall};
use crate::intent::RiderIntent;
use crate::jump::jump;
use crate::modulators::{damping_coefficient, fall_gravity_acceleration};
use crate::movement::{control_multiplier, movement_acceleration};
use crate::state::{Airborne, GroundRider, Grounded, TouchingWall};
use crate::suspension::{spring_force, spring_force_vector};
use crate::wall::{is_wall, redirect_along_wall, wall_probe_direction};

/// Log configs that fail validation when they are first added.
///
/// Invalid configs still run; the controller clamps what it must.
pub fn validate_rider_configs(q_configs: Query<(Entity, &RiderConfig), Added<RiderConfig>>) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            error!(?entity, %err, "invalid rider config");
        }
    }
}

/// Advance each rider's clock and cast its ground probe.
///
/// The resulting contact is the single source of truth for "grounded" for
/// the rest of the step.
pub fn update_ground_probe<B: RiderPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, RiderConfig)> = world
        .query_filtered::<(Entity, &RiderConfig), With<GroundRider>>()
        .iter(world)
        .map(|(e, config)| (e, config.clone()))
        .collect();

    for (entity, config) in entities {
        let was_grounded = match world.get_mut::<GroundRider>(entity) {
            Some(mut rider) => {
                rider.advance_clock(dt);
                rider.is_grounded()
            }
            None => continue,
        };

        let contact = probe_ground::<B>(world, entity, &config);
        if contact.grounded != was_grounded {
            debug!(?entity, grounded = contact.grounded, distance = contact.distance, "ground contact changed");
        }

        if let Some(mut rider) = world.get_mut::<GroundRider>(entity) {
            rider.record_contact(contact);
        }
    }
}

/// Apply the ride spring to grounded riders.
///
/// The reaction force is pushed into the contacted body when it is dynamic.
pub fn apply_ride_spring<B: RiderPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, RiderConfig, GroundRider)> = world
        .query::<(Entity, &RiderConfig, &GroundRider)>()
        .iter(world)
        .filter(|(_, _, rider)| rider.is_grounded())
        .map(|(e, config, rider)| (e, config.clone(), rider.clone()))
        .collect();

    for (entity, config, rider) in entities {
        let contact = rider.contact();
        let velocity = B::get_velocity(world, entity);
        let magnitude = spring_force(&config, contact, velocity);
        let force = spring_force_vector(contact, magnitude);

        B::apply_force(world, entity, force);

        if let Some(body) = contact.body.filter(|&body| body != entity) {
            if B::is_dynamic(world, body) {
                B::apply_force_at_point(world, body, -force, contact.point);
            }
        }

        trace!(?entity, magnitude, distance = contact.distance, "ride spring");

        if let Some(mut rider) = world.get_mut::<GroundRider>(entity) {
            rider.last_spring_force = magnitude;
        }
    }
}

/// Accelerate riders toward their desired horizontal velocity.
///
/// Input inside the dead zone applies nothing and leaves the previous
/// input untouched, so letting go of the stick never reads as a reversal.
pub fn apply_movement<B: RiderPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, RiderConfig, bool, Vec3, Vec3)> = world
        .query::<(Entity, &RiderConfig, &GroundRider, &RiderIntent)>()
        .iter(world)
        .filter(|(_, _, _, intent)| intent.is_moving())
        .map(|(e, config, rider, intent)| {
            (
                e,
                config.clone(),
                rider.is_grounded(),
                intent.previous_input(),
                intent.move_input(),
            )
        })
        .collect();

    for (entity, config, grounded, previous, input) in entities {
        let multiplier = control_multiplier(&config, grounded, previous, input);
        let velocity = B::get_velocity(world, entity);
        let accel = movement_acceleration(
            input,
            velocity,
            config.move_speed,
            config.acceleration * multiplier,
            dt,
        );

        let mass = B::get_mass(world, entity);
        B::apply_force(world, entity, accel * mass);

        if let Some(mut intent) = world.get_mut::<RiderIntent>(entity) {
            intent.commit_input();
        }
        if let Some(mut rider) = world.get_mut::<GroundRider>(entity) {
            rider.last_control_multiplier = multiplier;
        }
    }
}

/// Pull falling riders down harder than gravity alone.
pub fn apply_fall_gravity<B: RiderPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, RiderConfig, bool)> = world
        .query::<(Entity, &RiderConfig, &GroundRider)>()
        .iter(world)
        .filter(|(_, _, rider)| !rider.is_grounded())
        .map(|(e, config, rider)| (e, config.clone(), rider.is_grounded()))
        .collect();

    for (entity, config, grounded) in entities {
        let velocity = B::get_velocity(world, entity);
        let accel = fall_gravity_acceleration(&config, grounded, velocity);
        if accel == Vec3::ZERO {
            continue;
        }
        let mass = B::get_mass(world, entity);
        B::apply_force(world, entity, accel * mass);
    }
}

/// Set the body's damping from the speed curve, or the airborne value while
/// airborne or inside the post-jump window.
pub fn apply_damping<B: RiderPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, RiderConfig, bool, bool)> = world
        .query::<(Entity, &RiderConfig, &GroundRider)>()
        .iter(world)
        .map(|(e, config, rider)| {
            (
                e,
                config.clone(),
                rider.is_grounded(),
                rider.damping_suppressed(),
            )
        })
        .collect();

    for (entity, config, grounded, suppressed) in entities {
        let velocity = B::get_velocity(world, entity);
        if let Some(damping) = damping_coefficient(&config, grounded, suppressed, velocity) {
            B::set_damping(world, entity, damping);
        }
    }
}

/// Slide airborne riders along walls instead of pushing into them.
pub fn apply_wall_redirect<B: RiderPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, RiderConfig, bool)> = world
        .query::<(Entity, &RiderConfig, &GroundRider)>()
        .iter(world)
        .map(|(e, config, rider)| (e, config.clone(), rider.is_grounded()))
        .collect();

    for (entity, config, grounded) in entities {
        let mut wall_normal = None;

        if config.wall_redirect && !grounded {
            let velocity = B::get_velocity(world, entity);
            let hit = wall_probe_direction(velocity)
                .and_then(|direction| probe_wall::<B>(world, entity, direction, &config))
                .filter(|hit| is_wall(hit.normal, config.wall_slide_threshold));

            if let Some(hit) = hit {
                let redirected = redirect_along_wall(velocity, hit.normal);
                if redirected != velocity {
                    B::set_velocity(world, entity, redirected);
                    trace!(?entity, normal = ?hit.normal, "velocity redirected along wall");
                }
                wall_normal = Some(hit.normal);
            }
        }

        if let Some(mut rider) = world.get_mut::<GroundRider>(entity) {
            if rider.wall_normal != wall_normal {
                rider.wall_normal = wall_normal;
            }
        }
    }
}

/// Sync state marker components with each rider's latest probe results.
pub fn sync_state_markers(
    mut commands: Commands,
    q_riders: Query<(
        Entity,
        &GroundRider,
        Has<Grounded>,
        Has<Airborne>,
        Option<&TouchingWall>,
    )>,
) {
    for (entity, rider, has_grounded, has_airborne, wall) in &q_riders {
        if rider.is_grounded() && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !rider.is_grounded() && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        match (rider.wall_normal(), wall) {
            (Some(normal), Some(wall)) if wall.normal == normal => {}
            (Some(normal), _) => {
                commands.entity(entity).insert(TouchingWall::new(normal));
            }
            (None, Some(_)) => {
                commands.entity(entity).remove::<TouchingWall>();
            }
            (None, None) => {}
        }
    }
}

/// Fire buffered jump requests.
///
/// Runs right after the ground probe, so coyote time sees this step's
/// contact and the damping modulator sees the suppression window a fired
/// jump opens. Requests that cannot fire are dropped.
pub fn apply_jump_requests<B: RiderPhysicsBackend>(world: &mut World) {
    let entities: Vec<Entity> = world
        .query::<(Entity, &RiderIntent)>()
        .iter(world)
        .filter(|(_, intent)| intent.jump_requested())
        .map(|(e, _)| e)
        .collect();

    for entity in entities {
        if let Some(mut intent) = world.get_mut::<RiderIntent>(entity) {
            intent.take_jump_request();
        }
        jump::<B>(world, entity);
    }
}
