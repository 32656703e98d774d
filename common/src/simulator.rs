use bevy_math::Vec3;
use std::time::Duration;

use crate::{
    constants::*,
    math::{follow_fraction, wrap_angle},
    track::{SurfaceInfo, TrackSurface, left_of},
    vehicle::{ControlIntent, Vehicle},
};

/// What the simulator actually did with the intent this tick, for audio and effects.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RealizedControl {
    pub throttle: f32,
    pub steer: f32,
    // Boost requested and energy available
    pub boosting: bool,
    // Skid requested while moving
    pub skidding: bool,
    // Throttle against the direction of travel
    pub braking: bool,
}

// ============================================================================
// Per-Tick Integration
// ============================================================================

/// Advance the local vehicle by `dt` seconds.
///
/// Without a track the vehicle moves on flat ground at the default altitude.
pub fn simulate_vehicle(
    vehicle: &mut Vehicle,
    intent: ControlIntent,
    track: Option<&TrackSurface>,
    dt: f32,
) -> RealizedControl {
    if vehicle.is_spectating() || dt <= 0.0 {
        return RealizedControl::default();
    }
    let intent = intent.clamped();

    let boosting = update_boost_energy(vehicle, intent.boosting, dt);
    let braking = integrate_speed(vehicle, intent.throttle, boosting, dt);
    let (slide, skidding) = steer(vehicle, intent.steer, intent.skidding, dt);

    // Translation along the heading plus any skid slide and knockback
    let travel = vehicle.forward() * (vehicle.speed * dt * DISTANCE_SCALE);
    let displacement = travel + slide + vehicle.knockback * dt;
    vehicle.knockback *= (1.0 - KNOCKBACK_DECAY_RATE * dt).max(0.0);

    vehicle.last_position = vehicle.position;
    vehicle.position.x += displacement.x;
    vehicle.position.z += displacement.z;
    vehicle.velocity = Vec3::new(displacement.x, 0.0, displacement.z) / dt;

    follow_surface(vehicle, track, dt);

    RealizedControl {
        throttle: intent.throttle,
        steer: intent.steer,
        boosting,
        skidding,
        braking,
    }
}

// Drain while boosting, regenerate after a delay; returns whether the boost is in effect
fn update_boost_energy(vehicle: &mut Vehicle, requested: bool, dt: f32) -> bool {
    let boosting = requested && vehicle.boost_energy > 0.0;
    if boosting {
        vehicle.boost_energy = BOOST_DRAIN_RATE.mul_add(-dt, vehicle.boost_energy).max(0.0);
        vehicle.boost_idle.reset();
    } else {
        vehicle.boost_idle.tick(Duration::try_from_secs_f32(dt).unwrap_or_default());
        if vehicle.boost_idle.elapsed_secs() >= BOOST_REGEN_DELAY {
            vehicle.boost_energy = BOOST_REGEN_RATE.mul_add(dt, vehicle.boost_energy).min(BOOST_MAX_ENERGY);
        }
    }
    boosting
}

// Returns whether the throttle opposes the current direction of travel
fn integrate_speed(vehicle: &mut Vehicle, throttle: f32, boosting: bool, dt: f32) -> bool {
    let (max_speed, acceleration) = if boosting {
        (MAX_SPEED * BOOST_SPEED_MULTIPLIER, ACCELERATION * BOOST_ACCEL_MULTIPLIER)
    } else {
        (MAX_SPEED, ACCELERATION)
    };

    let braking = throttle * vehicle.speed < 0.0;
    if throttle == 0.0 {
        vehicle.speed *= (1.0 - SPEED_DECAY_RATE * dt).max(0.0);
    } else {
        vehicle.speed = (throttle * acceleration).mul_add(dt, vehicle.speed);
    }
    vehicle.speed = vehicle.speed.clamp(-max_speed, max_speed);
    braking
}

// Update the heading; returns the lateral slide and whether the vehicle is skidding
fn steer(vehicle: &mut Vehicle, steer: f32, skid_requested: bool, dt: f32) -> (Vec3, bool) {
    let speed_ratio = (vehicle.speed.abs() / MAX_SPEED).min(1.0);
    let skidding = skid_requested && vehicle.speed.abs() > PHYSICS_EPSILON;

    let attenuation = HIGH_SPEED_TURN_ATTENUATION.mul_add(-speed_ratio, 1.0);
    let mut yaw_delta = steer * TURN_RATE * dt * speed_ratio * attenuation;
    if skidding {
        yaw_delta *= SKID_TURN_MULTIPLIER;
    }
    // Positive steer turns right, which is decreasing yaw
    vehicle.yaw = wrap_angle(vehicle.yaw - yaw_delta);

    let mut slide = Vec3::ZERO;
    if steer != 0.0 {
        vehicle.speed *= (1.0 - TURN_SPEED_BLEED * steer.abs() * dt).max(0.0);
    }
    if skidding {
        vehicle.speed *= (1.0 - SKID_SPEED_BLEED * dt).max(0.0);
        // The tail swings out of the turn
        let travel = vehicle.speed.abs() * dt * DISTANCE_SCALE;
        slide = left_of(vehicle.forward()) * (steer * travel * SKID_SLIDE_FACTOR);
    }
    (slide, skidding)
}

// ============================================================================
// Surface Following
// ============================================================================

/// Smoothly move altitude, pitch and roll toward the surface under the vehicle.
pub fn follow_surface(vehicle: &mut Vehicle, track: Option<&TrackSurface>, dt: f32) {
    let surface = match track {
        Some(track) => {
            let info = track.surface_at(vehicle.position, vehicle.segment_hint);
            vehicle.segment_hint = Some(info.segment_id);
            vehicle.segment_t = info.t;
            info
        }
        None => SurfaceInfo::flat(vehicle.position),
    };

    let altitude = follow_fraction(ALTITUDE_FOLLOW_RATE, dt);
    let pitch = follow_fraction(PITCH_FOLLOW_RATE, dt);
    let roll = follow_fraction(ROLL_FOLLOW_RATE, dt);
    vehicle.position.y += (surface.altitude - vehicle.position.y) * altitude;
    vehicle.pitch += (surface.pitch - vehicle.pitch) * pitch;
    vehicle.roll += (surface.roll - vehicle.roll) * roll;
}
