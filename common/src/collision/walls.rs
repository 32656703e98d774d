use tracing::debug;

use super::CollisionEvent;
use crate::{
    constants::{FALL_OFF_DEPTH, WALL_CORRECTION_GAIN, WALL_HEADING_BLEND, WALL_MAX_CORRECTION, WALL_SPEED_LOSS},
    math::{lerp_angle, yaw_from_direction},
    track::TrackSurface,
    vehicle::Vehicle,
};

/// Keep the vehicle inside the track corridor.
///
/// A shallow contact displaces the vehicle back toward the centerline, costs speed and turns the
/// heading part of the way toward the correction. A contact deeper than `FALL_OFF_DEPTH` means the
/// vehicle left the track: it loses a life and respawns (or starts spectating).
pub fn resolve_wall_collision(vehicle: &mut Vehicle, track: &TrackSurface) -> Option<CollisionEvent> {
    if vehicle.is_spectating() {
        return None;
    }
    let contact = track.wall_collision(vehicle.position)?;

    if contact.penetration > FALL_OFF_DEPTH {
        vehicle.lose_life(Some(track));
        debug!(id = ?vehicle.id, lives = vehicle.lives, depth = contact.penetration, "vehicle fell off the track");
        return Some(CollisionEvent::FellOff { lives_left: vehicle.lives });
    }

    let amount = (contact.penetration * WALL_CORRECTION_GAIN).min(WALL_MAX_CORRECTION);
    vehicle.position += contact.correction * amount;
    vehicle.speed *= 1.0 - WALL_SPEED_LOSS;
    if let Some(correction_yaw) = yaw_from_direction(contact.correction) {
        vehicle.yaw = lerp_angle(vehicle.yaw, correction_yaw, WALL_HEADING_BLEND);
    }

    Some(CollisionEvent::Wall {
        correction: contact.correction,
        penetration: contact.penetration,
    })
}
