use bevy_math::Vec3;
use tracing::trace;

use super::CollisionEvent;
use crate::{
    constants::{ATTACKER_SPEED_FACTOR, PUSH_FORCE_FACTOR, VEHICLE_COLLISION_RANGE_FACTOR, VEHICLE_RADIUS},
    math::flat_direction,
    vehicle::Vehicle,
};

/// Find the first vehicle (in iteration order) the attacker is touching and build the push for
/// it. Only the local vehicle runs this check; the target's owner applies the push.
///
/// Skips while the attacker's cooldown runs, skips spectating and invulnerable targets, and
/// skips coincident vehicles since there is no direction to push in.
#[must_use]
pub fn find_push<'a>(attacker: &Vehicle, others: impl IntoIterator<Item = &'a Vehicle>) -> Option<CollisionEvent> {
    if attacker.is_spectating() || !attacker.collision_ready() {
        return None;
    }
    let range = (VEHICLE_RADIUS + VEHICLE_RADIUS) * VEHICLE_COLLISION_RANGE_FACTOR;

    for other in others {
        if other.id == attacker.id || !other.can_be_pushed() {
            continue;
        }
        if attacker.position.distance(other.position) > range {
            continue;
        }
        let direction = flat_direction(attacker.position, other.position);
        if direction == Vec3::ZERO {
            trace!(attacker = ?attacker.id, target = ?other.id, "coincident vehicles, no push");
            continue;
        }
        return Some(CollisionEvent::Push {
            target: other.id,
            force: direction * (attacker.speed.abs() * PUSH_FORCE_FACTOR),
        });
    }
    None
}

/// The attacker loses speed but is never displaced, and cannot push again until the cooldown
/// runs out.
pub fn recoil_after_push(attacker: &mut Vehicle) {
    attacker.speed *= ATTACKER_SPEED_FACTOR;
    attacker.start_collision_cooldown();
}
