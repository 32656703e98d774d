use common::{
    math::{wrap_angle, yaw_from_direction},
    track::TrackSurface,
    vehicle::{ControlIntent, Vehicle},
};

use crate::constants::{
    AUTOPILOT_BOOST_ANGLE, AUTOPILOT_BOOST_MIN_ENERGY, AUTOPILOT_LOOK_AHEAD, AUTOPILOT_SKID_ANGLE,
    AUTOPILOT_STEER_GAIN,
};

/// Headless driver: chases a point a little further along the track centerline.
#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    look_ahead: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            look_ahead: AUTOPILOT_LOOK_AHEAD,
        }
    }
}

impl Autopilot {
    /// Full throttle toward the look-ahead point. Boosts on straights and skids through sharp
    /// corners. Without a track, or while spectating, it coasts.
    #[must_use]
    pub fn intent(&self, vehicle: &Vehicle, track: Option<&TrackSurface>) -> ControlIntent {
        let Some(track) = track else {
            return ControlIntent::coast();
        };
        if vehicle.is_spectating() {
            return ControlIntent::coast();
        }

        let info = track.surface_at(vehicle.position, vehicle.segment_hint);
        let Some(segment) = track.segments().get(info.segment_id) else {
            return ControlIntent::coast();
        };
        let target = track.curve().point_at(segment.global_param(info.t) + self.look_ahead);
        let Some(desired) = yaw_from_direction(target - vehicle.position) else {
            return ControlIntent::coast();
        };

        // Positive steer turns right, which lowers yaw
        let error = wrap_angle(desired - vehicle.yaw);
        ControlIntent {
            throttle: 1.0,
            steer: (-error * AUTOPILOT_STEER_GAIN).clamp(-1.0, 1.0),
            boosting: error.abs() < AUTOPILOT_BOOST_ANGLE && vehicle.boost_energy > AUTOPILOT_BOOST_MIN_ENERGY,
            skidding: error.abs() > AUTOPILOT_SKID_ANGLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::Vec3;
    use common::{collision::CollisionEvent, protocol::PlayerId, world::SimulationWorld};

    fn ring_track() -> TrackSurface {
        let skeleton = (0..16)
            .map(|i| {
                let a = std::f32::consts::TAU * i as f32 / 16.0;
                Vec3::new(100.0 * a.cos(), 0.0, 100.0 * a.sin())
            })
            .collect();
        TrackSurface::from_skeleton(skeleton, 15.0, 4).expect("valid skeleton")
    }

    #[test]
    fn coasts_without_a_track() {
        let vehicle = Vehicle::local(PlayerId(1), 0, None);
        assert_eq!(Autopilot::default().intent(&vehicle, None), ControlIntent::coast());
    }

    #[test]
    fn coasts_while_spectating() {
        let track = ring_track();
        let mut vehicle = Vehicle::local(PlayerId(1), 0, Some(&track));
        vehicle.spectate();
        assert_eq!(Autopilot::default().intent(&vehicle, Some(&track)), ControlIntent::coast());
    }

    #[test]
    fn steers_back_toward_the_track() {
        let track = ring_track();
        let mut vehicle = Vehicle::local(PlayerId(1), 0, Some(&track));
        let autopilot = Autopilot::default();
        let aligned = autopilot.intent(&vehicle, Some(&track));
        assert_eq!(aligned.throttle, 1.0);
        assert!(!aligned.skidding);

        // Yawed far to the left: hard right with a skid
        vehicle.yaw = wrap_angle(vehicle.yaw + 1.2);
        let intent = autopilot.intent(&vehicle, Some(&track));
        assert!(intent.steer > 0.99, "steer {}", intent.steer);
        assert!(intent.skidding);
        assert!(!intent.boosting);

        vehicle.yaw = wrap_angle(vehicle.yaw - 2.4);
        assert!(autopilot.intent(&vehicle, Some(&track)).steer < -0.99);
    }

    #[test]
    fn drives_laps_without_falling_off() {
        let mut world = SimulationWorld::new();
        world.track = Some(ring_track());
        world.spawn_local(PlayerId(1));
        world.race_active = true;
        let autopilot = Autopilot::default();

        let mut cleared = 0;
        for _ in 0..(30 * 60) {
            let intent = world
                .local()
                .map_or_else(ControlIntent::coast, |v| autopilot.intent(v, world.track.as_ref()));
            let outcome = world.step(1.0 / 60.0, intent);
            assert!(
                !outcome
                    .collisions
                    .iter()
                    .any(|event| matches!(event, CollisionEvent::FellOff { .. }))
            );
            cleared += outcome.laps.cleared.len();
        }
        assert!(cleared >= 4, "cleared {cleared}");
        assert!(world.local().is_some_and(|v| v.lap() >= 1));
    }
}
