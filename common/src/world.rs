use bevy_math::Vec3;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{
    collision::{CollisionEvent, find_push, recoil_after_push, resolve_wall_collision},
    constants::{MAX_FRAME_DELTA, STARTING_LIVES},
    laps::LapProgress,
    protocol::PlayerId,
    simulator::{RealizedControl, simulate_vehicle},
    sync::interpolate_remote,
    track::TrackSurface,
    vehicle::{ControlIntent, Vehicle, VehicleStatus},
};

/// Everything that happened to the local vehicle during one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub control: RealizedControl,
    pub collisions: Vec<CollisionEvent>,
    pub laps: LapProgress,
}

/// The simulation state of one peer: the current track and every known vehicle.
#[derive(Debug, Default)]
pub struct SimulationWorld {
    pub track: Option<TrackSurface>,
    pub vehicles: BTreeMap<PlayerId, Vehicle>,
    pub local_id: Option<PlayerId>,
    // Laps are only tracked while a round is running for the local vehicle
    pub race_active: bool,
}

impl SimulationWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn local(&self) -> Option<&Vehicle> {
        self.local_id.and_then(|id| self.vehicles.get(&id))
    }

    pub fn local_mut(&mut self) -> Option<&mut Vehicle> {
        self.local_id.and_then(|id| self.vehicles.get_mut(&id))
    }

    /// Replace the track; the segment hints of every vehicle refer to the old one and are dropped.
    pub fn load_track(&mut self, seed: u64) {
        self.track = Some(TrackSurface::generate(seed));
        for vehicle in self.vehicles.values_mut() {
            vehicle.segment_hint = None;
        }
    }

    /// Create the local vehicle on grid slot 0 if it does not exist yet.
    pub fn spawn_local(&mut self, id: PlayerId) -> &mut Vehicle {
        self.local_id = Some(id);
        let track = self.track.as_ref();
        self.vehicles.entry(id).or_insert_with(|| Vehicle::local(id, 0, track))
    }

    /// Start a round on a fresh track. Grid slots follow the roster order; vehicles missing from
    /// the roster spectate.
    pub fn start_round(&mut self, seed: u64, roster: &[PlayerId]) {
        self.load_track(seed);
        let track = self.track.as_ref();
        for (id, vehicle) in &mut self.vehicles {
            match roster.iter().position(|entry| entry == id) {
                Some(slot) if vehicle.is_remote() => {
                    vehicle.laps.reset();
                    vehicle.lives = STARTING_LIVES;
                    vehicle.status = VehicleStatus::Alive;
                    vehicle.grid_slot = slot;
                }
                Some(slot) => vehicle.spawn(track, slot),
                None => vehicle.spectate(),
            }
        }
        self.race_active = self.local_id.is_some_and(|id| roster.contains(&id));
        info!(seed, players = roster.len(), racing = self.race_active, "round started");
    }

    pub fn end_round(&mut self) {
        self.race_active = false;
    }

    pub fn remove_vehicle(&mut self, id: PlayerId) -> Option<Vehicle> {
        let removed = self.vehicles.remove(&id);
        if removed.is_some() {
            debug!(?id, "vehicle removed");
        }
        removed
    }

    /// Apply a push addressed to the local vehicle. Pushes for anyone else are dropped.
    pub fn apply_push(&mut self, target: PlayerId, force: Vec3) -> bool {
        if self.local_id != Some(target) {
            return false;
        }
        self.local_mut().is_some_and(|vehicle| vehicle.apply_push(force))
    }

    // ========================================================================
    // Frame Step
    // ========================================================================

    /// Advance the world by `dt` (clamped to `MAX_FRAME_DELTA`): simulate and collide the local
    /// vehicle, track its laps, and move remote vehicles toward their reported poses.
    pub fn step(&mut self, dt: f32, intent: ControlIntent) -> StepOutcome {
        let dt = dt.clamp(0.0, MAX_FRAME_DELTA);
        let mut outcome = StepOutcome::default();

        if let Some(id) = self.local_id {
            self.step_local(id, dt, intent, &mut outcome);
        }

        let track = self.track.as_ref();
        for vehicle in self.vehicles.values_mut().filter(|vehicle| vehicle.is_remote()) {
            interpolate_remote(vehicle, track);
        }

        outcome
    }

    fn step_local(&mut self, id: PlayerId, dt: f32, intent: ControlIntent, outcome: &mut StepOutcome) {
        let track = self.track.as_ref();
        let Some(local) = self.vehicles.get_mut(&id) else {
            return;
        };
        local.tick_timers(dt);
        outcome.control = simulate_vehicle(local, intent, track, dt);

        let mut fell_off = false;
        if let Some(track) = track
            && let Some(event) = resolve_wall_collision(local, track)
        {
            fell_off = matches!(event, CollisionEvent::FellOff { .. });
            outcome.collisions.push(event);
        }

        if self.race_active
            && !fell_off
            && !local.is_spectating()
            && let Some(track) = track
        {
            let (from, to) = (local.last_position, local.position);
            outcome.laps = local.laps.update(track, from, to);
        }

        let push = self
            .vehicles
            .get(&id)
            .and_then(|local| find_push(local, self.vehicles.values()));
        if let Some(event) = push {
            if let Some(local) = self.vehicles.get_mut(&id) {
                recoil_after_push(local);
            }
            outcome.collisions.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sync::remote_target_from, vehicle::RemoteTarget};

    fn world_with_local() -> SimulationWorld {
        let mut world = SimulationWorld::new();
        world.load_track(10);
        world.spawn_local(PlayerId(1));
        world
    }

    #[test]
    fn step_clamps_large_deltas() {
        let mut world = SimulationWorld::new();
        world.spawn_local(PlayerId(1));
        let intent = ControlIntent { throttle: 1.0, ..ControlIntent::coast() };
        world.step(5.0, intent);
        let speed = world.local().map(|v| v.speed).unwrap_or_default();
        assert!((speed - crate::constants::ACCELERATION * MAX_FRAME_DELTA).abs() < 1e-3);
    }

    #[test]
    fn push_for_another_vehicle_is_dropped() {
        let mut world = world_with_local();
        assert!(!world.apply_push(PlayerId(9), Vec3::X));
        assert!(world.apply_push(PlayerId(1), Vec3::X));
        assert_eq!(world.local().map(|v| v.knockback), Some(Vec3::X));
    }

    #[test]
    fn local_vehicle_pushes_a_nearby_remote() {
        let mut world = world_with_local();
        let position = world.local().map(|v| v.position).unwrap_or_default();
        let forward = world.local().map(Vehicle::forward).unwrap_or_default();
        if let Some(local) = world.local_mut() {
            local.speed = 100.0;
        }
        world.vehicles.insert(
            PlayerId(2),
            Vehicle::remote(
                PlayerId(2),
                RemoteTarget {
                    position: position + forward * 3.5,
                    yaw: 0.0,
                    velocity: Vec3::ZERO,
                    segment_hint: None,
                },
            ),
        );
        let outcome = world.step(1.0 / 60.0, ControlIntent::coast());
        assert!(
            outcome
                .collisions
                .iter()
                .any(|event| matches!(event, CollisionEvent::Push { target: PlayerId(2), .. }))
        );
        let local = world.local().map(|v| (v.speed, v.collision_ready()));
        assert!(matches!(local, Some((speed, false)) if speed < 90.0));
    }

    #[test]
    fn round_start_assigns_grid_slots_and_spectators() {
        let mut world = world_with_local();
        let snapshot = crate::protocol::SState {
            sender: PlayerId(2),
            x: 0.0,
            y: 0.0,
            z: 0.0,
            rot_y: 0.0,
            vx: 0.0,
            vz: 0.0,
            lives: 1,
            lap: 2,
            segment_id: None,
            segment_t: 0.0,
        };
        world
            .vehicles
            .insert(PlayerId(2), Vehicle::remote(PlayerId(2), remote_target_from(&snapshot)));

        world.start_round(77, &[PlayerId(2), PlayerId(1)]);
        assert!(world.race_active);
        assert_eq!(world.track.as_ref().and_then(TrackSurface::seed), Some(77));
        let local = world.local().map(|v| (v.grid_slot, v.status));
        assert_eq!(local, Some((1, VehicleStatus::Alive)));
        assert_eq!(world.vehicles[&PlayerId(2)].lives, STARTING_LIVES);

        world.start_round(78, &[PlayerId(2)]);
        assert!(!world.race_active);
        assert_eq!(world.local().map(|v| v.status), Some(VehicleStatus::Spectating));
    }

    #[test]
    fn laps_count_only_while_racing() {
        let mut world = world_with_local();
        let checkpoint = world.track.as_ref().map(|t| t.checkpoints()[0].clone()).expect("track loaded");
        let from = checkpoint.position - checkpoint.direction;
        let to = checkpoint.position + checkpoint.direction;
        let place = |world: &mut SimulationWorld| {
            if let Some(local) = world.local_mut() {
                local.position = from;
                local.yaw = crate::math::yaw_from_direction(to - from).unwrap_or(0.0);
                local.speed = 2.0 * (to - from).length() / (crate::constants::DISTANCE_SCALE * 0.1);
            }
        };

        place(&mut world);
        let outcome = world.step(0.1, ControlIntent::coast());
        assert!(outcome.laps.cleared.is_empty());

        world.race_active = true;
        place(&mut world);
        let outcome = world.step(0.1, ControlIntent::coast());
        assert_eq!(outcome.laps.cleared, vec![0]);
    }
}
