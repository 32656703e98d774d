use bevy_math::Vec3;
use bevy_time::{Stopwatch, Timer, TimerMode};
use std::time::Duration;

use crate::{
    constants::*,
    laps::LapTracker,
    math::forward_from_yaw,
    protocol::PlayerId,
    track::TrackSurface,
};

// ============================================================================
// Control Intent
// ============================================================================

/// Per-tick input supplied by the input collaborator (or the autopilot).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlIntent {
    // -1 reverse, 0 coast, 1 forward
    pub throttle: f32,
    // -1 left, 0 straight, 1 right
    pub steer: f32,
    pub boosting: bool,
    pub skidding: bool,
}

impl ControlIntent {
    #[must_use]
    pub const fn coast() -> Self {
        Self {
            throttle: 0.0,
            steer: 0.0,
            boosting: false,
            skidding: false,
        }
    }

    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            throttle: self.throttle.clamp(-1.0, 1.0),
            steer: self.steer.clamp(-1.0, 1.0),
            ..self
        }
    }
}

// ============================================================================
// Vehicle
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    Alive,
    // Recently respawned; ignores pushes and cannot be pushed
    Invulnerable,
    // Out of lives, or joined mid-round
    Spectating,
}

/// Latest pose reported by a remote peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteTarget {
    pub position: Vec3,
    pub yaw: f32,
    pub velocity: Vec3,
    pub segment_hint: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: PlayerId,
    pub status: VehicleStatus,
    pub position: Vec3,
    pub last_position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub speed: f32,
    // Velocity estimate in world units per second
    pub velocity: Vec3,
    // Decaying velocity from received pushes
    pub knockback: Vec3,
    pub lives: u32,
    pub laps: LapTracker,
    pub segment_hint: Option<usize>,
    // Curve parameter within the hinted segment
    pub segment_t: f32,
    pub boost_energy: f32,
    pub boost_idle: Stopwatch,
    pub collision_cooldown: Timer,
    pub invulnerability: Timer,
    pub grid_slot: usize,
    // Present for vehicles driven by other peers
    pub remote: Option<RemoteTarget>,
}

// A once-timer that has already run out
fn expired_timer(secs: f32) -> Timer {
    let mut timer = Timer::from_seconds(secs, TimerMode::Once);
    let duration = timer.duration();
    timer.tick(duration);
    timer
}

impl Vehicle {
    fn blank(id: PlayerId, position: Vec3, yaw: f32) -> Self {
        Self {
            id,
            status: VehicleStatus::Alive,
            position,
            last_position: position,
            yaw,
            pitch: 0.0,
            roll: 0.0,
            speed: 0.0,
            velocity: Vec3::ZERO,
            knockback: Vec3::ZERO,
            lives: STARTING_LIVES,
            laps: LapTracker::new(),
            segment_hint: None,
            segment_t: 0.0,
            boost_energy: BOOST_MAX_ENERGY,
            boost_idle: Stopwatch::new(),
            collision_cooldown: expired_timer(VEHICLE_COLLISION_COOLDOWN),
            invulnerability: expired_timer(RESPAWN_INVULNERABILITY),
            grid_slot: 0,
            remote: None,
        }
    }

    /// The vehicle this peer drives, placed at its grid slot.
    #[must_use]
    pub fn local(id: PlayerId, grid_slot: usize, track: Option<&TrackSurface>) -> Self {
        let mut vehicle = Self::blank(id, Vec3::ZERO, 0.0);
        vehicle.spawn(track, grid_slot);
        vehicle
    }

    /// A vehicle driven elsewhere; it has no lives authority and only follows reported poses.
    #[must_use]
    pub fn remote(id: PlayerId, target: RemoteTarget) -> Self {
        let mut vehicle = Self::blank(id, target.position, target.yaw);
        vehicle.velocity = target.velocity;
        vehicle.segment_hint = target.segment_hint;
        vehicle.remote = Some(target);
        vehicle
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    #[must_use]
    pub fn is_spectating(&self) -> bool {
        self.status == VehicleStatus::Spectating
    }

    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.status == VehicleStatus::Invulnerable
    }

    #[must_use]
    pub const fn lap(&self) -> u32 {
        self.laps.lap()
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    /// Place the vehicle on its grid slot with a fresh round state.
    pub fn spawn(&mut self, track: Option<&TrackSurface>, grid_slot: usize) {
        self.grid_slot = grid_slot;
        self.lives = STARTING_LIVES;
        self.laps.reset();
        self.boost_energy = BOOST_MAX_ENERGY;
        self.boost_idle.reset();
        self.place_on_grid(track);
        self.status = VehicleStatus::Alive;
    }

    // Back to the grid slot after falling off; lives and laps are kept
    fn respawn(&mut self, track: Option<&TrackSurface>) {
        self.place_on_grid(track);
        self.status = VehicleStatus::Invulnerable;
        self.invulnerability = Timer::from_seconds(RESPAWN_INVULNERABILITY, TimerMode::Once);
    }

    fn place_on_grid(&mut self, track: Option<&TrackSurface>) {
        let (position, yaw) = track.map_or_else(
            || {
                let offset = SPAWN_LANE_OFFSET * self.grid_slot as f32;
                (Vec3::new(offset, DEFAULT_ALTITUDE, 0.0), 0.0)
            },
            |track| track.grid_pose(self.grid_slot),
        );
        self.position = position;
        self.last_position = position;
        self.yaw = yaw;
        self.pitch = 0.0;
        self.roll = 0.0;
        self.speed = 0.0;
        self.velocity = Vec3::ZERO;
        self.knockback = Vec3::ZERO;
        self.segment_hint = None;
        self.collision_cooldown = expired_timer(VEHICLE_COLLISION_COOLDOWN);
    }

    /// Lose a life and go back to the grid, or start spectating when none are left.
    pub fn lose_life(&mut self, track: Option<&TrackSurface>) -> VehicleStatus {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.status = VehicleStatus::Spectating;
            self.speed = 0.0;
            self.velocity = Vec3::ZERO;
            self.knockback = Vec3::ZERO;
        } else {
            self.respawn(track);
        }
        self.status
    }

    /// Put the vehicle out of the round without touching its pose (e.g. joined mid-round).
    pub fn spectate(&mut self) {
        self.status = VehicleStatus::Spectating;
        self.speed = 0.0;
        self.velocity = Vec3::ZERO;
    }

    pub fn tick_timers(&mut self, dt: f32) {
        let delta = Duration::try_from_secs_f32(dt.max(0.0)).unwrap_or_default();
        self.collision_cooldown.tick(delta);
        if self.status == VehicleStatus::Invulnerable {
            self.invulnerability.tick(delta);
            if self.invulnerability.is_finished() {
                self.status = VehicleStatus::Alive;
            }
        }
    }

    #[must_use]
    pub fn collision_ready(&self) -> bool {
        self.collision_cooldown.is_finished()
    }

    pub fn start_collision_cooldown(&mut self) {
        self.collision_cooldown = Timer::from_seconds(VEHICLE_COLLISION_COOLDOWN, TimerMode::Once);
    }

    // Only alive vehicles take pushes
    #[must_use]
    pub fn can_be_pushed(&self) -> bool {
        self.status == VehicleStatus::Alive
    }

    /// Add a received impulse to the knockback velocity. Returns whether it was applied.
    pub fn apply_push(&mut self, force: Vec3) -> bool {
        if !self.can_be_pushed() || !force.is_finite() {
            return false;
        }
        self.knockback += force;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vehicle_is_ready_to_race() {
        let vehicle = Vehicle::local(PlayerId(1), 0, None);
        assert_eq!(vehicle.status, VehicleStatus::Alive);
        assert_eq!(vehicle.lives, STARTING_LIVES);
        assert!(vehicle.collision_ready());
        assert!((vehicle.boost_energy - BOOST_MAX_ENERGY).abs() < 1e-6);
        assert_eq!(vehicle.position.y, DEFAULT_ALTITUDE);
    }

    #[test]
    fn losing_lives_respawns_then_spectates() {
        let track = TrackSurface::generate(3);
        let mut vehicle = Vehicle::local(PlayerId(1), 1, Some(&track));
        let (grid, _) = track.grid_pose(1);
        vehicle.position += Vec3::X * 50.0;
        vehicle.speed = 40.0;

        assert_eq!(vehicle.lose_life(Some(&track)), VehicleStatus::Invulnerable);
        assert_eq!(vehicle.lives, STARTING_LIVES - 1);
        assert!((vehicle.position - grid).length() < 1e-4);
        assert_eq!(vehicle.speed, 0.0);
        assert!(!vehicle.apply_push(Vec3::X));

        vehicle.tick_timers(RESPAWN_INVULNERABILITY + 0.01);
        assert_eq!(vehicle.status, VehicleStatus::Alive);

        for _ in 1..STARTING_LIVES {
            vehicle.lose_life(Some(&track));
        }
        assert_eq!(vehicle.status, VehicleStatus::Spectating);
        assert_eq!(vehicle.lives, 0);
    }

    #[test]
    fn collision_cooldown_runs_out() {
        let mut vehicle = Vehicle::local(PlayerId(1), 0, None);
        vehicle.start_collision_cooldown();
        assert!(!vehicle.collision_ready());
        vehicle.tick_timers(VEHICLE_COLLISION_COOLDOWN * 0.5);
        assert!(!vehicle.collision_ready());
        vehicle.tick_timers(VEHICLE_COLLISION_COOLDOWN);
        assert!(vehicle.collision_ready());
    }

    #[test]
    fn intent_is_clamped() {
        let intent = ControlIntent {
            throttle: 3.0,
            steer: -2.0,
            boosting: true,
            skidding: false,
        }
        .clamped();
        assert_eq!(intent.throttle, 1.0);
        assert_eq!(intent.steer, -1.0);
        assert!(intent.boosting);
    }
}
