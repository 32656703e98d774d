use bevy_math::Vec3;
use bevy_time::{Timer, TimerMode};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::{
    collision::CollisionEvent,
    constants::{GAME_OVER_RETRY_INTERVAL, PREDICTION_HORIZON, RACE_LAPS, REMOTE_LERP_FRACTION, RESTART_DELAY},
    math::lerp_angle,
    protocol::*,
    track::{SurfaceInfo, TrackSurface},
    vehicle::{RemoteTarget, Vehicle, VehicleStatus},
    world::{SimulationWorld, StepOutcome},
};

// ============================================================================
// Snapshots
// ============================================================================

/// Authoritative fields of the local vehicle, as sent to the relay.
#[must_use]
pub fn snapshot_of(vehicle: &Vehicle) -> CState {
    CState {
        x: vehicle.position.x,
        y: vehicle.position.y,
        z: vehicle.position.z,
        rot_y: vehicle.yaw,
        vx: vehicle.velocity.x,
        vz: vehicle.velocity.z,
        lives: vehicle.lives,
        lap: vehicle.lap(),
        segment_id: vehicle.segment_hint.map(|id| id as u32),
        segment_t: vehicle.segment_t,
    }
}

#[must_use]
pub fn remote_target_from(state: &SState) -> RemoteTarget {
    RemoteTarget {
        position: Vec3::new(state.x, state.y, state.z),
        yaw: state.rot_y,
        velocity: Vec3::new(state.vx, 0.0, state.vz),
        segment_hint: state.segment_id.map(|id| id as usize),
    }
}

/// Record a remote snapshot: unknown senders get a new remote vehicle, known ones a new target.
/// Lives and lap are mirrored as reported; the local vehicle is never touched.
pub fn apply_snapshot(world: &mut SimulationWorld, state: &SState) {
    if world.local_id == Some(state.sender) {
        return;
    }
    let target = remote_target_from(state);
    let vehicle = world
        .vehicles
        .entry(state.sender)
        .and_modify(|vehicle| vehicle.remote = Some(target))
        .or_insert_with(|| {
            debug!(id = ?state.sender, "new remote vehicle");
            Vehicle::remote(state.sender, target)
        });

    if !vehicle.is_remote() {
        return;
    }
    vehicle.lives = state.lives;
    vehicle.laps.set_lap(state.lap);
    vehicle.status = if state.lives == 0 {
        VehicleStatus::Spectating
    } else {
        VehicleStatus::Alive
    };
}

// ============================================================================
// Remote Interpolation
// ============================================================================

/// Move a remote vehicle a fixed fraction of the way toward its predicted pose. Called once per
/// tick; orientation comes from the surface under the interpolated position.
pub fn interpolate_remote(vehicle: &mut Vehicle, track: Option<&TrackSurface>) {
    let Some(target) = vehicle.remote else {
        return;
    };
    let predicted = target.position + target.velocity * PREDICTION_HORIZON;

    vehicle.last_position = vehicle.position;
    vehicle.position = vehicle.position.lerp(predicted, REMOTE_LERP_FRACTION);
    vehicle.yaw = lerp_angle(vehicle.yaw, target.yaw, REMOTE_LERP_FRACTION);
    vehicle.velocity = target.velocity;

    let surface = match track {
        Some(track) => {
            let info = track.surface_at(vehicle.position, vehicle.segment_hint.or(target.segment_hint));
            vehicle.segment_hint = Some(info.segment_id);
            vehicle.segment_t = info.t;
            info
        }
        None => SurfaceInfo::flat(vehicle.position),
    };
    vehicle.pitch += (surface.pitch - vehicle.pitch) * REMOTE_LERP_FRACTION;
    vehicle.roll += (surface.roll - vehicle.roll) * REMOTE_LERP_FRACTION;
}

// ============================================================================
// Host Arbitration
// ============================================================================

/// Round result: `Some(Some(id))` for a winner, `Some(None)` for a draw, `None` while undecided.
///
/// A vehicle that reached `RACE_LAPS` wins (lowest ID on ties). Otherwise, in a round that started
/// with more than one player, the sole vehicle with lives left wins; with none left it is a draw.
/// Roster members that left count as eliminated.
#[must_use]
pub fn decide_round(world: &SimulationWorld, roster: &[PlayerId]) -> Option<Option<PlayerId>> {
    let participants: Vec<&Vehicle> = roster.iter().filter_map(|id| world.vehicles.get(id)).collect();

    if let Some(winner) = participants
        .iter()
        .filter(|vehicle| vehicle.lap() >= RACE_LAPS)
        .map(|vehicle| vehicle.id)
        .min()
    {
        return Some(Some(winner));
    }

    let survivors: Vec<PlayerId> = participants
        .iter()
        .filter(|vehicle| vehicle.lives > 0)
        .map(|vehicle| vehicle.id)
        .collect();
    match survivors.as_slice() {
        [] if !roster.is_empty() => Some(None),
        [sole] if roster.len() > 1 => Some(Some(*sole)),
        _ => None,
    }
}

/// Host-side round control: declares the result until the relay confirms it, then restarts after
/// a delay.
///
/// The relay judges a declaration against the snapshots it has seen, which may lag behind the
/// host's world. A declaration without a confirming `game_over` is repeated every
/// `GAME_OVER_RETRY_INTERVAL`.
#[derive(Debug, Default)]
pub struct HostArbiter {
    // Running while a declaration awaits confirmation
    retry: Option<Timer>,
    restart: Option<Timer>,
}

impl HostArbiter {
    pub fn round_started(&mut self) {
        self.retry = None;
        self.restart = None;
    }

    // Any peer may become host while the restart is pending, so every peer runs the delay
    pub fn round_over(&mut self) {
        self.retry = None;
        self.restart = Some(Timer::from_seconds(RESTART_DELAY, TimerMode::Once));
    }

    #[must_use]
    pub fn poll(
        &mut self,
        world: &SimulationWorld,
        roster: &[PlayerId],
        game_active: bool,
        is_host: bool,
        dt: f32,
    ) -> Option<ClientMessage> {
        let delta = Duration::try_from_secs_f32(dt.max(0.0)).unwrap_or_default();
        if let Some(timer) = self.restart.as_mut() {
            timer.tick(delta);
            if is_host && timer.is_finished() {
                self.restart = None;
                info!("restarting round");
                return Some(ClientMessage::GameRestart(CGameRestart {
                    player_count: world.vehicles.len() as u32,
                }));
            }
            return None;
        }

        if !is_host || !game_active {
            return None;
        }
        if let Some(timer) = self.retry.as_mut() {
            timer.tick(delta);
            if !timer.is_finished() {
                return None;
            }
            debug!("round result not confirmed, declaring again");
        }
        let winner_id = decide_round(world, roster)?;
        self.retry = Some(Timer::from_seconds(GAME_OVER_RETRY_INTERVAL, TimerMode::Once));
        info!(?winner_id, "declaring round result");
        Some(ClientMessage::GameOver(CGameOver { winner_id }))
    }
}

// ============================================================================
// Client Session
// ============================================================================

/// Something the application layer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Welcomed { id: PlayerId, is_host: bool, can_play: bool },
    RoundStarted { track_seed: u64, restart: bool, racing: bool },
    PromotedToHost,
    PeerLeft(PlayerId),
    Pushed { source: PlayerId, force: Vec3 },
    GameOver { winner_id: Option<PlayerId> },
}

/// Client side of the sync protocol: identity and round flags, plus dispatch of every relay
/// message against the local world.
#[derive(Debug, Default)]
pub struct SyncSession {
    my_id: Option<PlayerId>,
    is_host: bool,
    can_play: bool,
    game_active: bool,
    connected: bool,
    winner: Option<Option<PlayerId>>,
    roster: Vec<PlayerId>,
    start_requested: bool,
    arbiter: HostArbiter,
}

impl SyncSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn my_id(&self) -> Option<PlayerId> {
        self.my_id
    }

    #[must_use]
    pub const fn is_host(&self) -> bool {
        self.is_host
    }

    #[must_use]
    pub const fn game_active(&self) -> bool {
        self.game_active
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub const fn winner(&self) -> Option<Option<PlayerId>> {
        self.winner
    }

    /// Dispatch one relay message synchronously within the current tick.
    pub fn handle_message(&mut self, world: &mut SimulationWorld, msg: ServerMessage) -> Option<SessionEvent> {
        trace!(tag = msg.tag(), "dispatching message");
        match msg {
            ServerMessage::Welcome(welcome) => Some(self.on_welcome(world, &welcome)),
            ServerMessage::State(state) => {
                apply_snapshot(world, &state);
                None
            }
            ServerMessage::CollisionPush(push) => {
                let force = Vec3::new(push.force_x, push.force_y, push.force_z);
                world.apply_push(push.target, force).then_some(SessionEvent::Pushed {
                    source: push.source,
                    force,
                })
            }
            ServerMessage::Disconnect(SDisconnect { id }) => {
                world.remove_vehicle(id);
                Some(SessionEvent::PeerLeft(id))
            }
            ServerMessage::YouAreHost(_) => {
                info!("promoted to host");
                self.is_host = true;
                Some(SessionEvent::PromotedToHost)
            }
            ServerMessage::StartGame(start) => Some(self.on_round_start(world, start.track_seed, start.roster, false)),
            ServerMessage::GameRestart(restart) => {
                Some(self.on_round_start(world, restart.track_seed, restart.roster, true))
            }
            ServerMessage::GameOver(SGameOver { winner_id }) => {
                info!(?winner_id, "game over");
                self.game_active = false;
                self.winner = Some(winner_id);
                world.end_round();
                self.arbiter.round_over();
                Some(SessionEvent::GameOver { winner_id })
            }
        }
    }

    fn on_welcome(&mut self, world: &mut SimulationWorld, welcome: &SWelcome) -> SessionEvent {
        info!(id = ?welcome.id, is_host = welcome.is_host, can_play = welcome.can_play, "welcomed");
        self.my_id = Some(welcome.id);
        self.is_host = welcome.is_host;
        self.can_play = welcome.can_play;
        self.game_active = welcome.game_active;
        self.connected = true;

        world.load_track(welcome.track_seed);
        let local = world.spawn_local(welcome.id);
        if !welcome.can_play {
            local.spectate();
        }
        world.race_active = false;

        SessionEvent::Welcomed {
            id: welcome.id,
            is_host: welcome.is_host,
            can_play: welcome.can_play,
        }
    }

    fn on_round_start(
        &mut self,
        world: &mut SimulationWorld,
        track_seed: u64,
        roster: Vec<PlayerId>,
        restart: bool,
    ) -> SessionEvent {
        world.start_round(track_seed, &roster);
        self.can_play = self.my_id.is_some_and(|id| roster.contains(&id));
        self.game_active = true;
        self.winner = None;
        self.roster = roster;
        self.start_requested = true;
        self.arbiter.round_started();
        SessionEvent::RoundStarted {
            track_seed,
            restart,
            racing: world.race_active,
        }
    }

    /// Snapshot of the local vehicle for the periodic state send.
    #[must_use]
    pub fn state_message(&self, world: &SimulationWorld) -> Option<ClientMessage> {
        if !self.connected {
            return None;
        }
        world.local().map(|vehicle| ClientMessage::State(snapshot_of(vehicle)))
    }

    /// Messages caused by one step of the local vehicle: pushes for other peers and lap progress.
    #[must_use]
    pub fn step_messages(&self, outcome: &StepOutcome) -> Vec<ClientMessage> {
        if !self.connected {
            return Vec::new();
        }
        let mut messages: Vec<ClientMessage> = outcome
            .collisions
            .iter()
            .filter_map(|event| match *event {
                CollisionEvent::Push { target, force } => Some(ClientMessage::CollisionPush(CCollisionPush {
                    target,
                    force_x: force.x,
                    force_y: force.y,
                    force_z: force.z,
                })),
                _ => None,
            })
            .collect();
        if self.game_active && self.can_play {
            messages.extend(outcome.laps.cleared.iter().map(|&id| {
                ClientMessage::Checkpoint(CCheckpoint {
                    checkpoint_id: id as u32,
                })
            }));
            if let Some(lap) = outcome.laps.lap_completed {
                messages.push(ClientMessage::LapComplete(CLapComplete { lap }));
            }
        }
        messages
    }

    /// Host duties for this frame: round result and delayed restart. A result is preceded by the
    /// host's own snapshot so the relay judges it against the host's current lives.
    pub fn poll_host(&mut self, world: &SimulationWorld, dt: f32) -> Vec<ClientMessage> {
        if !self.connected {
            return Vec::new();
        }
        match self.arbiter.poll(world, &self.roster, self.game_active, self.is_host, dt) {
            Some(msg @ ClientMessage::GameOver(_)) => self.state_message(world).into_iter().chain([msg]).collect(),
            Some(msg) => vec![msg],
            None => Vec::new(),
        }
    }

    /// The host starts the first round once `wanted` players are known.
    pub fn auto_start(&mut self, world: &SimulationWorld, wanted: usize) -> Option<ClientMessage> {
        if !self.connected || !self.is_host || self.game_active || self.start_requested {
            return None;
        }
        if world.vehicles.len() < wanted {
            return None;
        }
        self.start_requested = true;
        info!(players = world.vehicles.len(), "requesting round start");
        Some(ClientMessage::StartGame(CStartGame {
            player_count: world.vehicles.len() as u32,
        }))
    }

    /// The transport is gone: keep simulating alone. Remote vehicles would never update again, so
    /// they are removed.
    pub fn go_offline(&mut self, world: &mut SimulationWorld) {
        if !self.connected {
            return;
        }
        warn!("connection lost, continuing offline");
        self.connected = false;
        self.is_host = false;
        world.vehicles.retain(|_, vehicle| !vehicle.is_remote());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STARTING_LIVES;

    fn welcome(id: u32, is_host: bool) -> ServerMessage {
        ServerMessage::Welcome(SWelcome {
            id: PlayerId(id),
            is_host,
            can_play: true,
            game_active: false,
            track_seed: 5,
        })
    }

    fn state(sender: u32, x: f32, z: f32) -> SState {
        SState {
            sender: PlayerId(sender),
            x,
            y: 0.0,
            z,
            rot_y: 0.5,
            vx: 10.0,
            vz: 0.0,
            lives: STARTING_LIVES,
            lap: 1,
            segment_id: None,
            segment_t: 0.0,
        }
    }

    fn joined(id: u32, is_host: bool) -> (SyncSession, SimulationWorld) {
        let mut session = SyncSession::new();
        let mut world = SimulationWorld::new();
        session.handle_message(&mut world, welcome(id, is_host));
        (session, world)
    }

    #[test]
    fn welcome_creates_the_local_vehicle_on_the_shared_track() {
        let (session, world) = joined(3, true);
        assert_eq!(session.my_id(), Some(PlayerId(3)));
        assert!(session.is_host());
        assert_eq!(world.track.as_ref().and_then(TrackSurface::seed), Some(5));
        assert!(world.local().is_some_and(|v| !v.is_remote()));
    }

    #[test]
    fn snapshots_create_then_update_remote_vehicles() {
        let (mut session, mut world) = joined(1, false);
        session.handle_message(&mut world, ServerMessage::State(state(2, 10.0, 0.0)));
        let remote = &world.vehicles[&PlayerId(2)];
        assert!(remote.is_remote());
        assert_eq!(remote.lap(), 1);

        session.handle_message(&mut world, ServerMessage::State(SState { lives: 0, ..state(2, 20.0, 0.0) }));
        let remote = &world.vehicles[&PlayerId(2)];
        assert_eq!(remote.remote.map(|t| t.position.x), Some(20.0));
        assert_eq!(remote.status, VehicleStatus::Spectating);
    }

    #[test]
    fn own_snapshot_is_ignored() {
        let (mut session, mut world) = joined(1, false);
        let before = world.local().map(|v| v.position);
        session.handle_message(&mut world, ServerMessage::State(state(1, 99.0, 99.0)));
        assert_eq!(world.local().map(|v| v.position), before);
        assert!(world.local().is_some_and(|v| !v.is_remote()));
    }

    #[test]
    fn interpolation_converges_to_the_predicted_pose() {
        let target = RemoteTarget {
            position: Vec3::new(50.0, 2.0, -20.0),
            yaw: 2.5,
            velocity: Vec3::new(10.0, 0.0, 0.0),
            segment_hint: None,
        };
        let mut vehicle = Vehicle::remote(PlayerId(2), target);
        vehicle.position = Vec3::ZERO;
        vehicle.yaw = -2.5;
        let predicted = target.position + target.velocity * PREDICTION_HORIZON;

        let mut last_gap = vehicle.position.distance(predicted);
        for _ in 0..60 {
            interpolate_remote(&mut vehicle, None);
            let gap = vehicle.position.distance(predicted);
            assert!(gap < last_gap);
            last_gap = gap;
        }
        assert!(last_gap < 0.01, "gap {last_gap}");
        // Shortest way round: from -2.5 to 2.5 crosses PI
        assert!((vehicle.yaw - 2.5).abs() < 1e-3);
    }

    #[test]
    fn push_for_me_becomes_knockback() {
        let (mut session, mut world) = joined(1, false);
        let push = ServerMessage::CollisionPush(SCollisionPush {
            source: PlayerId(2),
            target: PlayerId(1),
            force_x: 30.0,
            force_y: 0.0,
            force_z: 0.0,
        });
        let event = session.handle_message(&mut world, push);
        assert!(matches!(event, Some(SessionEvent::Pushed { source: PlayerId(2), .. })));
        assert!(world.local().is_some_and(|v| v.knockback.x > 0.0));
    }

    #[test]
    fn disconnect_and_promotion() {
        let (mut session, mut world) = joined(1, false);
        session.handle_message(&mut world, ServerMessage::State(state(2, 10.0, 0.0)));
        let event = session.handle_message(&mut world, ServerMessage::Disconnect(SDisconnect { id: PlayerId(2) }));
        assert_eq!(event, Some(SessionEvent::PeerLeft(PlayerId(2))));
        assert!(!world.vehicles.contains_key(&PlayerId(2)));

        // A push for a removed vehicle is dropped
        let stale = ServerMessage::CollisionPush(SCollisionPush {
            source: PlayerId(1),
            target: PlayerId(2),
            force_x: 1.0,
            force_y: 0.0,
            force_z: 0.0,
        });
        assert_eq!(session.handle_message(&mut world, stale), None);

        session.handle_message(&mut world, ServerMessage::YouAreHost(SYouAreHost {}));
        assert!(session.is_host());
    }

    #[test]
    fn round_start_and_game_over_flow() {
        let (mut session, mut world) = joined(1, true);
        session.handle_message(&mut world, ServerMessage::State(state(2, 10.0, 0.0)));
        assert!(matches!(session.auto_start(&world, 2), Some(ClientMessage::StartGame(_))));
        assert_eq!(session.auto_start(&world, 2), None);

        let start = ServerMessage::StartGame(SStartGame {
            player_count: 2,
            track_seed: 44,
            roster: vec![PlayerId(1), PlayerId(2)],
        });
        let event = session.handle_message(&mut world, start);
        assert_eq!(
            event,
            Some(SessionEvent::RoundStarted {
                track_seed: 44,
                restart: false,
                racing: true
            })
        );
        assert!(session.game_active());
        assert!(session.poll_host(&world, 0.016).is_empty());

        // Remote reaches the lap limit; the host's own snapshot goes first
        session.handle_message(&mut world, ServerMessage::State(SState { lap: RACE_LAPS, ..state(2, 10.0, 0.0) }));
        let over = session.poll_host(&world, 0.016);
        assert_eq!(over.len(), 2);
        assert!(matches!(&over[0], ClientMessage::State(_)));
        assert_eq!(over[1], ClientMessage::GameOver(CGameOver { winner_id: Some(PlayerId(2)) }));
        assert!(session.poll_host(&world, 0.016).is_empty());

        session.handle_message(&mut world, ServerMessage::GameOver(SGameOver { winner_id: Some(PlayerId(2)) }));
        assert_eq!(session.winner(), Some(Some(PlayerId(2))));
        assert!(!world.race_active);
        assert!(session.poll_host(&world, RESTART_DELAY * 0.5).is_empty());
        let restart = session.poll_host(&world, RESTART_DELAY);
        assert!(matches!(restart.as_slice(), [ClientMessage::GameRestart(_)]));
    }

    #[test]
    fn unconfirmed_result_is_declared_again() {
        let (mut session, mut world) = joined(1, true);
        session.handle_message(&mut world, ServerMessage::State(state(2, 10.0, 0.0)));
        session.handle_message(
            &mut world,
            ServerMessage::StartGame(SStartGame {
                player_count: 2,
                track_seed: 44,
                roster: vec![PlayerId(1), PlayerId(2)],
            }),
        );
        session.handle_message(&mut world, ServerMessage::State(SState { lives: 0, ..state(2, 10.0, 0.0) }));

        let is_game_over = |messages: &[ClientMessage]| messages.iter().any(|m| matches!(m, ClientMessage::GameOver(_)));
        assert!(is_game_over(&session.poll_host(&world, 0.016)));
        assert!(!is_game_over(&session.poll_host(&world, GAME_OVER_RETRY_INTERVAL * 0.5)));
        assert!(is_game_over(&session.poll_host(&world, GAME_OVER_RETRY_INTERVAL)));

        // Confirmation stops the repeats
        session.handle_message(&mut world, ServerMessage::GameOver(SGameOver { winner_id: Some(PlayerId(1)) }));
        assert!(session.poll_host(&world, GAME_OVER_RETRY_INTERVAL * 2.0).is_empty());
    }

    #[test]
    fn arbiter_decisions() {
        let mut world = SimulationWorld::new();
        for id in 1..=3 {
            world.vehicles.insert(PlayerId(id), Vehicle::local(PlayerId(id), 0, None));
        }
        let roster = [PlayerId(1), PlayerId(2), PlayerId(3)];
        assert_eq!(decide_round(&world, &roster), None);

        // Lap leader wins, lowest ID on ties
        for id in [3, 2] {
            if let Some(v) = world.vehicles.get_mut(&PlayerId(id)) {
                v.laps.set_lap(RACE_LAPS);
            }
        }
        assert_eq!(decide_round(&world, &roster), Some(Some(PlayerId(2))));
        for v in world.vehicles.values_mut() {
            v.laps.set_lap(0);
        }

        // Sole survivor
        for id in [1, 3] {
            if let Some(v) = world.vehicles.get_mut(&PlayerId(id)) {
                v.lives = 0;
            }
        }
        assert_eq!(decide_round(&world, &roster), Some(Some(PlayerId(2))));

        // Nobody left
        if let Some(v) = world.vehicles.get_mut(&PlayerId(2)) {
            v.lives = 0;
        }
        assert_eq!(decide_round(&world, &roster), Some(None));

        // A single-player round has no sole-survivor win
        let mut solo = SimulationWorld::new();
        solo.vehicles.insert(PlayerId(1), Vehicle::local(PlayerId(1), 0, None));
        assert_eq!(decide_round(&solo, &[PlayerId(1)]), None);
    }

    #[test]
    fn step_messages_translate_pushes_and_laps() {
        let (mut session, mut world) = joined(1, true);
        session.handle_message(
            &mut world,
            ServerMessage::StartGame(SStartGame {
                player_count: 1,
                track_seed: 3,
                roster: vec![PlayerId(1)],
            }),
        );
        let outcome = StepOutcome {
            collisions: vec![
                CollisionEvent::Push {
                    target: PlayerId(2),
                    force: Vec3::new(1.0, 0.0, 2.0),
                },
                CollisionEvent::Wall {
                    correction: Vec3::X,
                    penetration: 0.5,
                },
            ],
            laps: crate::laps::LapProgress {
                cleared: vec![3],
                lap_completed: Some(1),
            },
            ..StepOutcome::default()
        };
        let messages = session.step_messages(&outcome);
        assert_eq!(messages.len(), 3);
        assert!(matches!(&messages[0], ClientMessage::CollisionPush(p) if p.target == PlayerId(2)));
        assert_eq!(messages[1], ClientMessage::Checkpoint(CCheckpoint { checkpoint_id: 3 }));
        assert_eq!(messages[2], ClientMessage::LapComplete(CLapComplete { lap: 1 }));
    }

    #[test]
    fn offline_mode_keeps_the_local_vehicle_only() {
        let (mut session, mut world) = joined(1, true);
        session.handle_message(&mut world, ServerMessage::State(state(2, 10.0, 0.0)));
        session.go_offline(&mut world);
        assert!(!session.is_connected());
        assert_eq!(world.vehicles.len(), 1);
        assert!(world.local().is_some());
        assert_eq!(session.state_message(&world), None);
    }
}
