use anyhow::Result;
use std::time::Duration;
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use common::{
    constants::STATE_SEND_INTERVAL,
    protocol::ClientMessage,
    sync::{SessionEvent, SyncSession},
    vehicle::ControlIntent,
    world::{SimulationWorld, StepOutcome},
};

use crate::{
    autopilot::Autopilot,
    net::{GameToServer, ServerToGame},
};

// ============================================================================
// Game Client
// ============================================================================

/// One participant: the simulation world, the sync session, and the input source.
#[derive(Debug)]
pub struct GameClient {
    world: SimulationWorld,
    session: SyncSession,
    // None drives with no input at all
    autopilot: Option<Autopilot>,
    auto_start: Option<usize>,
    to_server: UnboundedSender<GameToServer>,
}

impl GameClient {
    // ========================================================================
    // Constructor
    // ========================================================================

    #[must_use]
    pub fn new(to_server: UnboundedSender<GameToServer>, autopilot: Option<Autopilot>, auto_start: Option<usize>) -> Self {
        Self {
            world: SimulationWorld::new(),
            session: SyncSession::new(),
            autopilot,
            auto_start,
            to_server,
        }
    }

    // ========================================================================
    // Public API
    // ========================================================================

    #[must_use]
    pub const fn world(&self) -> &SimulationWorld {
        &self.world
    }

    #[must_use]
    pub const fn session(&self) -> &SyncSession {
        &self.session
    }

    fn send(&self, msg: ClientMessage) {
        if !self.session.is_connected() {
            return;
        }
        if let Err(e) = self.to_server.send(GameToServer::Send(msg)) {
            debug!("network task gone: {e}");
        }
    }

    /// Dispatch one event from the network task within the current frame.
    pub fn process_network_event(&mut self, event: ServerToGame) {
        match event {
            ServerToGame::Message(msg) => {
                if let Some(event) = self.session.handle_message(&mut self.world, msg) {
                    log_session_event(&event);
                }
            }
            ServerToGame::Disconnected => self.session.go_offline(&mut self.world),
        }
    }

    /// Advance one frame: read input, step the world, report what happened, and run host duties.
    pub fn frame(&mut self, dt: f32) -> StepOutcome {
        let intent = match (self.autopilot, self.world.local()) {
            (Some(autopilot), Some(local)) => autopilot.intent(local, self.world.track.as_ref()),
            _ => ControlIntent::coast(),
        };
        let outcome = self.world.step(dt, intent);

        let host_messages = self.session.poll_host(&self.world, dt);
        for msg in self.session.step_messages(&outcome).into_iter().chain(host_messages) {
            self.send(msg);
        }
        if let Some(wanted) = self.auto_start
            && let Some(msg) = self.session.auto_start(&self.world, wanted)
        {
            self.send(msg);
        }
        outcome
    }

    // Periodic snapshot of the local vehicle
    pub fn send_state(&self) {
        if let Some(msg) = self.session.state_message(&self.world) {
            self.send(msg);
        }
    }

    pub fn close(&self) {
        let _ = self.to_server.send(GameToServer::Close);
    }
}

fn log_session_event(event: &SessionEvent) {
    match event {
        SessionEvent::Welcomed { id, is_host, can_play } => info!(?id, is_host, can_play, "joined"),
        SessionEvent::RoundStarted {
            track_seed,
            restart,
            racing,
        } => info!(track_seed, restart, racing, "round started"),
        SessionEvent::PromotedToHost => info!("now hosting"),
        SessionEvent::PeerLeft(id) => info!(?id, "peer left"),
        SessionEvent::Pushed { source, force } => debug!(?source, ?force, "pushed"),
        SessionEvent::GameOver { winner_id } => info!(?winner_id, "game over"),
    }
}

// ============================================================================
// Frame Loop
// ============================================================================

/// Run frames at `frame_rate` until interrupted. Incoming messages are drained at the start of
/// every frame; the state snapshot goes out on its own wall-clock interval.
pub async fn run_frame_loop(
    mut client: GameClient,
    mut from_server: UnboundedReceiver<ServerToGame>,
    frame_rate: u32,
) -> Result<()> {
    let mut frame = time::interval(Duration::from_secs_f64(1.0 / f64::from(frame_rate.max(1))));
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut state_send = time::interval(Duration::from_secs_f32(STATE_SEND_INTERVAL));
    state_send.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_frame = Instant::now();
    let mut channel_open = true;

    loop {
        tokio::select! {
            _ = frame.tick() => {
                while channel_open {
                    match from_server.try_recv() {
                        Ok(event) => client.process_network_event(event),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            channel_open = false;
                            client.process_network_event(ServerToGame::Disconnected);
                        }
                    }
                }
                let now = Instant::now();
                let dt = now.duration_since(last_frame).as_secs_f32();
                last_frame = now;
                client.frame(dt);
            }

            _ = state_send.tick() => {
                client.send_state();
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                client.close();
                return Ok(());
            }
        }
    }
}
