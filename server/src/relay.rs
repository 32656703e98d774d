use rand::Rng;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, trace, warn};

use crate::net::{ClientToServer, ServerToClient};
use common::{
    constants::{RACE_LAPS, STARTING_LIVES},
    laps::LapTracker,
    track::TrackConfig,
};
#[allow(clippy::wildcard_imports)]
use common::protocol::*;

// ============================================================================
// Peer Records
// ============================================================================

// What the relay believes about one peer, independent of what the peer claims
#[derive(Debug)]
struct Peer {
    to_client: UnboundedSender<ServerToClient>,
    last_seen: Instant,
    // Racing in the current round; peers that joined mid-round only watch
    participant: bool,
    lives: u32,
    laps: LapTracker,
}

impl Peer {
    fn enter_round(&mut self) {
        self.participant = true;
        self.lives = STARTING_LIVES;
        self.laps.reset();
    }
}

// ============================================================================
// Relay
// ============================================================================

/// Message routing and round authority for a group of peers.
///
/// The relay owns no simulation. It forwards snapshots and pushes, honors round control only from
/// the host, and re-validates the lap and lives every peer reports. I/O lives in the per-peer
/// tasks; everything here runs on the relay's message loop.
#[derive(Debug)]
pub struct Relay {
    peers: HashMap<PlayerId, Peer>,
    // Host promotion follows this order
    join_order: Vec<PlayerId>,
    host: Option<PlayerId>,
    game_active: bool,
    track_seed: u64,
    fixed_seed: Option<u64>,
}

impl Relay {
    // ========================================================================
    // Constructor
    // ========================================================================

    #[must_use]
    pub fn new(fixed_seed: Option<u64>) -> Self {
        let mut relay = Self {
            peers: HashMap::new(),
            join_order: Vec::new(),
            host: None,
            game_active: false,
            track_seed: 0,
            fixed_seed,
        };
        relay.track_seed = relay.next_seed();
        relay
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub const fn host(&self) -> Option<PlayerId> {
        self.host
    }

    #[must_use]
    pub const fn game_active(&self) -> bool {
        self.game_active
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    #[must_use]
    pub fn validated_lap(&self, id: PlayerId) -> Option<u32> {
        self.peers.get(&id).map(|peer| peer.laps.lap())
    }

    #[must_use]
    pub fn validated_lives(&self, id: PlayerId) -> Option<u32> {
        self.peers.get(&id).map(|peer| peer.lives)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn next_seed(&self) -> u64 {
        self.fixed_seed.unwrap_or_else(|| rand::rng().random())
    }

    fn checkpoint_count(&self) -> usize {
        TrackConfig::for_seed(self.track_seed).num_checkpoints
    }

    fn participants(&self) -> impl Iterator<Item = (&PlayerId, &Peer)> {
        self.peers.iter().filter(|(_, peer)| peer.participant)
    }

    fn send_to(&self, id: PlayerId, msg: &ServerMessage) {
        if let Some(peer) = self.peers.get(&id)
            && let Err(e) = peer.to_client.send(ServerToClient::Send(msg.clone()))
        {
            debug!(?id, "failed to send to peer: {e}");
        }
    }

    fn send_to_all(&self, msg: &ServerMessage) {
        for id in self.peers.keys() {
            self.send_to(*id, msg);
        }
    }

    fn send_to_others(&self, sender: PlayerId, msg: &ServerMessage) {
        for id in self.peers.keys().filter(|id| **id != sender) {
            self.send_to(*id, msg);
        }
    }

    // ========================================================================
    // Peer Lifecycle
    // ========================================================================

    /// Add a freshly connected peer. The first peer of an empty group becomes host; a peer joining
    /// while a round runs may only watch until the next one.
    #[instrument(skip(self, to_client, now))]
    pub fn register(&mut self, id: PlayerId, to_client: UnboundedSender<ServerToClient>, now: Instant) {
        let can_play = !self.game_active;
        self.peers.insert(
            id,
            Peer {
                to_client,
                last_seen: now,
                participant: false,
                lives: STARTING_LIVES,
                laps: LapTracker::new(),
            },
        );
        self.join_order.push(id);
        let is_host = self.host.is_none();
        if is_host {
            self.host = Some(id);
        }
        info!(is_host, can_play, peers = self.peers.len(), "peer joined");

        self.send_to(
            id,
            &ServerMessage::Welcome(SWelcome {
                id,
                is_host,
                can_play,
                game_active: self.game_active,
                track_seed: self.track_seed,
            }),
        );
    }

    /// Remove a peer, whether it disconnected, timed out or was purged.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self, id: PlayerId) {
        let Some(peer) = self.peers.remove(&id) else {
            return;
        };
        // The I/O task may already have terminated
        let _ = peer.to_client.send(ServerToClient::Close);
        self.join_order.retain(|entry| *entry != id);
        info!(peers = self.peers.len(), "peer left");

        self.send_to_all(&ServerMessage::Disconnect(SDisconnect { id }));

        if self.host == Some(id) {
            self.host = self.join_order.first().copied();
            if let Some(new_host) = self.host {
                info!(?new_host, "promoting host");
                self.send_to(new_host, &ServerMessage::YouAreHost(SYouAreHost {}));
            }
        }

        if self.game_active && self.participants().next().is_none() {
            info!("no participants left, round ended");
            self.game_active = false;
        }
    }

    /// Drop every peer silent for longer than `timeout`.
    pub fn purge_inactive(&mut self, now: Instant, timeout: Duration) {
        let stale: Vec<PlayerId> = self
            .peers
            .iter()
            .filter(|(_, peer)| now.saturating_duration_since(peer.last_seen) > timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            warn!(?id, "purging inactive peer");
            self.disconnect(id);
        }
    }

    // ========================================================================
    // Message Handling
    // ========================================================================

    /// Apply one event from the network tasks, in the order they were queued.
    pub fn handle_event(&mut self, id: PlayerId, event: ClientToServer, now: Instant) {
        match event {
            ClientToServer::Registered(to_client) => self.register(id, to_client, now),
            ClientToServer::Message(msg) => self.process_client_message(id, msg, now),
            ClientToServer::Disconnected => self.disconnect(id),
        }
    }

    #[instrument(skip(self, msg, now), fields(tag = msg.tag()))]
    pub fn process_client_message(&mut self, id: PlayerId, msg: ClientMessage, now: Instant) {
        let Some(peer) = self.peers.get_mut(&id) else {
            debug!("message from unknown peer dropped");
            return;
        };
        peer.last_seen = now;

        match msg {
            ClientMessage::State(state) => self.process_state(id, state),
            ClientMessage::CollisionPush(push) => self.process_push(id, push),
            ClientMessage::Checkpoint(checkpoint) => self.process_checkpoint(id, checkpoint.checkpoint_id),
            ClientMessage::LapComplete(lap) => self.process_lap_complete(id, lap.lap),
            ClientMessage::StartGame(_) => {
                if !self.require_host(id) {
                    return;
                }
                if self.game_active {
                    warn!("start_game while a round is active ignored");
                    return;
                }
                self.start_round(false);
            }
            ClientMessage::GameRestart(_) => {
                if self.require_host(id) {
                    self.start_round(true);
                }
            }
            ClientMessage::GameOver(over) => {
                if self.require_host(id) {
                    self.process_game_over(over.winner_id);
                }
            }
        }
    }

    fn require_host(&self, id: PlayerId) -> bool {
        let is_host = self.host == Some(id);
        if !is_host {
            warn!(?id, host = ?self.host, "protocol violation: round control from a non-host peer");
        }
        is_host
    }

    fn process_state(&mut self, id: PlayerId, state: CState) {
        let game_active = self.game_active;
        let Some(peer) = self.peers.get_mut(&id) else {
            return;
        };
        if !game_active {
            peer.lives = state.lives;
        } else if peer.participant {
            if state.lives > peer.lives {
                warn!(claimed = state.lives, validated = peer.lives, "lives increase clamped");
            }
            peer.lives = peer.lives.min(state.lives);
        }
        // Mid-round joiners show as out of lives so nobody races or pushes them
        let lives = if game_active && !peer.participant { 0 } else { peer.lives };
        let lap = peer.laps.lap();
        if state.lap != lap {
            trace!(claimed = state.lap, validated = lap, "lap overwritten");
        }
        self.send_to_others(id, &ServerMessage::State(state.into_forwarded(id, lap, lives)));
    }

    fn process_push(&self, id: PlayerId, push: CCollisionPush) {
        let target = push.target;
        if target == id || !self.peers.contains_key(&target) {
            debug!(?target, "push for unknown or own vehicle dropped");
            return;
        }
        self.send_to(target, &ServerMessage::CollisionPush(push.into_forwarded(id)));
    }

    fn process_checkpoint(&mut self, id: PlayerId, checkpoint_id: u32) {
        let count = self.checkpoint_count();
        let game_active = self.game_active;
        let Some(peer) = self.peers.get_mut(&id) else {
            return;
        };
        if !game_active || !peer.participant {
            debug!(checkpoint_id, "checkpoint outside a round ignored");
            return;
        }
        let index = checkpoint_id as usize;
        if index >= count {
            warn!(checkpoint_id, count, "checkpoint out of range");
            return;
        }
        if peer.laps.record_checkpoint(index) {
            trace!(checkpoint_id, "checkpoint validated");
        }
    }

    fn process_lap_complete(&mut self, id: PlayerId, lap: u32) {
        let count = self.checkpoint_count();
        let game_active = self.game_active;
        let Some(peer) = self.peers.get_mut(&id) else {
            return;
        };
        if !game_active || !peer.participant {
            debug!(lap, "lap outside a round ignored");
            return;
        }
        let validated = peer.laps.lap();
        if lap <= validated {
            warn!(claimed = lap, validated, "stale lap_complete ignored");
            return;
        }
        if peer.laps.record_finish(count).is_none() {
            warn!(
                cleared = peer.laps.cleared().len(),
                count, "lap_complete without a full checkpoint set"
            );
            return;
        }
        // An earlier lap_complete may have been rejected; the full set vouches for the claim
        if lap > validated + 1 {
            warn!(claimed = lap, validated, "lap count resynchronized");
            peer.laps.set_lap(lap);
        }
        info!(?id, lap, "lap validated");
    }

    fn start_round(&mut self, restart: bool) {
        self.track_seed = self.next_seed();
        self.game_active = true;
        for peer in self.peers.values_mut() {
            peer.enter_round();
        }
        let roster = self.join_order.clone();
        let player_count = roster.len() as u32;
        info!(restart, player_count, track_seed = self.track_seed, "round starting");

        let msg = if restart {
            ServerMessage::GameRestart(SGameRestart {
                player_count,
                track_seed: self.track_seed,
                roster,
            })
        } else {
            ServerMessage::StartGame(SStartGame {
                player_count,
                track_seed: self.track_seed,
                roster,
            })
        };
        self.send_to_all(&msg);
    }

    // A winner must have finished the race or be the last participant with lives; a draw needs
    // every participant out of lives
    fn winner_is_valid(&self, winner_id: Option<PlayerId>) -> bool {
        let mut survivors = self.participants().filter(|(_, peer)| peer.lives > 0);
        match winner_id {
            Some(winner) => {
                let Some(peer) = self.peers.get(&winner).filter(|peer| peer.participant) else {
                    return false;
                };
                if peer.laps.lap() >= RACE_LAPS {
                    return true;
                }
                matches!((survivors.next(), survivors.next()), (Some((id, _)), None) if *id == winner)
            }
            None => survivors.next().is_none(),
        }
    }

    fn process_game_over(&mut self, winner_id: Option<PlayerId>) {
        if !self.game_active {
            warn!("game_over without an active round ignored");
            return;
        }
        if !self.winner_is_valid(winner_id) {
            warn!(?winner_id, "game_over rejected by validation");
            return;
        }
        self.game_active = false;
        info!(?winner_id, "round over");
        self.send_to_all(&ServerMessage::GameOver(SGameOver { winner_id }));
    }
}
