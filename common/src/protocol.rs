#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};

// Macro to reduce boilerplate for structs
macro_rules! message {
    ($(#[$meta:meta])* struct $name:ident $body:tt) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        #[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "json", serde(rename_all = "camelCase"))]
        #[cfg_attr(feature = "bincode", derive(Encode, Decode))]
        pub struct $name $body
    };
}

// ============================================================================
// Common Data Types
// ============================================================================

// Identifies a connected peer and the vehicle it drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub struct PlayerId(pub u32);

// ============================================================================
// Client Messages
// ============================================================================

message! {
// Client to Relay: periodic snapshot of the sender's own vehicle.
struct CState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rot_y: f32,
    pub vx: f32,
    pub vz: f32,
    pub lives: u32,
    pub lap: u32,
    pub segment_id: Option<u32>,
    pub segment_t: f32,
}
}

message! {
// Client to Relay: impulse for another peer's vehicle.
struct CCollisionPush {
    pub target: PlayerId,
    pub force_x: f32,
    pub force_y: f32,
    pub force_z: f32,
}
}

message! {
// Client to Relay (host only): start a round.
struct CStartGame {
    pub player_count: u32,
}
}

message! {
// Client to Relay (host only): restart after a finished round.
struct CGameRestart {
    pub player_count: u32,
}
}

message! {
// Client to Relay (host only): round outcome, `None` for a draw.
struct CGameOver {
    pub winner_id: Option<PlayerId>,
}
}

message! {
// Client to Relay: a checkpoint was cleared on the current lap.
struct CCheckpoint {
    pub checkpoint_id: u32,
}
}

message! {
// Client to Relay: a lap was completed.
struct CLapComplete {
    pub lap: u32,
}
}

// ============================================================================
// Server Messages
// ============================================================================

message! {
// Relay to Client: identity, role and join eligibility.
struct SWelcome {
    pub id: PlayerId,
    pub is_host: bool,
    pub can_play: bool,
    pub game_active: bool,
    pub track_seed: u64,
}
}

message! {
// Relay to Client: another peer's vehicle snapshot, lap and lives re-validated.
struct SState {
    pub sender: PlayerId,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rot_y: f32,
    pub vx: f32,
    pub vz: f32,
    pub lives: u32,
    pub lap: u32,
    pub segment_id: Option<u32>,
    pub segment_t: f32,
}
}

message! {
// Relay to Client: impulse for the recipient's own vehicle.
struct SCollisionPush {
    pub source: PlayerId,
    pub target: PlayerId,
    pub force_x: f32,
    pub force_y: f32,
    pub force_z: f32,
}
}

message! {
// Relay to Client: a peer left or was purged.
struct SDisconnect {
    pub id: PlayerId,
}
}

message! {
// Relay to Client: the recipient is now the host.
struct SYouAreHost {}
}

message! {
// Relay to Client: a round starts on a fresh track.
struct SStartGame {
    pub player_count: u32,
    pub track_seed: u64,
    pub roster: Vec<PlayerId>,
}
}

message! {
// Relay to Client: a round restarts on a fresh track.
struct SGameRestart {
    pub player_count: u32,
    pub track_seed: u64,
    pub roster: Vec<PlayerId>,
}
}

message! {
// Relay to Client: the round ended, `None` for a draw.
struct SGameOver {
    pub winner_id: Option<PlayerId>,
}
}

// ============================================================================
// Message Envelopes
// ============================================================================

// All client to relay messages
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(tag = "type", rename_all = "snake_case"))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub enum ClientMessage {
    State(CState),
    CollisionPush(CCollisionPush),
    StartGame(CStartGame),
    GameRestart(CGameRestart),
    GameOver(CGameOver),
    Checkpoint(CCheckpoint),
    LapComplete(CLapComplete),
}

// All relay to client messages
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(tag = "type", rename_all = "snake_case"))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
pub enum ServerMessage {
    Welcome(SWelcome),
    State(SState),
    CollisionPush(SCollisionPush),
    Disconnect(SDisconnect),
    YouAreHost(SYouAreHost),
    StartGame(SStartGame),
    GameRestart(SGameRestart),
    GameOver(SGameOver),
}

impl ClientMessage {
    // Wire tag, used for logging
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::CollisionPush(_) => "collision_push",
            Self::StartGame(_) => "start_game",
            Self::GameRestart(_) => "game_restart",
            Self::GameOver(_) => "game_over",
            Self::Checkpoint(_) => "checkpoint",
            Self::LapComplete(_) => "lap_complete",
        }
    }
}

impl ServerMessage {
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Welcome(_) => "welcome",
            Self::State(_) => "state",
            Self::CollisionPush(_) => "collision_push",
            Self::Disconnect(_) => "disconnect",
            Self::YouAreHost(_) => "you_are_host",
            Self::StartGame(_) => "start_game",
            Self::GameRestart(_) => "game_restart",
            Self::GameOver(_) => "game_over",
        }
    }
}

impl CState {
    // Stamp the relay-validated lap and lives plus the sender before forwarding
    #[must_use]
    pub fn into_forwarded(self, sender: PlayerId, lap: u32, lives: u32) -> SState {
        SState {
            sender,
            x: self.x,
            y: self.y,
            z: self.z,
            rot_y: self.rot_y,
            vx: self.vx,
            vz: self.vz,
            lives,
            lap,
            segment_id: self.segment_id,
            segment_t: self.segment_t,
        }
    }
}

impl CCollisionPush {
    #[must_use]
    pub fn into_forwarded(self, source: PlayerId) -> SCollisionPush {
        SCollisionPush {
            source,
            target: self.target,
            force_x: self.force_x,
            force_y: self.force_y,
            force_z: self.force_z,
        }
    }
}
