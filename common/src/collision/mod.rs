// Collision detection and response for the local vehicle
mod vehicles;
mod walls;

pub use vehicles::{find_push, recoil_after_push};
pub use walls::resolve_wall_collision;

use bevy_math::Vec3;

use crate::protocol::PlayerId;

/// Transient outcome of a collision check, consumed by the network layer and effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEvent {
    // The vehicle was pushed back inside the corridor
    Wall { correction: Vec3, penetration: f32 },
    // Too far outside the corridor: a life was lost
    FellOff { lives_left: u32 },
    // Impulse for another peer's vehicle
    Push { target: PlayerId, force: Vec3 },
}
