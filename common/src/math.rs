use bevy_math::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

use crate::constants::PHYSICS_EPSILON;

// ============================================================================
// Angles
// ============================================================================

// Wrap an angle into [-PI, PI]
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid maps exactly PI to -PI, keep the sign of the input for that edge
    if wrapped <= -PI && angle > 0.0 { PI } else { wrapped }
}

// Interpolate from `from` toward `to` along the shortest arc
#[must_use]
pub fn lerp_angle(from: f32, to: f32, fraction: f32) -> f32 {
    wrap_angle(from + wrap_angle(to - from) * fraction)
}

// Yaw convention: forward is (sin yaw, 0, cos yaw)
#[must_use]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

// Heading of a horizontal direction, `None` for a zero-length direction
#[must_use]
pub fn yaw_from_direction(dir: Vec3) -> Option<f32> {
    if dir.x.hypot(dir.z) < PHYSICS_EPSILON {
        None
    } else {
        Some(dir.x.atan2(dir.z))
    }
}

// ============================================================================
// Planar Helpers
// ============================================================================

// Project onto the ground plane (x, z)
#[must_use]
pub const fn flat(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

// Horizontal distance, ignoring altitude
#[must_use]
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    (a.x - b.x).hypot(a.z - b.z)
}

// Unit direction in the ground plane with the Y component zeroed; zero vector for degenerate input
#[must_use]
pub fn flat_direction(from: Vec3, to: Vec3) -> Vec3 {
    let delta = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    let len = delta.length();
    if len < PHYSICS_EPSILON { Vec3::ZERO } else { delta / len }
}

// Convergence factor for a rate applied over `dt`, never overshooting
#[must_use]
pub fn follow_fraction(rate: f32, dt: f32) -> f32 {
    (rate * dt).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_angle_stays_in_range() {
        for i in -40..=40 {
            let a = i as f32 * 0.77;
            let w = wrap_angle(a);
            assert!((-PI..=PI).contains(&w), "{a} wrapped to {w}");
            assert!(((a - w) / TAU - ((a - w) / TAU).round()).abs() < 1e-4);
        }
    }

    #[test]
    fn lerp_angle_takes_the_short_way_across_pi() {
        let from = PI - 0.1;
        let to = -PI + 0.1;
        let half = lerp_angle(from, to, 0.5);
        assert!((half.abs() - PI).abs() < 1e-4, "expected ~PI, got {half}");
    }

    #[test]
    fn flat_direction_of_coincident_points_is_zero() {
        let p = Vec3::new(3.0, 1.0, -2.0);
        assert_eq!(flat_direction(p, p), Vec3::ZERO);
        assert_eq!(yaw_from_direction(Vec3::ZERO), None);
    }

    #[test]
    fn forward_and_yaw_agree() {
        let yaw = 1.1;
        let back = yaw_from_direction(forward_from_yaw(yaw)).expect("non-zero");
        assert!((back - yaw).abs() < 1e-5);
    }
}
