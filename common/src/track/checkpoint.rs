use bevy_math::Vec3;

use super::spline::ClosedCurve;
use crate::{
    constants::PHYSICS_EPSILON,
    math::{flat, flat_direction},
};

/// A line across the track that vehicles must cross.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub id: usize,
    // Position on the global curve
    pub param: f32,
    pub position: Vec3,
    // Horizontal direction of travel at the line
    pub direction: Vec3,
    pub left_edge: Vec3,
    pub right_edge: Vec3,
}

impl Checkpoint {
    /// Line perpendicular to the track at `param`, spanning the full corridor width.
    #[must_use]
    pub fn on_curve(id: usize, curve: &ClosedCurve, param: f32, half_width: f32) -> Self {
        let position = curve.point_at(param);
        let direction = travel_direction(curve, param);
        let left = left_of(direction);
        Self {
            id,
            param,
            position,
            direction,
            left_edge: position + left * half_width,
            right_edge: position - left * half_width,
        }
    }

    #[must_use]
    pub fn crossed_by(&self, old_pos: Vec3, new_pos: Vec3) -> bool {
        crosses(old_pos, new_pos, self.left_edge, self.right_edge)
    }
}

// Horizontal unit direction along the curve; never zero
#[must_use]
pub fn travel_direction(curve: &ClosedCurve, param: f32) -> Vec3 {
    let tangent = curve.tangent_at(param);
    let dir = flat_direction(Vec3::ZERO, tangent);
    if dir != Vec3::ZERO {
        return dir;
    }
    let dir = flat_direction(curve.point_at(param), curve.point_at(param + 0.5));
    if dir == Vec3::ZERO { Vec3::Z } else { dir }
}

// Left-hand perpendicular of a horizontal direction (forward +Z has +X on its left)
#[must_use]
pub const fn left_of(direction: Vec3) -> Vec3 {
    Vec3::new(direction.z, 0.0, -direction.x)
}

// Checkpoints sit halfway between consecutive finish-relative quarter marks, which keeps them
// clear of the finish line at 0 and of the figure-eight crossings at N/4 and 3N/4.
#[must_use]
pub fn checkpoint_params(skeleton_len: usize, count: usize) -> Vec<f32> {
    (0..count)
        .map(|k| (2 * k + 1) as f32 * skeleton_len as f32 / (2 * count) as f32)
        .collect()
}

// ============================================================================
// Crossing Test
// ============================================================================

/// Whether the movement `old_pos -> new_pos` crosses the line `edge_a -> edge_b` in the ground
/// plane. Parallel and zero-length movements never cross.
#[must_use]
pub fn crosses(old_pos: Vec3, new_pos: Vec3, edge_a: Vec3, edge_b: Vec3) -> bool {
    let p = flat(old_pos);
    let r = flat(new_pos) - p;
    let q = flat(edge_a);
    let s = flat(edge_b) - q;

    let denom = r.perp_dot(s);
    if denom.abs() < PHYSICS_EPSILON {
        return false;
    }

    let qp = q - p;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}
