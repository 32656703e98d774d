use bevy_math::Vec3;

use crate::{
    constants::PHYSICS_EPSILON,
    math::{flat, flat_direction},
};

/// Result of a boundary check that found the vehicle outside the drivable corridor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    // Horizontal unit vector from the vehicle toward the centerline; zero Y
    pub correction: Vec3,
    // How far the vehicle is beyond the allowed distance
    pub penetration: f32,
    pub closest_point: Vec3,
}

// Clamped projection of `position` onto the edge `a -> b`, measured in the ground plane
#[must_use]
pub fn closest_on_edge(position: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = flat(b) - flat(a);
    let len_sq = ab.length_squared();
    if len_sq < PHYSICS_EPSILON {
        return a;
    }
    let t = ((flat(position) - flat(a)).dot(ab) / len_sq).clamp(0.0, 1.0);
    a.lerp(b, t)
}

/// Closest point on the closed skeleton polyline and its horizontal distance, or `None` for an
/// empty skeleton.
#[must_use]
pub fn closest_on_skeleton(skeleton: &[Vec3], position: Vec3) -> Option<(Vec3, f32)> {
    let n = skeleton.len();
    let mut best: Option<(Vec3, f32)> = None;
    for i in 0..n {
        let point = closest_on_edge(position, skeleton[i], skeleton[(i + 1) % n]);
        let distance = flat(point).distance(flat(position));
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((point, distance));
        }
    }
    best
}

/// Check `position` against the corridor of `half_width` around the skeleton, shrunk by the
/// vehicle radius.
#[must_use]
pub fn wall_collision(skeleton: &[Vec3], half_width: f32, vehicle_radius: f32, position: Vec3) -> Option<WallContact> {
    let (closest_point, distance) = closest_on_skeleton(skeleton, position)?;
    let allowed = half_width - vehicle_radius;
    if distance <= allowed {
        return None;
    }
    Some(WallContact {
        correction: flat_direction(position, closest_point),
        penetration: distance - allowed,
        closest_point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(200.0, 0.0, 0.0),
            Vec3::new(200.0, 0.0, 200.0),
            Vec3::new(0.0, 0.0, 200.0),
        ]
    }

    #[test]
    fn two_units_outside_the_corridor() {
        // half width 14, radius 2: allowed distance 12, vehicle at 14
        let contact = wall_collision(&square(), 14.0, 2.0, Vec3::new(100.0, 5.0, -14.0)).expect("outside");
        assert!((contact.penetration - 2.0).abs() < 1e-4);
        assert_eq!(contact.correction.y, 0.0);
        assert!((contact.correction - Vec3::Z).length() < 1e-5);
        assert!((contact.closest_point - Vec3::new(100.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn inside_the_corridor_is_clear() {
        assert_eq!(wall_collision(&square(), 14.0, 2.0, Vec3::new(100.0, 0.0, 11.5)), None);
        assert_eq!(wall_collision(&square(), 14.0, 2.0, Vec3::new(200.0, 0.0, 100.0)), None);
    }

    #[test]
    fn corner_uses_the_globally_closest_edge() {
        let (point, distance) = closest_on_skeleton(&square(), Vec3::new(-3.0, 0.0, -4.0)).expect("non-empty");
        assert!(point.length() < 1e-5);
        assert!((distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_edges_are_handled() {
        let skeleton = vec![Vec3::ZERO, Vec3::ZERO];
        let contact = wall_collision(&skeleton, 5.0, 1.0, Vec3::new(10.0, 0.0, 0.0)).expect("outside");
        assert!((contact.penetration - 6.0).abs() < 1e-5);
        assert_eq!(closest_on_skeleton(&[], Vec3::ZERO), None);
    }
}
