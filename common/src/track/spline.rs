use bevy_math::Vec3;

// ============================================================================
// Catmull-Rom Basis
// ============================================================================

// Uniform Catmull-Rom point between `p1` and `p2`, `t` in [0, 1]
#[must_use]
pub fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

// Derivative of `catmull_rom` with respect to `t`
#[must_use]
pub fn catmull_rom_tangent(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    0.5 * ((p2 - p0) + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * (2.0 * t) + (3.0 * p1 - p0 - 3.0 * p2 + p3) * (3.0 * t2))
}

// ============================================================================
// Closed Curve
// ============================================================================

/// Closed interpolating curve through every skeleton point.
///
/// The parameter `u` runs over skeleton indices: `u = i` is exactly skeleton point `i`, and the
/// curve wraps so that `u` and `u + len()` name the same point.
#[derive(Debug, Clone)]
pub struct ClosedCurve {
    points: Vec<Vec3>,
}

impl ClosedCurve {
    #[must_use]
    pub const fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn control(&self, index: isize) -> Vec3 {
        let n = self.points.len() as isize;
        self.points[index.rem_euclid(n) as usize]
    }

    // Wrap a parameter into [0, len)
    #[must_use]
    pub fn wrap(&self, u: f32) -> f32 {
        u.rem_euclid(self.points.len() as f32)
    }

    fn span(&self, u: f32) -> (isize, f32) {
        let u = self.wrap(u);
        let i = u.floor();
        (i as isize, u - i)
    }

    #[must_use]
    pub fn point_at(&self, u: f32) -> Vec3 {
        if self.points.len() < 2 {
            return self.points.first().copied().unwrap_or(Vec3::ZERO);
        }
        let (i, f) = self.span(u);
        catmull_rom(self.control(i - 1), self.control(i), self.control(i + 1), self.control(i + 2), f)
    }

    #[must_use]
    pub fn tangent_at(&self, u: f32) -> Vec3 {
        if self.points.len() < 2 {
            return Vec3::ZERO;
        }
        let (i, f) = self.span(u);
        catmull_rom_tangent(self.control(i - 1), self.control(i), self.control(i + 1), self.control(i + 2), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> ClosedCurve {
        ClosedCurve::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 1.0, 0.0),
            Vec3::new(10.0, 2.0, 10.0),
            Vec3::new(0.0, 1.0, 10.0),
        ])
    }

    #[test]
    fn curve_passes_through_control_points() {
        let curve = square();
        for i in 0..4 {
            let p = curve.point_at(i as f32);
            assert!((p - curve.control(i)).length() < 1e-5);
        }
    }

    #[test]
    fn curve_wraps_around() {
        let curve = square();
        assert!((curve.point_at(4.25) - curve.point_at(0.25)).length() < 1e-5);
        assert!((curve.point_at(-0.75) - curve.point_at(3.25)).length() < 1e-5);
    }

    #[test]
    fn tangent_matches_finite_difference() {
        let curve = square();
        let u = 1.3;
        let h = 1e-3;
        let numeric = (curve.point_at(u + h) - curve.point_at(u - h)) / (2.0 * h);
        assert!((numeric - curve.tangent_at(u)).length() < 1e-2);
    }
}
