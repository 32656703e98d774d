use bevy_math::{Vec2, Vec3};

use super::spline::{ClosedCurve, catmull_rom, catmull_rom_tangent};
use crate::{
    constants::{
        SEGMENT_BOX_SAMPLES_PER_SPAN, SEGMENT_SPAN_POINTS, SURFACE_COARSE_SAMPLES, SURFACE_REFINE_PASSES,
        SURFACE_REFINE_SAMPLES,
    },
    math::flat,
};

/// Axis-aligned box in the ground plane (x, z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl FlatBounds {
    fn around(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut bounds = Self {
            min: Vec2::splat(f32::INFINITY),
            max: Vec2::splat(f32::NEG_INFINITY),
        };
        for p in points {
            bounds.min = bounds.min.min(p);
            bounds.max = bounds.max.max(p);
        }
        bounds
    }

    #[must_use]
    pub fn padded(self, amount: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Closest point on a segment to a query position, measured in the ground plane.
#[derive(Debug, Clone, Copy)]
pub struct SegmentMatch {
    pub t: f32,
    pub point: Vec3,
    pub distance: f32,
}

/// A contiguous run of skeleton spans with its own local curve.
///
/// `controls` holds the spans' points plus one padding point on each side. The local parameter
/// `t` covers all padded spans; the usable range `[t_start, t_end]` excludes the padding spans,
/// and over that range the local curve coincides with the global closed curve.
#[derive(Debug, Clone)]
pub struct TrackSegment {
    pub id: usize,
    pub start_index: usize,
    pub span_count: usize,
    pub controls: Vec<Vec3>,
    pub t_start: f32,
    pub t_end: f32,
    pub prev: usize,
    pub next: usize,
    pub bounds: FlatBounds,
}

impl TrackSegment {
    fn padded_spans(&self) -> usize {
        self.controls.len() - 1
    }

    fn span(&self, t: f32) -> (usize, f32) {
        let spans = self.padded_spans();
        let s = t.clamp(0.0, 1.0) * spans as f32;
        let j = (s.floor() as usize).min(spans - 1);
        (j, s - j as f32)
    }

    fn controls_for(&self, j: usize) -> (Vec3, Vec3, Vec3, Vec3) {
        let last = self.controls.len() - 1;
        (
            self.controls[j.saturating_sub(1)],
            self.controls[j],
            self.controls[(j + 1).min(last)],
            self.controls[(j + 2).min(last)],
        )
    }

    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec3 {
        let (j, f) = self.span(t);
        let (p0, p1, p2, p3) = self.controls_for(j);
        catmull_rom(p0, p1, p2, p3, f)
    }

    #[must_use]
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let (j, f) = self.span(t);
        let (p0, p1, p2, p3) = self.controls_for(j);
        catmull_rom_tangent(p0, p1, p2, p3, f)
    }

    // Matching parameter on the global closed curve (not wrapped)
    #[must_use]
    pub fn global_param(&self, t: f32) -> f32 {
        (self.padded_spans() as f32).mul_add(t, self.start_index as f32 - 1.0)
    }

    #[must_use]
    pub fn contains(&self, position: Vec3) -> bool {
        self.bounds.contains(flat(position))
    }

    fn sample(&self, t: f32, target: Vec2) -> SegmentMatch {
        let point = self.point_at(t);
        SegmentMatch {
            t,
            point,
            distance: flat(point).distance(target),
        }
    }

    /// Coarse scan of the usable range, then refinement passes in a shrinking window around
    /// the best sample.
    #[must_use]
    pub fn closest_to(&self, position: Vec3) -> SegmentMatch {
        let target = flat(position);
        let mut step = (self.t_end - self.t_start) / SURFACE_COARSE_SAMPLES as f32;

        let mut best = self.sample(self.t_start, target);
        for i in 1..=SURFACE_COARSE_SAMPLES {
            let candidate = self.sample(step.mul_add(i as f32, self.t_start), target);
            if candidate.distance < best.distance {
                best = candidate;
            }
        }

        for _ in 0..SURFACE_REFINE_PASSES {
            let lo = (best.t - step).max(self.t_start);
            let hi = (best.t + step).min(self.t_end);
            step = (hi - lo) / SURFACE_REFINE_SAMPLES as f32;
            for i in 0..=SURFACE_REFINE_SAMPLES {
                let candidate = self.sample(step.mul_add(i as f32, lo), target);
                if candidate.distance < best.distance {
                    best = candidate;
                }
            }
        }

        best
    }
}

// ============================================================================
// Partitioning
// ============================================================================

/// Split the closed curve into segments of `SEGMENT_SPAN_POINTS` spans. The last segment takes
/// whatever is left over.
#[must_use]
pub fn build_segments(curve: &ClosedCurve, half_width: f32) -> Vec<TrackSegment> {
    let n = curve.len();
    if n < 2 {
        return Vec::new();
    }
    let count = n.div_ceil(SEGMENT_SPAN_POINTS);

    (0..count)
        .map(|id| {
            let start_index = id * SEGMENT_SPAN_POINTS;
            let span_count = SEGMENT_SPAN_POINTS.min(n - start_index);
            let controls: Vec<Vec3> = (0..span_count + 3)
                .map(|k| curve.control(start_index as isize + k as isize - 1))
                .collect();
            let padded_spans = (span_count + 2) as f32;

            let mut segment = TrackSegment {
                id,
                start_index,
                span_count,
                controls,
                t_start: 1.0 / padded_spans,
                t_end: (span_count + 1) as f32 / padded_spans,
                prev: (id + count - 1) % count,
                next: (id + 1) % count,
                bounds: FlatBounds::around(std::iter::empty()),
            };

            let samples = span_count * SEGMENT_BOX_SAMPLES_PER_SPAN;
            let range = segment.t_end - segment.t_start;
            segment.bounds = FlatBounds::around(
                (0..=samples).map(|i| flat(segment.point_at(range.mul_add(i as f32 / samples as f32, segment.t_start)))),
            )
            .padded(half_width);
            segment
        })
        .collect()
}
