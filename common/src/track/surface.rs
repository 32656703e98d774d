use bevy_math::Vec3;
use tracing::trace;

use super::{TrackSurface, segment::SegmentMatch};
use crate::{
    constants::{
        DEFAULT_ALTITUDE, MAX_BANK_ANGLE, PHYSICS_EPSILON, ROLL_CURVATURE_SCALE, ROLL_SAMPLE_OFFSET, SURFACE_TIE_EPSILON,
    },
    math::flat,
};

/// Where a position sits on the track surface and how the surface is oriented there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInfo {
    pub altitude: f32,
    // Angle of the tangent above the horizontal plane
    pub pitch: f32,
    // Bank angle, positive where the track bends right
    pub roll: f32,
    pub segment_id: usize,
    pub t: f32,
    // Horizontal distance from the query position to the matched point
    pub distance: f32,
    pub point: Vec3,
}

impl SurfaceInfo {
    // Level ground at the default altitude, used when there is no track
    #[must_use]
    pub const fn flat(position: Vec3) -> Self {
        Self {
            altitude: DEFAULT_ALTITUDE,
            pitch: 0.0,
            roll: 0.0,
            segment_id: 0,
            t: 0.0,
            distance: 0.0,
            point: Vec3::new(position.x, DEFAULT_ALTITUDE, position.z),
        }
    }
}

impl TrackSurface {
    /// Locate `position` on the surface.
    ///
    /// With a segment hint only the hinted segment and its neighbours are searched, which keeps a
    /// vehicle on its own level where the track crosses itself. Without a usable hint every
    /// segment whose bounds contain the position is searched; if none does, all are.
    #[must_use]
    pub fn surface_at(&self, position: Vec3, hint: Option<usize>) -> SurfaceInfo {
        let mut candidates = self.hinted_candidates(position, hint);
        if candidates.is_empty() {
            candidates = self
                .segments
                .iter()
                .filter(|segment| segment.contains(position))
                .map(|segment| segment.id)
                .collect();
        }
        if candidates.is_empty() {
            trace!(?position, "position outside every segment bound");
            candidates = (0..self.segments.len()).collect();
        }

        let mut best: Option<(usize, SegmentMatch)> = None;
        for id in candidates {
            let found = self.segments[id].closest_to(position);
            if best.is_none_or(|(_, current)| is_better_match(&found, &current, position.y)) {
                best = Some((id, found));
            }
        }

        let Some((segment_id, found)) = best else {
            return SurfaceInfo::flat(position);
        };

        let segment = &self.segments[segment_id];
        let tangent = segment.tangent_at(found.t);
        let pitch = tangent.y.atan2(tangent.x.hypot(tangent.z));
        let roll = self.bank_at(segment.global_param(found.t));

        SurfaceInfo {
            altitude: found.point.y,
            pitch,
            roll,
            segment_id,
            t: found.t,
            distance: found.distance,
            point: found.point,
        }
    }

    // Ascending, de-duplicated, and limited to segments whose bounds contain the position
    fn hinted_candidates(&self, position: Vec3, hint: Option<usize>) -> Vec<usize> {
        let Some(segment) = hint.and_then(|id| self.segments.get(id)) else {
            return Vec::new();
        };
        let mut ids = vec![segment.prev, segment.id, segment.next];
        ids.sort_unstable();
        ids.dedup();
        ids.retain(|&id| self.segments[id].contains(position));
        ids
    }

    // Signed turning angle between samples just before and just after `param`, scaled and clamped
    fn bank_at(&self, param: f32) -> f32 {
        let before = flat(self.curve.point_at(param - ROLL_SAMPLE_OFFSET));
        let here = flat(self.curve.point_at(param));
        let after = flat(self.curve.point_at(param + ROLL_SAMPLE_OFFSET));
        let incoming = here - before;
        let outgoing = after - here;
        if incoming.length() < PHYSICS_EPSILON || outgoing.length() < PHYSICS_EPSILON {
            return 0.0;
        }
        let turn = incoming.perp_dot(outgoing).atan2(incoming.dot(outgoing));
        (turn * ROLL_CURVATURE_SCALE).clamp(-MAX_BANK_ANGLE, MAX_BANK_ANGLE)
    }
}

// Nearer in the ground plane wins; near-ties go to the match closest in altitude, and remaining
// ties keep the earlier (lower) segment ID.
fn is_better_match(candidate: &SegmentMatch, current: &SegmentMatch, altitude: f32) -> bool {
    if candidate.distance < current.distance - SURFACE_TIE_EPSILON {
        return true;
    }
    if candidate.distance > current.distance + SURFACE_TIE_EPSILON {
        return false;
    }
    let candidate_gap = (candidate.point.y - altitude).abs();
    let current_gap = (current.point.y - altitude).abs();
    candidate_gap < current_gap - SURFACE_TIE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::BRIDGE_HEIGHT,
        track::{TrackConfig, TrackShape},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn figure_eight(seed: u64) -> TrackSurface {
        let config = TrackConfig { shape: TrackShape::FigureEight, ..TrackConfig::default() };
        TrackSurface::from_config(&config, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn altitude_is_continuous_along_the_track() {
        let track = TrackSurface::generate(7);
        let n = track.skeleton().len() as f32;
        let step = 0.01;
        let mut prev = track.curve().point_at(0.0).y;
        let mut u = step;
        while u < n {
            let y = track.curve().point_at(u).y;
            assert!((y - prev).abs() <= 100.0 * step, "jump at u={u}: {prev} -> {y}");
            prev = y;
            u += step;
        }
    }

    #[test]
    fn segment_boundaries_join_without_gaps() {
        let track = TrackSurface::generate(12);
        for segment in track.segments() {
            let next = &track.segments()[segment.next];
            let end = segment.point_at(segment.t_end);
            let start = next.point_at(next.t_start);
            assert!((end - start).length() < 1e-3, "gap after segment {}", segment.id);
        }
    }

    #[test]
    fn query_on_the_centerline_finds_the_surface() {
        let track = TrackSurface::generate(4);
        for i in 0..track.skeleton().len() {
            let u = i as f32 + 0.5;
            let on_track = track.curve().point_at(u);
            let info = track.surface_at(on_track + Vec3::Y * 0.3, None);
            assert!(info.distance < 0.5, "u={u} distance {}", info.distance);
            assert!((info.altitude - on_track.y).abs() < 0.5);
            assert!(info.roll.abs() <= MAX_BANK_ANGLE);
        }
    }

    #[test]
    fn hint_keeps_the_vehicle_on_its_own_level_at_the_crossing() {
        let track = figure_eight(5);
        let n = track.skeleton().len();
        let upper_u = (n / 4) as f32;
        let lower_u = (3 * n / 4) as f32;
        let upper = track.curve().point_at(upper_u);
        let lower = track.curve().point_at(lower_u);
        assert!(upper.y - lower.y > BRIDGE_HEIGHT * 0.4);

        let upper_hint = track.surface_at(upper, None).segment_id;
        let lower_hint = track.surface_at(lower, None).segment_id;
        assert_ne!(upper_hint, lower_hint);

        // Same horizontal spot, queried from each level with its own hint
        let probe = Vec3::new(1.0, 0.0, 1.0);
        let on_upper = track.surface_at(probe.with_y(upper.y), Some(upper_hint));
        let on_lower = track.surface_at(probe.with_y(lower.y), Some(lower_hint));
        assert!((on_upper.altitude - upper.y).abs() < 2.0, "{} vs {}", on_upper.altitude, upper.y);
        assert!((on_lower.altitude - lower.y).abs() < 2.0, "{} vs {}", on_lower.altitude, lower.y);
    }

    #[test]
    fn unhinted_query_at_the_crossing_prefers_the_nearer_level() {
        let track = figure_eight(9);
        let n = track.skeleton().len();
        let upper = track.curve().point_at((n / 4) as f32);
        let lower = track.curve().point_at((3 * n / 4) as f32);
        let crossing = Vec3::ZERO;

        let from_above = track.surface_at(crossing.with_y(upper.y + 0.5), None);
        let from_below = track.surface_at(crossing.with_y(lower.y + 0.5), None);
        assert!(from_above.altitude > from_below.altitude + BRIDGE_HEIGHT * 0.4);

        // Deterministic
        assert_eq!(track.surface_at(crossing, None), track.surface_at(crossing, None));
    }

    #[test]
    fn stale_hint_falls_back_to_a_global_search() {
        let track = TrackSurface::generate(2);
        let target = track.curve().point_at(33.5);
        let far_hint = Some(0);
        let info = track.surface_at(target, far_hint);
        assert!(info.distance < 0.5);
        let invalid = track.surface_at(target, Some(10_000));
        assert_eq!(info.segment_id, invalid.segment_id);
    }

    #[test]
    fn pitch_follows_the_slope() {
        let skeleton = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(100.0, 10.0, 0.0),
            Vec3::new(200.0, 20.0, 0.0),
            Vec3::new(200.0, 20.0, 100.0),
            Vec3::new(0.0, 0.0, 100.0),
        ];
        let track = TrackSurface::from_skeleton(skeleton, 10.0, 2).expect("valid skeleton");
        let info = track.surface_at(Vec3::new(100.0, 10.0, 0.0), None);
        assert!(info.pitch > 0.05 && info.pitch < 0.15, "pitch {}", info.pitch);
    }
}
