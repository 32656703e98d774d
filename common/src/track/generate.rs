use bevy_math::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

use crate::constants::{
    BRIDGE_HEIGHT, BRIDGE_RAMP_POINTS, FIGURE_EIGHT_LOBE_WIDTH, NUM_CHECKPOINTS, TRACK_ALTITUDE_VARIATION,
    TRACK_BASE_RADIUS, TRACK_FLAT_ZONE_DAMPING, TRACK_FLAT_ZONE_POINTS, TRACK_HALF_WIDTH, TRACK_POINTS,
    TRACK_RADIUS_VARIATION, TRACK_SMOOTHING_PASSES,
};

// Smallest skeleton the generator will produce
const MIN_GENERATED_POINTS: usize = 8;

/// Overall layout of a generated track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackShape {
    /// Perturbed ring.
    Loop,
    /// Lemniscate; the two passes through the crossing are separated by a bridge.
    FigureEight,
}

/// Parameters for procedural track generation.
#[derive(Debug, Clone)]
pub struct TrackConfig {
    pub shape: TrackShape,
    pub points: usize,
    pub base_radius: f32,
    pub radius_variation: f32,
    pub altitude_variation: f32,
    pub half_width: f32,
    pub num_checkpoints: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            shape: TrackShape::Loop,
            points: TRACK_POINTS,
            base_radius: TRACK_BASE_RADIUS,
            radius_variation: TRACK_RADIUS_VARIATION,
            altitude_variation: TRACK_ALTITUDE_VARIATION,
            half_width: TRACK_HALF_WIDTH,
            num_checkpoints: NUM_CHECKPOINTS,
        }
    }
}

impl TrackConfig {
    // Every peer derives the same layout from the round seed
    #[must_use]
    pub fn for_seed(seed: u64) -> Self {
        let shape = if seed % 2 == 0 {
            TrackShape::Loop
        } else {
            TrackShape::FigureEight
        };
        Self { shape, ..Self::default() }
    }

    // Skeleton indices where the noise is damped: the finish line, and for a figure-eight both
    // passes through the crossing.
    #[must_use]
    pub fn calm_indices(&self) -> Vec<usize> {
        let n = self.point_count();
        match self.shape {
            TrackShape::Loop => vec![0],
            TrackShape::FigureEight => vec![0, n / 4, 3 * n / 4],
        }
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.max(MIN_GENERATED_POINTS)
    }
}

// ============================================================================
// Skeleton Generation
// ============================================================================

/// Generate a closed skeleton. The same config and RNG state always produce the same points.
pub fn generate_skeleton(config: &TrackConfig, rng: &mut impl Rng) -> Vec<Vec3> {
    let n = config.point_count();
    let calm = config.calm_indices();

    let mut radii = Vec::with_capacity(n);
    let mut altitudes = Vec::with_capacity(n);
    for i in 0..n {
        let scale = noise_scale(i, n, &calm);
        let radius_noise = rng.random_range(-1.0_f32..=1.0) * config.radius_variation;
        let altitude_noise = rng.random_range(-1.0_f32..=1.0) * config.altitude_variation;
        radii.push(radius_noise.mul_add(scale, config.base_radius));
        altitudes.push(altitude_noise * scale);
    }

    if config.shape == TrackShape::FigureEight {
        raise_bridge(&mut altitudes, n / 4);
    }

    for _ in 0..TRACK_SMOOTHING_PASSES {
        smooth_cyclic(&mut radii);
        smooth_cyclic(&mut altitudes);
    }

    (0..n)
        .map(|i| {
            let angle = TAU * i as f32 / n as f32;
            let radius = radii[i];
            let altitude = altitudes[i];
            match config.shape {
                TrackShape::Loop => Vec3::new(radius * angle.cos(), altitude, radius * angle.sin()),
                TrackShape::FigureEight => Vec3::new(
                    radius * angle.cos(),
                    altitude,
                    radius * FIGURE_EIGHT_LOBE_WIDTH * (2.0 * angle).sin(),
                ),
            }
        })
        .collect()
}

fn cyclic_distance(a: usize, b: usize, n: usize) -> usize {
    let d = a.abs_diff(b) % n;
    d.min(n - d)
}

// Noise multiplier: damped near calm indices, ramping back to full strength
fn noise_scale(index: usize, n: usize, calm: &[usize]) -> f32 {
    let Some(d) = calm.iter().map(|&c| cyclic_distance(index, c, n)).min() else {
        return 1.0;
    };
    if d >= TRACK_FLAT_ZONE_POINTS {
        return 1.0;
    }
    let ramp = d as f32 / TRACK_FLAT_ZONE_POINTS as f32;
    (1.0 - TRACK_FLAT_ZONE_DAMPING).mul_add(ramp, TRACK_FLAT_ZONE_DAMPING)
}

// Cosine bump centred on `peak`
fn raise_bridge(altitudes: &mut [f32], peak: usize) {
    let n = altitudes.len();
    for (i, altitude) in altitudes.iter_mut().enumerate() {
        let d = cyclic_distance(i, peak, n);
        if d < BRIDGE_RAMP_POINTS {
            let x = d as f32 / BRIDGE_RAMP_POINTS as f32;
            *altitude += BRIDGE_HEIGHT * 0.5 * (1.0 + (PI * x).cos());
        }
    }
}

// One pass of prev*0.25 + self*0.5 + next*0.25, wrapping at both ends
fn smooth_cyclic(values: &mut [f32]) {
    let n = values.len();
    if n < 3 {
        return;
    }
    let source = values.to_vec();
    for (i, value) in values.iter_mut().enumerate() {
        let prev = source[(i + n - 1) % n];
        let next = source[(i + 1) % n];
        *value = 0.25f32.mul_add(prev + next, 0.5 * source[i]);
    }
}
