// Track surface model: generation, segment partition and spatial queries
mod boundary;
mod checkpoint;
mod generate;
mod segment;
mod spline;
mod surface;

pub use boundary::{WallContact, closest_on_edge, closest_on_skeleton};
pub use checkpoint::{Checkpoint, checkpoint_params, crosses, left_of, travel_direction};
pub use generate::{TrackConfig, TrackShape, generate_skeleton};
pub use segment::{FlatBounds, SegmentMatch, TrackSegment, build_segments};
pub use spline::{ClosedCurve, catmull_rom, catmull_rom_tangent};
pub use surface::SurfaceInfo;

use anyhow::{Result, bail};
use bevy_math::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::{
    constants::{PHYSICS_EPSILON, SPAWN_BACK_OFFSET, SPAWN_LANE_OFFSET, SPAWN_ROW_SPACING, VEHICLE_RADIUS},
    math::yaw_from_direction,
};

/// Immutable track model shared by every simulation query. A new round replaces it wholesale.
#[derive(Debug, Clone)]
pub struct TrackSurface {
    seed: Option<u64>,
    skeleton: Vec<Vec3>,
    curve: ClosedCurve,
    segments: Vec<TrackSegment>,
    checkpoints: Vec<Checkpoint>,
    finish_line: Checkpoint,
    half_width: f32,
}

impl TrackSurface {
    /// Build the round track for `seed`. Every peer using the same seed gets the same track.
    #[must_use]
    pub fn generate(seed: u64) -> Self {
        let config = TrackConfig::for_seed(seed);
        let mut track = Self::from_config(&config, &mut StdRng::seed_from_u64(seed));
        track.seed = Some(seed);
        debug!(seed, shape = ?config.shape, points = track.skeleton.len(), "track generated");
        track
    }

    #[must_use]
    pub fn from_config(config: &TrackConfig, rng: &mut impl Rng) -> Self {
        let skeleton = generate_skeleton(config, rng);
        Self::build(skeleton, config.half_width, config.num_checkpoints)
    }

    /// Build from an explicit skeleton, e.g. a hand-made layout.
    pub fn from_skeleton(skeleton: Vec<Vec3>, half_width: f32, num_checkpoints: usize) -> Result<Self> {
        if skeleton.len() < 2 {
            bail!("track skeleton needs at least 2 points, got {}", skeleton.len());
        }
        if half_width <= VEHICLE_RADIUS {
            bail!("track half width {half_width} leaves no room for a vehicle");
        }
        Ok(Self::build(skeleton, half_width, num_checkpoints))
    }

    fn build(skeleton: Vec<Vec3>, half_width: f32, num_checkpoints: usize) -> Self {
        let curve = ClosedCurve::new(skeleton.clone());
        let segments = build_segments(&curve, half_width);
        let checkpoints: Vec<Checkpoint> = checkpoint_params(skeleton.len(), num_checkpoints)
            .into_iter()
            .enumerate()
            .map(|(id, param)| Checkpoint::on_curve(id, &curve, param, half_width))
            .collect();
        // The finish line's ID is one past the last checkpoint
        let finish_line = Checkpoint::on_curve(checkpoints.len(), &curve, 0.0, half_width);

        Self {
            seed: None,
            skeleton,
            curve,
            segments,
            checkpoints,
            finish_line,
            half_width,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    #[must_use]
    pub fn skeleton(&self) -> &[Vec3] {
        &self.skeleton
    }

    #[must_use]
    pub const fn curve(&self) -> &ClosedCurve {
        &self.curve
    }

    #[must_use]
    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    #[must_use]
    pub const fn finish_line(&self) -> &Checkpoint {
        &self.finish_line
    }

    #[must_use]
    pub const fn half_width(&self) -> f32 {
        self.half_width
    }

    /// Boundary check for a vehicle of the standard radius.
    #[must_use]
    pub fn wall_collision(&self, position: Vec3) -> Option<WallContact> {
        boundary::wall_collision(&self.skeleton, self.half_width, VEHICLE_RADIUS, position)
    }

    /// Starting-grid pose for `slot`: rows of two behind the finish line, facing the direction of
    /// travel. Returns the position (on the surface) and the yaw.
    #[must_use]
    pub fn grid_pose(&self, slot: usize) -> (Vec3, f32) {
        let row = (slot / 2) as f32;
        let side = if slot % 2 == 0 { 1.0 } else { -1.0 };
        let back = SPAWN_ROW_SPACING.mul_add(row, SPAWN_BACK_OFFSET);

        // Walk back along the curve using the local parameter speed at the finish
        let speed = self.curve.tangent_at(0.0).length().max(PHYSICS_EPSILON);
        let param = -back / speed;
        let direction = travel_direction(&self.curve, param);
        let center = self.curve.point_at(param);
        let lane = left_of(direction) * (side * SPAWN_LANE_OFFSET);

        let mut position = center + lane;
        position.y = self.surface_at(position, None).altitude;
        (position, yaw_from_direction(direction).unwrap_or(0.0))
    }
}
