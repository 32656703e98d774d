// ============================================================================
// Networking
// ============================================================================

pub const STATE_SEND_INTERVAL: f32 = 0.05; // seconds between own-vehicle snapshots
pub const INACTIVITY_TIMEOUT_SECS: u64 = 30; // relay purges peers silent for this long
pub const PURGE_CHECK_INTERVAL_SECS: u64 = 5;
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

// ============================================================================
// Frame Loop
// ============================================================================

// Upper bound for a single simulation step, e.g. after the process was suspended
pub const MAX_FRAME_DELTA: f32 = 0.1; // seconds

// ============================================================================
// Floating-Point Comparisons
// ============================================================================

// Small value for floating-point comparisons (near-zero checks, division guards).
pub const PHYSICS_EPSILON: f32 = 1e-6;

// ============================================================================
// Track Generation
// ============================================================================

pub const TRACK_POINTS: usize = 64;
pub const TRACK_BASE_RADIUS: f32 = 220.0;
pub const TRACK_RADIUS_VARIATION: f32 = 45.0; // max +/- radius noise
pub const TRACK_ALTITUDE_VARIATION: f32 = 18.0; // max +/- altitude noise
pub const TRACK_FLAT_ZONE_POINTS: usize = 8; // points on each side of the finish with damped noise
pub const TRACK_FLAT_ZONE_DAMPING: f32 = 0.15; // noise multiplier inside the flat zone
pub const TRACK_SMOOTHING_PASSES: usize = 2;
pub const TRACK_HALF_WIDTH: f32 = 14.0;
pub const BRIDGE_HEIGHT: f32 = 16.0; // vertical clearance at figure-eight crossings
pub const BRIDGE_RAMP_POINTS: usize = 10; // points on each side of the crossing over which the bridge rises
pub const FIGURE_EIGHT_LOBE_WIDTH: f32 = 0.6; // lobe width relative to the base radius

// ============================================================================
// Track Segments & Surface Queries
// ============================================================================

pub const SEGMENT_SPAN_POINTS: usize = 4; // control points per segment (before padding)
pub const SEGMENT_BOX_SAMPLES_PER_SPAN: usize = 8;
pub const SURFACE_COARSE_SAMPLES: usize = 16;
pub const SURFACE_REFINE_SAMPLES: usize = 12;
pub const SURFACE_REFINE_PASSES: usize = 2;
pub const SURFACE_TIE_EPSILON: f32 = 0.05; // 2D distances closer than this are treated as equal
pub const ROLL_SAMPLE_OFFSET: f32 = 0.35; // skeleton-parameter offset for curvature samples
pub const ROLL_CURVATURE_SCALE: f32 = 4.0;
pub const MAX_BANK_ANGLE: f32 = 0.35; // radians

// ============================================================================
// Checkpoints & Laps
// ============================================================================

pub const NUM_CHECKPOINTS: usize = 4;
pub const RACE_LAPS: u32 = 3;
pub const STARTING_LIVES: u32 = 3;

// ============================================================================
// Vehicle
// ============================================================================

pub const VEHICLE_RADIUS: f32 = 2.0;
pub const MAX_SPEED: f32 = 120.0;
pub const ACCELERATION: f32 = 55.0;
pub const SPEED_DECAY_RATE: f32 = 1.2; // fraction of speed lost per second when coasting
pub const DISTANCE_SCALE: f32 = 0.5; // world units travelled per unit of speed per second
pub const DEFAULT_ALTITUDE: f32 = 0.0;

// Steering
pub const TURN_RATE: f32 = 2.4; // radians per second at full speed
pub const HIGH_SPEED_TURN_ATTENUATION: f32 = 0.45; // yaw-rate reduction at top speed
pub const SKID_TURN_MULTIPLIER: f32 = 1.6;
pub const SKID_SLIDE_FACTOR: f32 = 0.25; // lateral slide as a fraction of forward travel
pub const TURN_SPEED_BLEED: f32 = 0.3; // fraction of speed lost per second while turning
pub const SKID_SPEED_BLEED: f32 = 0.9; // fraction of speed lost per second while skidding

// Boost
pub const BOOST_MAX_ENERGY: f32 = 1.0;
pub const BOOST_DRAIN_RATE: f32 = 0.35; // energy per second
pub const BOOST_REGEN_RATE: f32 = 0.2; // energy per second
pub const BOOST_REGEN_DELAY: f32 = 1.0; // seconds after boosting stops
pub const BOOST_ACCEL_MULTIPLIER: f32 = 1.6;
pub const BOOST_SPEED_MULTIPLIER: f32 = 1.35;

// Surface following (convergence rates per second)
pub const ALTITUDE_FOLLOW_RATE: f32 = 12.0;
pub const PITCH_FOLLOW_RATE: f32 = 8.0;
pub const ROLL_FOLLOW_RATE: f32 = 6.0;

// Respawn
pub const RESPAWN_INVULNERABILITY: f32 = 2.0; // seconds
pub const SPAWN_BACK_OFFSET: f32 = 8.0; // distance behind the finish line
pub const SPAWN_ROW_SPACING: f32 = 7.0;
pub const SPAWN_LANE_OFFSET: f32 = 5.0;

// ============================================================================
// Collisions
// ============================================================================

pub const WALL_CORRECTION_GAIN: f32 = 1.5;
pub const WALL_MAX_CORRECTION: f32 = 1.0;
pub const WALL_SPEED_LOSS: f32 = 0.3; // fraction of speed lost per wall contact
pub const WALL_HEADING_BLEND: f32 = 0.15; // fraction of the way the heading turns toward the correction
pub const FALL_OFF_DEPTH: f32 = 6.0; // penetration beyond which the vehicle leaves the track

pub const VEHICLE_COLLISION_RANGE_FACTOR: f32 = 1.3;
pub const VEHICLE_COLLISION_COOLDOWN: f32 = 0.5; // seconds
pub const ATTACKER_SPEED_FACTOR: f32 = 0.85;
pub const PUSH_FORCE_FACTOR: f32 = 0.6; // push force per unit of attacker speed
pub const KNOCKBACK_DECAY_RATE: f32 = 3.0; // fraction of knockback lost per second

// ============================================================================
// Remote Interpolation
// ============================================================================

pub const PREDICTION_HORIZON: f32 = 0.1; // seconds of velocity extrapolation
pub const REMOTE_LERP_FRACTION: f32 = 0.2; // fraction of the remaining gap closed per tick

// ============================================================================
// Round Lifecycle
// ============================================================================

pub const RESTART_DELAY: f32 = 5.0; // seconds between game over and the host's restart
pub const GAME_OVER_RETRY_INTERVAL: f32 = 0.5; // seconds before an unconfirmed result is declared again
