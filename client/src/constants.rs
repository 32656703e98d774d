// ============================================================================
// Client Constants
// ============================================================================

pub const DEFAULT_FRAME_RATE: u32 = 60;

// Autopilot
pub const AUTOPILOT_LOOK_AHEAD: f32 = 1.5; // skeleton points ahead of the vehicle
pub const AUTOPILOT_STEER_GAIN: f32 = 2.0; // steer per radian of heading error
pub const AUTOPILOT_SKID_ANGLE: f32 = 0.6; // heading error (radians) that triggers a skid
pub const AUTOPILOT_BOOST_ANGLE: f32 = 0.1; // boost only while the heading error stays below this
pub const AUTOPILOT_BOOST_MIN_ENERGY: f32 = 0.5;
