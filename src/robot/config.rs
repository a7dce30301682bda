//! Physical dimensions and motion constants of the hexapod.
//!
//! Lengths are millimetres, angles degrees, rates per second.
use crate::kinematics::vector::Vec3;

// ROBOT SIZE
pub const COXA_LENGTH: f32 = 46.0;
pub const FEMUR_LENGTH: f32 = 108.0;
pub const TIBIA_LENGTH: f32 = 200.0;

/// Servo angle that corresponds to a zero IK angle, per joint `[coxa, femur, tibia]`.
pub const JOINT_MOUNT_OFFSETS: [f32; 3] = [90.0, 50.0, -10.0];
/// Hardware-safe servo range, per joint `[coxa, femur, tibia]`.
pub const JOINT_LIMITS: [(f32, f32); 3] = [(0.0, 180.0), (0.0, 180.0), (0.0, 180.0)];
/// Calibration deltas are kept inside +/- this bound.
pub const MAX_CALIBRATION_OFFSET: f32 = 30.0;

/// Radial distance of a standing foot from its coxa joint.
pub const DISTANCE_FROM_CENTER: f32 = 173.0;
/// Foot height of the neutral stance (the body sits above z = 0).
pub const DISTANCE_FROM_GROUND: f32 = -60.0;
/// Height intent of +/-1 moves the stance by this much.
pub const HEIGHT_ADJUST_RANGE: f32 = 30.0;

/// Corner legs are mounted at this angle from the lateral axis.
pub const LEG_PLACEMENT_ANGLE: f32 = 56.0;

/// Per-leg stride direction, index by [`crate::robot::leg::Leg`].
pub const STRIDE_MULTIPLIER: [f32; 6] = [1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
/// Per-leg rotation contribution, index by [`crate::robot::leg::Leg`].
pub const ROTATION_MULTIPLIER: [f32; 6] = [-1.0, 0.0, 1.0, -1.0, 0.0, 1.0];

///CONST FOR WALKING
pub const LIFT_HEIGHT: f32 = 130.0;
pub const LAND_HEIGHT: f32 = 70.0;
pub const STRIDE_OVERSHOOT: f32 = 10.0;
/// Full stride at full stick with a stride multiplier of 1.
pub const NOMINAL_STRIDE: f32 = 120.0;
/// Body speed at full stick, speed scale 1 and a speed multiplier of 1 (mm/s).
pub const NOMINAL_SPEED: f32 = 150.0;
/// Strides never get shorter than this when computing the cadence.
pub const MIN_STRIDE: f32 = 5.0;
/// Above this cadence (cycles/s) extra speed lengthens the stride instead.
pub const MAX_CADENCE: f32 = 1.2;
/// Distance from the yaw centre to a neutral foot, used to bend rotation arcs.
pub const ROTATION_ARC_RADIUS: f32 = 260.0;
/// Motion magnitude at which feet get their full lift height.
pub const FULL_LIFT_INTENT: f32 = 0.2;
/// Time to ramp strides in when a walk starts.
pub const WALK_ENGAGE_SECONDS: f32 = 0.3;

///CONST FOR STANDING
pub const STANCE_RATE: f32 = 2.0;
pub const STANCE_LIFT: f32 = 70.0;
pub const STANCE_HIGH_LIFT: f32 = 80.0;
/// A leg this close to its stance target is treated as already placed.
pub const STANCE_SETTLED_DISTANCE: f32 = 5.0;
/// A foot at most this far above the ground height counts as grounded.
pub const GROUNDED_TOLERANCE: f32 = 1.0;

///CONST FOR SLEEP
pub const SLEEP_POSE: Vec3 = Vec3::new(130.0, 0.0, -46.0);
pub const SLEEP_RATE: f32 = 3.0;
pub const SLEEP_SNAP: f32 = 1.0;

///CONST FOR CALIBRATION
pub const CALIBRATION_POSE: Vec3 = Vec3::new(COXA_LENGTH + 43.0, 0.0, FEMUR_LENGTH + 185.0);
pub const CALIBRATION_SAFE_Z: f32 = -20.0;
pub const CALIBRATION_LIFT_RATE: f32 = 3.0;
pub const CALIBRATION_SPEED: f32 = 500.0;
pub const CALIBRATION_TOLERANCE: f32 = 5.0;

///CONST FOR ATTACK
pub const ATTACK_PLACEMENT_SECONDS: f32 = 0.2;
pub const ATTACK_STRIKE_SECONDS: f32 = 0.6;
pub const ATTACK_HOLD_SECONDS: f32 = 0.3;

///CONST FOR INPUT
pub const WALK_ENTER_THRESHOLD: f32 = 0.1;
pub const WALK_EXIT_THRESHOLD: f32 = 0.05;
pub const WALK_EXIT_TICKS: u32 = 10;
pub const INPUT_SMOOTHING_RATE: f32 = 10.0;
pub const HEIGHT_SMOOTHING_RATE: f32 = 5.0;

/// Tunables read by the gait engine. `Default` gives the values above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub distance_from_center: f32,
    pub distance_from_ground: f32,
    pub height_adjust_range: f32,
    pub walk_enter_threshold: f32,
    pub walk_exit_threshold: f32,
    pub walk_exit_ticks: u32,
    pub input_smoothing_rate: f32,
    pub height_smoothing_rate: f32,
    /// Longest `dt` accepted per tick; longer gaps (stalls) are truncated.
    pub max_tick_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            distance_from_center: DISTANCE_FROM_CENTER,
            distance_from_ground: DISTANCE_FROM_GROUND,
            height_adjust_range: HEIGHT_ADJUST_RANGE,
            walk_enter_threshold: WALK_ENTER_THRESHOLD,
            walk_exit_threshold: WALK_EXIT_THRESHOLD,
            walk_exit_ticks: WALK_EXIT_TICKS,
            input_smoothing_rate: INPUT_SMOOTHING_RATE,
            height_smoothing_rate: HEIGHT_SMOOTHING_RATE,
            max_tick_seconds: 0.03,
        }
    }
}

impl EngineConfig {
    /// Foot position of the neutral stance at the given ground height.
    pub fn stance_point(&self, ground: f32) -> Vec3 {
        Vec3::new(self.distance_from_center, 0.0, ground)
    }
}
