//! Inverse kinematics and servo pulse conversion.
//!
//! [`LegModel::solve`] turns a foot target in the leg frame into the three servo angles
//! of that leg. The helpers below map angles to PCA9685 pulse widths and ticks, and
//! servo indices to `(board, channel)` pairs.
//!
//! Used by the gait engine every tick and by the servo task when writing frames.
use core::f32::consts::PI;
use micromath::F32Ext;

use super::vector::{Vec2, Vec3};
use crate::robot::{
    config::{COXA_LENGTH, FEMUR_LENGTH, JOINT_MOUNT_OFFSETS, TIBIA_LENGTH},
    joint::{Joint, JointAngles, JointOffsets},
    leg::Leg,
};

// --- Servo Configuration ---
pub const SERVO_MIN_PULSE_US: f32 = 500.0;
pub const SERVO_MAX_PULSE_US: f32 = 2500.0;
const SERVO_ANGLE_RANGE: f32 = 180.0;
pub const PCA_FREQUENCY_HZ: u32 = 50;
const PCA_PERIOD_US: f32 = 1_000_000.0 / PCA_FREQUENCY_HZ as f32; // 20000 µs
const PRESCALE_REG_SIZE: f32 = 4096.0;
/// Servos wired to the first board; the rest continue on the second from channel 0.
pub const SERVOS_ON_FIRST_BOARD: usize = 15;
/// Within this distance (mm) of full extension the leg is solved as straight.
const REACH_TOLERANCE: f32 = 1e-3;
/// Smallest horizontal reach [`LegModel::clamp_to_reach`] hands back, so the heading survives.
const MIN_HORIZONTAL: f32 = 1e-3;

/// Segment lengths of one leg, millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegGeometry {
    pub coxa: f32,
    pub femur: f32,
    pub tibia: f32,
}

impl Default for LegGeometry {
    fn default() -> Self {
        Self {
            coxa: COXA_LENGTH,
            femur: FEMUR_LENGTH,
            tibia: TIBIA_LENGTH,
        }
    }
}

impl LegGeometry {
    /// Furthest distance from the femur joint the foot can reach.
    pub fn max_reach(&self) -> f32 {
        self.femur + self.tibia
    }

    /// Closest distance from the femur joint the foot can reach.
    pub fn min_reach(&self) -> f32 {
        libm::fabsf(self.femur - self.tibia)
    }
}

/// One leg's geometry plus its calibration, enough to solve its joint angles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LegModel {
    pub geometry: LegGeometry,
    pub offsets: JointOffsets,
}

impl LegModel {
    pub fn new(geometry: LegGeometry, offsets: JointOffsets) -> Self {
        Self { geometry, offsets }
    }

    /// Joint angles for `target`, reach-clamped and range-clamped. Never fails.
    pub fn solve(&self, target: Vec3) -> JointAngles {
        self.solve_reporting(target).0
    }

    /// Like [`LegModel::solve`], also telling whether the target had to be pulled into reach.
    pub fn solve_reporting(&self, target: Vec3) -> (JointAngles, bool) {
        let g = &self.geometry;
        let coxa = libm::atan2f(target.y, target.x);

        let horizontal = target.xy().magnitude();
        let (sagittal, clamped) = self.clamp_sagittal(Vec2::new(horizontal - g.coxa, target.z));
        let d = sagittal.magnitude().clamp(g.min_reach(), g.max_reach());

        // acos is too steep near full extension for f32 round-off
        let (femur_interior, knee_interior) = if d >= g.max_reach() - REACH_TOLERANCE {
            (0.0, PI)
        } else {
            let femur_cos = (d * d + g.femur * g.femur - g.tibia * g.tibia) / (2.0 * d * g.femur);
            let knee_cos =
                (g.femur * g.femur + g.tibia * g.tibia - d * d) / (2.0 * g.femur * g.tibia);
            (
                libm::acosf(femur_cos.clamp(-1.0, 1.0)),
                libm::acosf(knee_cos.clamp(-1.0, 1.0)),
            )
        };
        let femur = femur_interior + libm::atan2f(sagittal.y, sagittal.x);
        let tibia = PI - knee_interior;

        let mut angles = JointAngles::new(coxa.to_degrees(), femur.to_degrees(), tibia.to_degrees());
        for joint in Joint::ALL {
            angles[joint] += JOINT_MOUNT_OFFSETS[joint as usize] + self.offsets.get(joint);
        }
        (angles.clamped(), clamped)
    }

    /// The target the solver actually uses: `target` pulled onto the reachable shell
    /// along its own direction from the femur joint. Reachable targets come back unchanged.
    ///
    /// Solving the result matches solving `target` for targets beyond the outer shell.
    /// Targets pulled out to the inner shell behind the hip keep their heading only.
    pub fn clamp_to_reach(&self, target: Vec3) -> Vec3 {
        let horizontal = target.xy().magnitude();
        let (sagittal, clamped) =
            self.clamp_sagittal(Vec2::new(horizontal - self.geometry.coxa, target.z));
        if !clamped {
            return target;
        }

        let heading = if horizontal > f32::EPSILON {
            target.xy() / horizontal
        } else {
            Vec2::new(1.0, 0.0)
        };
        let reach = heading * (sagittal.x + self.geometry.coxa).max(MIN_HORIZONTAL);
        Vec3::new(reach.x, reach.y, sagittal.y)
    }

    /// Rescales the (reach, height) vector seen from the femur joint into the ring the
    /// two lower segments can cover.
    fn clamp_sagittal(&self, sagittal: Vec2) -> (Vec2, bool) {
        let max = self.geometry.max_reach();
        let min = self.geometry.min_reach();
        let d = sagittal.magnitude();

        if d > max {
            (sagittal * (max / d), true)
        } else if d <= f32::EPSILON {
            (Vec2::new(0.0, -min), min > 0.0)
        } else if d < min {
            (sagittal * (min / d), true)
        } else {
            (sagittal, false)
        }
    }
}

/// Pulse width for a servo angle: 0..180 degrees maps linearly onto 500..2500 µs.
pub fn angle_to_pulse_us(angle: f32) -> f32 {
    let angle = angle.clamp(0.0, SERVO_ANGLE_RANGE);
    let pulse_width_range = SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US;
    SERVO_MIN_PULSE_US + (angle / SERVO_ANGLE_RANGE) * pulse_width_range
}

/// PCA9685 off-tick for a pulse width at the 50 Hz servo period.
pub fn pulse_to_ticks(pulse_us: f32) -> u16 {
    let tick = (pulse_us / PCA_PERIOD_US) * PRESCALE_REG_SIZE;
    // Clamp the value to the valid PCA9685 range
    tick.round().clamp(0.0, PRESCALE_REG_SIZE - 1.0) as u16
}

pub fn angle_to_ticks(angle: f32) -> u16 {
    pulse_to_ticks(angle_to_pulse_us(angle))
}

/// `(board, channel)` driving `joint` of `leg`; servo index is `leg * 3 + joint`.
pub fn servo_channel(leg: Leg, joint: Joint) -> (usize, u8) {
    let index = leg as usize * 3 + joint as usize;
    if index < SERVOS_ON_FIRST_BOARD {
        (0, index as u8)
    } else {
        (1, (index - SERVOS_ON_FIRST_BOARD) as u8)
    }
}
