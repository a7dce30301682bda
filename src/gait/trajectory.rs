//! Periodic foot paths for walking.
//!
//! Everything here is a pure function of its inputs: the only state carried between
//! ticks is the [`CycleState`] progress owned by the walk.
use crate::kinematics::{
    bezier::{bezier, remap},
    vector::{Vec2, Vec3},
};
use crate::robot::config::{
    FULL_LIFT_INTENT, LAND_HEIGHT, LEG_PLACEMENT_ANGLE, LIFT_HEIGHT, MAX_CADENCE, MIN_STRIDE,
    NOMINAL_SPEED, NOMINAL_STRIDE, ROTATION_ARC_RADIUS, STRIDE_OVERSHOOT,
};
use crate::robot::leg::Leg;

use super::table::GaitDefinition;

/// Where a leg is in its own cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegPhase {
    /// On the ground pushing the body; `t` runs 0..1 over the push.
    Propelling { t: f32 },
    /// In the air returning to the front of the stride; `t` runs 0..1 over the swing.
    Lifting { t: f32 },
}

impl LegPhase {
    pub fn of(gait: &GaitDefinition, leg: Leg, progress: f32) -> Self {
        let local = gait.local_phase(leg, progress);
        if local < gait.duty {
            LegPhase::Propelling {
                t: remap(local, 0.0, gait.duty),
            }
        } else {
            LegPhase::Lifting {
                t: remap(local, gait.duty, 1.0),
            }
        }
    }

    pub fn is_propelling(&self) -> bool {
        matches!(self, LegPhase::Propelling { .. })
    }
}

/// Global gait progress shared by all legs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleState {
    progress: f32,
}

impl CycleState {
    pub fn new(progress: f32) -> Self {
        let mut state = Self::default();
        state.advance(progress);
        state
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Moves forward by `delta` cycles, wrapping into [0, 1).
    pub fn advance(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        let mut progress = (self.progress + delta) % 1.0;
        if progress < 0.0 {
            progress += 1.0;
        }
        // rounding can land exactly on 1.0
        self.progress = if progress >= 1.0 { 0.0 } else { progress };
    }
}

/// Body motion requested for the walk, already smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionCommand {
    /// Forward translation, -1..=1.
    pub forward: f32,
    /// Sideways translation, -1..=1.
    pub strafe: f32,
    /// Yaw, -1..=1.
    pub rotation: f32,
    /// Speed scale, 0..=2.
    pub speed: f32,
}

impl MotionCommand {
    /// Translation stick deflection, capped at 1.
    pub fn translation(&self) -> f32 {
        Vec2::new(self.forward, self.strafe).magnitude().min(1.0)
    }

    /// The larger of translation and rotation deflection.
    pub fn magnitude(&self) -> f32 {
        self.translation().max(libm::fabsf(self.rotation)).min(1.0)
    }
}

/// Stride geometry and cadence derived from one motion command.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StridePlan {
    /// Half of the body-frame stride; `x` forward, `y` sideways, mm.
    pub half_stride: Vec2,
    /// Half of the tangential sweep for yaw, signed, mm.
    pub rotation_arc: f32,
    /// Share of the rotation path in the blended foot path, 0..=1.
    pub rotation_weight: f32,
    /// Peak swing height above the ground, mm.
    pub lift: f32,
    /// Height of the touchdown control point, mm.
    pub land: f32,
    /// Gait cycles per second.
    pub cadence: f32,
}

impl StridePlan {
    /// `amplitude` (0..=1) scales strides and lift, letting a walk ease in from standing.
    pub fn new(gait: &GaitDefinition, motion: &MotionCommand, amplitude: f32) -> Self {
        let translation = motion.translation();
        let rotation = libm::fabsf(motion.rotation);
        let magnitude = motion.magnitude();
        if magnitude <= f32::EPSILON {
            return Self::default();
        }
        let amplitude = amplitude.clamp(0.0, 1.0);

        let speed = (magnitude * motion.speed * gait.speed_multiplier * NOMINAL_SPEED)
            .min(gait.max_speed)
            .max(0.0);
        let mut stride = (magnitude * gait.stride_multiplier * NOMINAL_STRIDE)
            .clamp(MIN_STRIDE, gait.max_stride);
        let mut cadence = speed * gait.duty / stride;
        if cadence > MAX_CADENCE {
            // past the cadence cap, go faster by stepping further
            stride = (speed * gait.duty / MAX_CADENCE).min(gait.max_stride);
            cadence = (speed * gait.duty / stride).min(MAX_CADENCE);
        }

        let half = stride / 2.0 * amplitude;
        // stick diagonals are capped like `translation`, so the caps hold on every heading
        let direction = Vec2::new(motion.forward, motion.strafe).clamp_length(1.0) / magnitude;
        let lift_scale = (magnitude / FULL_LIFT_INTENT).min(1.0) * amplitude;

        Self {
            half_stride: direction * half,
            rotation_arc: motion.rotation / magnitude * half,
            rotation_weight: rotation / (translation + rotation),
            lift: gait.lift_multiplier * LIFT_HEIGHT * lift_scale,
            land: LAND_HEIGHT * lift_scale,
            cadence,
        }
    }

    /// Whether the plan moves the feet at all.
    pub fn is_idle(&self) -> bool {
        self.cadence <= 0.0
    }
}

/// Foot targets of a walking gait around a base stance.
#[derive(Debug, Clone, Copy)]
pub struct GaitTrajectory<'a> {
    pub gait: &'a GaitDefinition,
    pub plan: StridePlan,
    /// Neutral foot position in every leg frame.
    pub base: Vec3,
}

impl<'a> GaitTrajectory<'a> {
    pub fn new(gait: &'a GaitDefinition, plan: StridePlan, base: Vec3) -> Self {
        Self { gait, plan, base }
    }

    pub fn targets(&self, cycle: &CycleState) -> [Vec3; 6] {
        Leg::ALL.map(|leg| self.foot_target(leg, cycle.progress()))
    }

    pub fn foot_target(&self, leg: Leg, progress: f32) -> Vec3 {
        if self.plan.is_idle() {
            return self.base;
        }
        let phase = LegPhase::of(self.gait, leg, progress);
        let w = self.plan.rotation_weight;
        let straight = self.straight_point(leg, phase);
        if w <= 0.0 {
            return straight;
        }
        straight * (1.0 - w) + self.rotation_point(phase) * w
    }

    fn straight_point(&self, leg: Leg, phase: LegPhase) -> Vec3 {
        let stride = self.leg_stride(leg);
        let front = self.base + Vec3::from(stride);
        let rear = self.base - Vec3::from(stride);

        match phase {
            LegPhase::Propelling { t } => bezier(&[front, rear], t),
            LegPhase::Lifting { t } => {
                let overshoot = stride.normalize() * stride.magnitude().min(STRIDE_OVERSHOOT);
                bezier(
                    &[
                        rear,
                        rear + Vec3::up(self.plan.lift),
                        front + Vec3::from(overshoot) + Vec3::up(self.plan.land),
                        front,
                    ],
                    t,
                )
            }
        }
    }

    fn rotation_point(&self, phase: LegPhase) -> Vec3 {
        let arc = self.plan.rotation_arc;
        let sagitta = arc * arc / (2.0 * ROTATION_ARC_RADIUS);
        let start = self.base + Vec3::new(0.0, -arc, 0.0);
        let end = self.base + Vec3::new(0.0, arc, 0.0);
        let bulge = self.base + Vec3::new(2.0 * sagitta, 0.0, 0.0);

        match phase {
            LegPhase::Propelling { t } => bezier(&[start, bulge, end], t),
            LegPhase::Lifting { t } => {
                let overshoot = -libm::copysignf(libm::fabsf(arc).min(STRIDE_OVERSHOOT), arc);
                bezier(
                    &[
                        end,
                        end + Vec3::up(self.plan.lift),
                        bulge + Vec3::up(self.plan.lift),
                        start + Vec3::new(0.0, overshoot, self.plan.land),
                        start,
                    ],
                    t,
                )
            }
        }
    }

    /// Half-stride of `leg` in its own frame.
    fn leg_stride(&self, leg: Leg) -> Vec2 {
        let body = self.plan.half_stride;
        let sign = leg.stride_sign();
        Vec2::new(-body.y * sign, body.x * sign).rotate(LEG_PLACEMENT_ANGLE * leg.rotation_sign())
    }
}
