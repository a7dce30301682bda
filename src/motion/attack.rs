//! Scripted slam attack.
//!
//! Placement spreads the feet into an attack stance, the strike drives the front
//! and middle legs down to lift the body while the two rear legs raise and slam, then
//! the final pose is held briefly. The sequence cannot be interrupted.
use crate::kinematics::{
    bezier::{bezier, remap},
    vector::{Vec2, Vec3},
};
use crate::robot::config::{ATTACK_HOLD_SECONDS, ATTACK_PLACEMENT_SECONDS, ATTACK_STRIKE_SECONDS};
use crate::robot::leg::Leg;

const SLAM_START: f32 = 0.70;
const SLAM_END: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackPhase {
    Placement,
    Strike,
    Hold,
    Done,
}

impl AttackPhase {
    fn duration(self) -> f32 {
        match self {
            AttackPhase::Placement => ATTACK_PLACEMENT_SECONDS,
            AttackPhase::Strike => ATTACK_STRIKE_SECONDS,
            AttackPhase::Hold => ATTACK_HOLD_SECONDS,
            AttackPhase::Done => 0.0,
        }
    }

    fn next(self) -> Self {
        match self {
            AttackPhase::Placement => AttackPhase::Strike,
            AttackPhase::Strike => AttackPhase::Hold,
            AttackPhase::Hold | AttackPhase::Done => AttackPhase::Done,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttackMotion {
    phase: AttackPhase,
    elapsed: f32,
    /// Feet at the start of the current phase.
    start: [Vec3; 6],
    feet: [Vec3; 6],
}

impl AttackMotion {
    pub fn new(feet: [Vec3; 6]) -> Self {
        Self {
            phase: AttackPhase::Placement,
            elapsed: 0.0,
            start: feet,
            feet,
        }
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == AttackPhase::Done
    }

    pub fn step(&mut self, dt: f32) -> [Vec3; 6] {
        if self.is_done() {
            return self.feet;
        }
        self.elapsed += dt.max(0.0);
        let t = (self.elapsed / self.phase.duration()).min(1.0);

        match self.phase {
            AttackPhase::Placement => {
                for leg in Leg::ALL {
                    self.feet[leg] = self.placement_point(leg, t);
                }
            }
            AttackPhase::Strike => {
                for leg in Leg::ALL {
                    self.feet[leg] = match leg {
                        Leg::RearRight | Leg::RearLeft => self.slam_point(leg, t),
                        _ => self.leap_point(leg, t),
                    };
                }
            }
            AttackPhase::Hold | AttackPhase::Done => {}
        }

        if t >= 1.0 {
            self.phase = self.phase.next();
            self.elapsed = 0.0;
            self.start = self.feet;
        }
        self.feet
    }

    fn placement_point(&self, leg: Leg, t: f32) -> Vec3 {
        let (x_off, z_off) = match leg {
            Leg::MiddleRight => (-70.0, -60.0),
            Leg::MiddleLeft => (-70.0, -50.0),
            Leg::FrontRight | Leg::FrontLeft => (40.0, 0.0),
            _ => (0.0, 0.0),
        };
        let start = self.start[leg];
        let x = start.x + x_off;
        let target = Vec3::new(x, -50.0 * leg.stride_sign(), -50.0 + z_off)
            .rotate(55.0 * leg.rotation_sign(), Vec2::new(x, 0.0));
        bezier(&[start, target], t)
    }

    fn leap_point(&self, leg: Leg, t: f32) -> Vec3 {
        let start = self.start[leg];
        let x = start.x;
        let end = Vec3::new(x - 20.0, start.y + 160.0 * leg.stride_sign(), -80.0)
            .rotate(55.0 * leg.rotation_sign(), Vec2::new(x, 0.0));
        let mut middle = start.lerp(end, 0.5) + Vec3::up(-300.0);
        if matches!(leg, Leg::FrontRight | Leg::FrontLeft) {
            middle.z += 180.0;
        }
        bezier(&[start, middle, end], t)
    }

    fn slam_point(&self, leg: Leg, t: f32) -> Vec3 {
        let sign = leg.rotation_sign();
        let turned = |p: Vec3, angle: f32| p.rotate(angle * sign, Vec2::ZERO);
        let raised = turned(Vec3::new(0.0, 0.0, 300.0), -35.0);
        let landed = turned(Vec3::new(250.0, 0.0, 0.0), -35.0);

        if t < SLAM_START {
            bezier(
                &[
                    self.start[leg],
                    turned(Vec3::new(200.0, 0.0, 200.0), -40.0),
                    raised,
                ],
                remap(t, 0.0, SLAM_START),
            )
        } else if t < SLAM_END {
            bezier(
                &[
                    raised,
                    turned(Vec3::new(300.0, 0.0, 300.0), -35.0),
                    turned(Vec3::new(325.0, 0.0, 50.0), -35.0),
                    landed,
                ],
                remap(t, SLAM_START, SLAM_END),
            )
        } else {
            landed
        }
    }
}
