//! Moves the feet into the standing pose three at a time.
//!
//! Legs are ranked by how far they have to travel vertically. The three with the
//! largest move go first while the other three hold their start positions, then the
//! second group moves while the first stands on its targets. With at least three
//! grounded feet at the start, at least three stay grounded throughout.
use core::cmp::Ordering;

use crate::kinematics::{bezier::bezier, vector::Vec3};
use crate::robot::config::{
    GROUNDED_TOLERANCE, STANCE_HIGH_LIFT, STANCE_LIFT, STANCE_RATE, STANCE_SETTLED_DISTANCE,
};
use crate::robot::leg::Leg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StanceLift {
    #[default]
    Normal,
    /// Extra clearance, used when the feet start folded (sleep, attack, calibration).
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StanceStage {
    /// First group moving, second holding its start.
    FirstGroup,
    /// Second group moving, first holding the target.
    SecondGroup,
    Settled,
}

#[derive(Debug, Clone)]
pub struct StancePlanner {
    start: [Vec3; 6],
    via: [Vec3; 6],
    target: Vec3,
    groups: [[Leg; 3]; 2],
    stage: StanceStage,
    t: f32,
}

impl StancePlanner {
    pub fn new(current: [Vec3; 6], target: Vec3, lift: StanceLift) -> Self {
        let mut order = Leg::ALL;
        order.sort_unstable_by(|a, b| {
            let da = libm::fabsf(target.z - current[*a].z);
            let db = libm::fabsf(target.z - current[*b].z);
            db.partial_cmp(&da).unwrap_or(Ordering::Equal).then(a.cmp(b))
        });
        let groups = [
            [order[0], order[1], order[2]],
            [order[3], order[4], order[5]],
        ];

        let extra = match lift {
            StanceLift::Normal => 0.0,
            StanceLift::High => STANCE_HIGH_LIFT,
        };
        let via = Leg::ALL.map(|leg| {
            let start = current[leg];
            let mid = start.lerp(target, 0.5);
            if start.distance_to(target) < STANCE_SETTLED_DISTANCE {
                mid
            } else {
                Vec3::new(mid.x, mid.y, start.z.max(target.z) + STANCE_LIFT + extra)
            }
        });

        let mut planner = Self {
            start: current,
            via,
            target,
            groups,
            stage: StanceStage::FirstGroup,
            t: 0.0,
        };
        planner.skip_placed_groups();
        planner
    }

    /// Stance that is already in place, for when the feet are known to be on target.
    pub fn settled(target: Vec3) -> Self {
        let mut planner = Self::new([target; 6], target, StanceLift::Normal);
        planner.stage = StanceStage::Settled;
        planner
    }

    pub fn stage(&self) -> StanceStage {
        self.stage
    }

    pub fn is_settled(&self) -> bool {
        self.stage == StanceStage::Settled
    }

    /// Moves the end point, e.g. for a live height change, without restarting.
    pub fn retarget(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn advance(&mut self, dt: f32) -> [Vec3; 6] {
        if self.stage != StanceStage::Settled {
            self.t += STANCE_RATE * dt.max(0.0);
            if self.t >= 1.0 {
                self.t = 0.0;
                self.stage = match self.stage {
                    StanceStage::FirstGroup => StanceStage::SecondGroup,
                    _ => StanceStage::Settled,
                };
                self.skip_placed_groups();
            }
        }
        self.positions()
    }

    /// Foot positions at the current point of the sequence.
    pub fn positions(&self) -> [Vec3; 6] {
        Leg::ALL.map(|leg| {
            let group = if self.groups[0].contains(&leg) { 0 } else { 1 };
            match (self.stage, group) {
                (StanceStage::Settled, _) | (StanceStage::SecondGroup, 0) => self.target,
                (StanceStage::FirstGroup, 1) => self.start[leg],
                _ => bezier(&[self.start[leg], self.via[leg], self.target], self.t),
            }
        })
    }

    fn skip_placed_groups(&mut self) {
        loop {
            let group = match self.stage {
                StanceStage::FirstGroup => 0,
                StanceStage::SecondGroup => 1,
                StanceStage::Settled => return,
            };
            let placed = self.groups[group]
                .iter()
                .all(|&leg| self.start[leg].distance_to(self.target) < STANCE_SETTLED_DISTANCE);
            if !placed {
                return;
            }
            self.stage = match self.stage {
                StanceStage::FirstGroup => StanceStage::SecondGroup,
                _ => StanceStage::Settled,
            };
        }
    }
}

/// Feet at most [`GROUNDED_TOLERANCE`] above `ground`.
pub fn grounded_count(feet: &[Vec3; 6], ground: f32) -> usize {
    feet.iter()
        .filter(|foot| foot.z <= ground + GROUNDED_TOLERANCE)
        .count()
}
