//! Two-stage move into the calibration pose: raise every foot to a safe height, then
//! walk all of them to the same raised pose where servo alignment can be checked.
use crate::kinematics::vector::Vec3;
use crate::robot::config::{
    CALIBRATION_LIFT_RATE, CALIBRATION_POSE, CALIBRATION_SAFE_Z, CALIBRATION_SPEED,
    CALIBRATION_TOLERANCE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationStage {
    #[default]
    Lifting,
    Posing,
    /// Every foot within tolerance of the calibration pose.
    InPose,
}

#[derive(Debug, Clone, Default)]
pub struct CalibrationMotion {
    stage: CalibrationStage,
}

impl CalibrationMotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> CalibrationStage {
        self.stage
    }

    pub fn step(&mut self, feet: &mut [Vec3; 6], dt: f32) -> CalibrationStage {
        match self.stage {
            CalibrationStage::Lifting => {
                let f = (CALIBRATION_LIFT_RATE * dt).clamp(0.0, 1.0);
                // aim a little past the threshold so the lerp actually crosses it
                let aim = CALIBRATION_SAFE_Z + 2.0;
                for foot in feet.iter_mut().filter(|foot| foot.z < CALIBRATION_SAFE_Z) {
                    foot.z += (aim - foot.z) * f;
                }
                if feet.iter().all(|foot| foot.z >= CALIBRATION_SAFE_Z) {
                    self.stage = CalibrationStage::Posing;
                }
            }
            CalibrationStage::Posing | CalibrationStage::InPose => {
                let max_step = CALIBRATION_SPEED * dt.max(0.0);
                for foot in feet.iter_mut() {
                    *foot = Vec3::new(
                        approach(foot.x, CALIBRATION_POSE.x, max_step),
                        approach(foot.y, CALIBRATION_POSE.y, max_step),
                        approach(foot.z, CALIBRATION_POSE.z, max_step),
                    );
                }
                if feet
                    .iter()
                    .all(|foot| foot.distance_to(CALIBRATION_POSE) <= CALIBRATION_TOLERANCE)
                {
                    self.stage = CalibrationStage::InPose;
                }
            }
        }
        self.stage
    }
}

fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    if current < target {
        (current + max_step).min(target)
    } else {
        (current - max_step).max(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifts_before_posing() {
        let mut feet = [Vec3::new(173.0, 0.0, -60.0); 6];
        let mut motion = CalibrationMotion::new();
        let mut ticks = 0;
        while motion.step(&mut feet, 0.01) == CalibrationStage::Lifting {
            // horizontal position is untouched while lifting
            assert!(feet.iter().all(|foot| foot.x == 173.0));
            ticks += 1;
            assert!(ticks < 2000);
        }
        assert!(feet.iter().all(|foot| foot.z >= CALIBRATION_SAFE_Z));

        while motion.step(&mut feet, 0.01) != CalibrationStage::InPose {
            ticks += 1;
            assert!(ticks < 4000);
        }
        for foot in feet {
            assert!(foot.distance_to(CALIBRATION_POSE) <= CALIBRATION_TOLERANCE);
        }
    }
}
