//! Joint enumeration, per-leg angle triples and calibration deltas.
use core::fmt::Display;
use core::ops::{Index, IndexMut};

use super::config::{JOINT_LIMITS, MAX_CALIBRATION_OFFSET};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    Coxa = 0,
    Femur = 1,
    Tibia = 2,
}

impl Joint {
    pub const ALL: [Joint; 3] = [Joint::Coxa, Joint::Femur, Joint::Tibia];

    /// Safe servo range `(min, max)` in degrees.
    pub fn limits(self) -> (f32, f32) {
        JOINT_LIMITS[self as usize]
    }
}

impl Display for Joint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Joint::Coxa => f.write_str("coxa"),
            Joint::Femur => f.write_str("femur"),
            Joint::Tibia => f.write_str("tibia"),
        }
    }
}

impl TryFrom<usize> for Joint {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Joint::ALL.get(value).copied().ok_or(value)
    }
}

/// Servo angles of one leg, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    pub coxa: f32,
    pub femur: f32,
    pub tibia: f32,
}

impl JointAngles {
    pub const fn new(coxa: f32, femur: f32, tibia: f32) -> Self {
        Self { coxa, femur, tibia }
    }

    /// Clamps every angle into its joint's safe range. NaN lands on the lower bound.
    pub fn clamped(mut self) -> Self {
        for joint in Joint::ALL {
            let (min, max) = joint.limits();
            let angle = self[joint];
            self[joint] = if angle.is_nan() {
                min
            } else {
                angle.clamp(min, max)
            };
        }
        self
    }

    pub fn within_limits(&self) -> bool {
        Joint::ALL.iter().all(|&joint| {
            let (min, max) = joint.limits();
            (min..=max).contains(&self[joint])
        })
    }
}

impl Index<Joint> for JointAngles {
    type Output = f32;

    fn index(&self, joint: Joint) -> &Self::Output {
        match joint {
            Joint::Coxa => &self.coxa,
            Joint::Femur => &self.femur,
            Joint::Tibia => &self.tibia,
        }
    }
}

impl IndexMut<Joint> for JointAngles {
    fn index_mut(&mut self, joint: Joint) -> &mut Self::Output {
        match joint {
            Joint::Coxa => &mut self.coxa,
            Joint::Femur => &mut self.femur,
            Joint::Tibia => &mut self.tibia,
        }
    }
}

/// Calibration deltas of one leg, degrees, each within +/- [`MAX_CALIBRATION_OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointOffsets([f32; 3]);

impl JointOffsets {
    pub const ZERO: JointOffsets = JointOffsets([0.0; 3]);

    pub fn new(coxa: f32, femur: f32, tibia: f32) -> Self {
        let mut offsets = Self::ZERO;
        offsets.set(Joint::Coxa, coxa);
        offsets.set(Joint::Femur, femur);
        offsets.set(Joint::Tibia, tibia);
        offsets
    }

    pub fn get(&self, joint: Joint) -> f32 {
        self.0[joint as usize]
    }

    /// Stores `value` clamped to the calibration bound and returns what was stored.
    pub fn set(&mut self, joint: Joint, value: f32) -> f32 {
        let value = if value.is_finite() {
            value.clamp(-MAX_CALIBRATION_OFFSET, MAX_CALIBRATION_OFFSET)
        } else {
            0.0
        };
        self.0[joint as usize] = value;
        value
    }

    pub fn as_array(&self) -> [f32; 3] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_angles_stay_in_range() {
        let angles = JointAngles::new(-12.0, 250.0, f32::NAN).clamped();
        assert_eq!(angles, JointAngles::new(0.0, 180.0, 0.0));
        assert!(angles.within_limits());
    }

    #[test]
    fn offsets_are_bounded() {
        let mut offsets = JointOffsets::ZERO;
        assert_eq!(offsets.set(Joint::Femur, 45.0), MAX_CALIBRATION_OFFSET);
        assert_eq!(offsets.set(Joint::Tibia, -31.0), -MAX_CALIBRATION_OFFSET);
        assert_eq!(offsets.set(Joint::Coxa, f32::INFINITY), 0.0);
        assert_eq!(offsets.as_array(), [0.0, 30.0, -30.0]);
    }
}
