use core::fmt::Display;
use core::ops::{Index, IndexMut};

use super::config::{ROTATION_MULTIPLIER, STRIDE_MULTIPLIER};
use super::joint::{JointAngles, JointOffsets};
use crate::kinematics::vector::Vec3;

/// Legs in mounting order, clockwise seen from above starting at the front right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Leg {
    FrontRight = 0,
    MiddleRight = 1,
    RearRight = 2,
    RearLeft = 3,
    MiddleLeft = 4,
    FrontLeft = 5,
}

impl Leg {
    pub const COUNT: usize = 6;

    pub const ALL: [Leg; Self::COUNT] = [
        Leg::FrontRight,
        Leg::MiddleRight,
        Leg::RearRight,
        Leg::RearLeft,
        Leg::MiddleLeft,
        Leg::FrontLeft,
    ];

    /// +1 when the leg's stride runs with the body's forward axis, -1 against it.
    pub fn stride_sign(self) -> f32 {
        STRIDE_MULTIPLIER[self as usize]
    }

    /// Sign of the leg's mounting angle around the yaw axis; 0 for middle legs.
    pub fn rotation_sign(self) -> f32 {
        ROTATION_MULTIPLIER[self as usize]
    }
}

impl Display for Leg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Leg::FrontRight => f.write_str("Front right"),
            Leg::MiddleRight => f.write_str("Middle right"),
            Leg::RearRight => f.write_str("Rear right"),
            Leg::RearLeft => f.write_str("Rear left"),
            Leg::MiddleLeft => f.write_str("Middle left"),
            Leg::FrontLeft => f.write_str("Front left"),
        }
    }
}

impl TryFrom<usize> for Leg {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Leg::ALL.get(value).copied().ok_or(value)
    }
}

impl Index<Leg> for [Vec3; 6] {
    type Output = Vec3;

    fn index(&self, leg: Leg) -> &Self::Output {
        &self[leg as usize]
    }
}

impl IndexMut<Leg> for [Vec3; 6] {
    fn index_mut(&mut self, leg: Leg) -> &mut Self::Output {
        &mut self[leg as usize]
    }
}

impl Index<Leg> for [JointAngles; 6] {
    type Output = JointAngles;

    fn index(&self, leg: Leg) -> &Self::Output {
        &self[leg as usize]
    }
}

impl IndexMut<Leg> for [JointAngles; 6] {
    fn index_mut(&mut self, leg: Leg) -> &mut Self::Output {
        &mut self[leg as usize]
    }
}

impl Index<Leg> for [JointOffsets; 6] {
    type Output = JointOffsets;

    fn index(&self, leg: Leg) -> &Self::Output {
        &self[leg as usize]
    }
}

impl IndexMut<Leg> for [JointOffsets; 6] {
    fn index_mut(&mut self, leg: Leg) -> &mut Self::Output {
        &mut self[leg as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legs_round_trip_through_index() {
        for (i, leg) in Leg::ALL.iter().enumerate() {
            assert_eq!(Leg::try_from(i), Ok(*leg));
        }
        assert_eq!(Leg::try_from(6), Err(6));
    }

    #[test]
    fn sides_stride_in_opposite_directions() {
        assert_eq!(Leg::FrontRight.stride_sign(), -Leg::FrontLeft.stride_sign());
        assert_eq!(Leg::MiddleRight.rotation_sign(), 0.0);
        assert_eq!(Leg::MiddleLeft.rotation_sign(), 0.0);
    }
}
