//! Folds the legs into the resting pose before torque is released.
use crate::kinematics::vector::Vec3;
use crate::robot::config::{SLEEP_POSE, SLEEP_RATE, SLEEP_SNAP};

#[derive(Debug, Clone, Default)]
pub struct SleepMotion {
    folded: bool,
}

impl SleepMotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// All feet are on the resting pose; the servos may be released.
    pub fn is_folded(&self) -> bool {
        self.folded
    }

    /// Eases every foot toward the resting pose. Returns `true` once all are there.
    pub fn step(&mut self, feet: &mut [Vec3; 6], dt: f32) -> bool {
        if self.folded {
            return true;
        }
        let f = (SLEEP_RATE * dt).clamp(0.0, 1.0);
        for foot in feet.iter_mut() {
            let next = foot.lerp(SLEEP_POSE, f);
            *foot = Vec3::new(
                snap(foot.x, next.x, SLEEP_POSE.x),
                snap(foot.y, next.y, SLEEP_POSE.y),
                snap(foot.z, next.z, SLEEP_POSE.z),
            );
        }
        self.folded = feet.iter().all(|foot| *foot == SLEEP_POSE);
        self.folded
    }
}

fn snap(current: f32, next: f32, target: f32) -> f32 {
    if libm::fabsf(current - target) < SLEEP_SNAP {
        target
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_then_stays_folded() {
        let mut feet = [Vec3::new(173.0, 30.0, -60.0); 6];
        feet[4] = Vec3::new(200.0, -60.0, 10.0);
        let mut sleep = SleepMotion::new();
        let mut ticks = 0;
        while !sleep.step(&mut feet, 0.01) {
            ticks += 1;
            assert!(ticks < 1000, "never folded: {feet:?}");
        }
        assert!(sleep.is_folded());
        assert!(feet.iter().all(|foot| *foot == SLEEP_POSE));
        // 3 %/tick from ~100 mm away takes a couple of seconds
        assert!(ticks > 50);
    }
}
