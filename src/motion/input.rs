//! Low-pass filtering of operator input.
use crate::gait::MotionCommand;
use crate::robot::{commands::Intent, config::EngineConfig};

/// Smoothed sticks and stance height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputFilter {
    motion: MotionCommand,
    ground: f32,
}

impl InputFilter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            motion: MotionCommand::default(),
            ground: config.distance_from_ground,
        }
    }

    /// Current smoothed motion command.
    pub fn motion(&self) -> MotionCommand {
        self.motion
    }

    /// Current smoothed foot height of the standing pose, mm.
    pub fn ground(&self) -> f32 {
        self.ground
    }

    /// Moves the filtered values toward `intent`. Speed is taken as is.
    pub fn update(&mut self, intent: &Intent, config: &EngineConfig, dt: f32) {
        let stick = (config.input_smoothing_rate * dt).clamp(0.0, 1.0);
        let height = (config.height_smoothing_rate * dt).clamp(0.0, 1.0);

        self.motion.forward += (intent.forward - self.motion.forward) * stick;
        self.motion.strafe += (intent.strafe - self.motion.strafe) * stick;
        self.motion.rotation += (intent.rotation - self.motion.rotation) * stick;
        self.motion.speed = intent.speed;

        let target = config.distance_from_ground + intent.height * config.height_adjust_range;
        self.ground += (target - self.ground) * height;
    }

    /// Drops any remaining stick deflection, keeping the height.
    pub fn stop(&mut self) {
        self.motion = MotionCommand {
            speed: self.motion.speed,
            ..MotionCommand::default()
        };
    }
}
