use core::fmt::{self, Display, Formatter};

use crate::gait::GaitKind;

/// Top-level behaviour of the robot. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Initialize,
    Stand,
    Walk,
    Calibrate,
    Sleep,
    Attack,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Initialize => f.write_str("initialize"),
            Mode::Stand => f.write_str("stand"),
            Mode::Walk => f.write_str("walk"),
            Mode::Calibrate => f.write_str("calibrate"),
            Mode::Sleep => f.write_str("sleep"),
            Mode::Attack => f.write_str("attack"),
        }
    }
}

/// Read-only snapshot of the engine for logs and the link's status reply.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    pub mode: Mode,
    /// Gait the operator currently selects.
    pub selected_gait: GaitKind,
    /// Gait latched by the running walk, if any.
    pub active_gait: Option<GaitKind>,
    pub ticks: u32,
    pub transitions: u32,
    /// Foot targets pulled back into reach by the solver.
    pub reach_clamps: u32,
    /// Times the link went from connected to disconnected.
    pub link_losses: u32,
    /// Link lines that failed to parse. Filled in by the firmware.
    pub link_frame_errors: u32,
}

impl Display for Telemetry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={} gait={} ticks={} transitions={} clamps={} losses={} frame_errors={}",
            self.mode,
            self.active_gait.unwrap_or(self.selected_gait),
            self.ticks,
            self.transitions,
            self.reach_clamps,
            self.link_losses,
            self.link_frame_errors
        )
    }
}
