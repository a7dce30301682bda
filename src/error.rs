//! Error types of the locomotion engine.
use thiserror::Error;

use crate::gait::GaitKind;
use crate::robot::{joint::Joint, leg::Leg};

/// Gait table contents that would make the generator misbehave. Fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("{gait}: duty factor {duty} outside (0, 1)")]
    DutyFactor { gait: GaitKind, duty: f32 },
    #[error("{gait}: phase offset {offset} of {leg} outside [0, 1)")]
    PhaseOffset { gait: GaitKind, leg: Leg, offset: f32 },
    #[error("{gait}: multipliers and limits must be positive")]
    NonPositive { gait: GaitKind },
}

/// Failures of the persistent calibration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("flash access failed")]
    Flash,
    #[error("calibration record is truncated")]
    Truncated,
    #[error("no calibration record found")]
    BadMagic,
    #[error("unsupported calibration record version {0}")]
    UnsupportedVersion(u8),
    #[error("calibration record checksum mismatch")]
    Checksum,
}

/// Rejected calibration requests.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CalibrationError {
    #[error("offsets can only be changed while calibrating")]
    NotCalibrating,
    #[error("offset delta for {leg} {joint} is not finite")]
    InvalidDelta { leg: Leg, joint: Joint },
}
