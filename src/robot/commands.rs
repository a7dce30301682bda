//! Command types for robot control and inter-task communication.
//!
//! Defines the operator [`Intent`], the link command parser and the [`ServoFrame`]
//! handed from the motion task to the servo task.
//!
//! Used by the network, motion, and servo tasks.
use thiserror::Error;

use super::joint::{Joint, JointAngles};
use super::leg::Leg;
use crate::gait::GaitKind;

/// What the operator asks for. Refreshed every tick, never retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    /// Forward translation, -1..=1.
    pub forward: f32,
    /// Sideways translation, -1..=1.
    pub strafe: f32,
    /// Yaw rate, -1..=1.
    pub rotation: f32,
    /// Speed scale, 0..=2.
    pub speed: f32,
    /// Body height adjustment, -1..=1.
    pub height: f32,
    pub gait: GaitKind,
    pub calibrate: bool,
    pub sleep: bool,
    pub attack: bool,
    pub connected: bool,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            forward: 0.0,
            strafe: 0.0,
            rotation: 0.0,
            speed: 1.0,
            height: 0.0,
            gait: GaitKind::Tri,
            calibrate: false,
            sleep: false,
            attack: false,
            connected: false,
        }
    }
}

impl Intent {
    /// Idle intent from a live link.
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// Copy with every field forced into its documented range. NaN reads as zero.
    pub fn normalized(&self) -> Self {
        Self {
            forward: bounded(self.forward, -1.0, 1.0),
            strafe: bounded(self.strafe, -1.0, 1.0),
            rotation: bounded(self.rotation, -1.0, 1.0),
            speed: bounded(self.speed, 0.0, 2.0),
            height: bounded(self.height, -1.0, 1.0),
            ..*self
        }
    }

    /// Same request with every motion and request cleared, as used when the link drops.
    pub fn disconnected(&self) -> Self {
        Self {
            gait: self.gait,
            height: self.height,
            ..Self::default()
        }
    }
}

fn bounded(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

/// Power state the servo task applies alongside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Torque {
    #[default]
    Hold,
    Release,
}

/// Eighteen servo angles for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServoFrame {
    pub angles: [JointAngles; 6],
    pub torque: Torque,
}

/// One line received on the operator link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkCommand {
    Intent(Intent),
    AdjustOffset { leg: Leg, joint: Joint, delta: f32 },
    ResetOffsets,
    Status,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty line")]
    Empty,
    #[error("line is not utf-8")]
    NotUtf8,
    #[error("unknown command")]
    UnknownCommand,
    #[error("missing argument")]
    MissingArgument,
    #[error("invalid number")]
    InvalidNumber,
    #[error("leg index out of range")]
    InvalidLeg,
    #[error("unknown joint")]
    InvalidJoint,
    #[error("gait index out of range")]
    InvalidGait,
    #[error("unknown flag")]
    InvalidFlag,
}

impl TryFrom<&str> for LinkCommand {
    type Error = ParseCommandError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut tokens = value.split_whitespace();

        let cmd = tokens.next().ok_or(ParseCommandError::Empty)?;
        match cmd {
            "i" => {
                let mut intent = Intent::connected();
                intent.forward = number(tokens.next())?;
                intent.strafe = number(tokens.next())?;
                intent.rotation = number(tokens.next())?;
                intent.speed = number(tokens.next())?;
                intent.height = number(tokens.next())?;
                let gait: u8 = tokens
                    .next()
                    .ok_or(ParseCommandError::MissingArgument)?
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidGait)?;
                intent.gait = GaitKind::try_from(gait).map_err(|_| ParseCommandError::InvalidGait)?;
                if let Some(flags) = tokens.next() {
                    for flag in flags.chars() {
                        match flag {
                            'c' => intent.calibrate = true,
                            's' => intent.sleep = true,
                            'x' => intent.attack = true,
                            '-' => {}
                            _ => return Err(ParseCommandError::InvalidFlag),
                        }
                    }
                }
                Ok(LinkCommand::Intent(intent.normalized()))
            }
            "a" => {
                let leg: usize = tokens
                    .next()
                    .ok_or(ParseCommandError::MissingArgument)?
                    .parse()
                    .map_err(|_| ParseCommandError::InvalidLeg)?;
                let leg = Leg::try_from(leg).map_err(|_| ParseCommandError::InvalidLeg)?;
                let joint = match tokens.next().ok_or(ParseCommandError::MissingArgument)? {
                    "c" | "0" => Joint::Coxa,
                    "f" | "1" => Joint::Femur,
                    "t" | "2" => Joint::Tibia,
                    _ => return Err(ParseCommandError::InvalidJoint),
                };
                let delta = number(tokens.next())?;
                Ok(LinkCommand::AdjustOffset { leg, joint, delta })
            }
            "z" => Ok(LinkCommand::ResetOffsets),
            "s" => Ok(LinkCommand::Status),
            "q" => Ok(LinkCommand::Quit),
            _ => Err(ParseCommandError::UnknownCommand),
        }
    }
}

/// Raw bytes of one line as read off the socket.
impl TryFrom<&[u8]> for LinkCommand {
    type Error = ParseCommandError;

    fn try_from(line: &[u8]) -> Result<Self, Self::Error> {
        let text = core::str::from_utf8(line).map_err(|_| ParseCommandError::NotUtf8)?;
        LinkCommand::try_from(text)
    }
}

fn number(token: Option<&str>) -> Result<f32, ParseCommandError> {
    let value: f32 = token
        .ok_or(ParseCommandError::MissingArgument)?
        .parse()
        .map_err(|_| ParseCommandError::InvalidNumber)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseCommandError::InvalidNumber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_intent_frame() {
        let cmd = LinkCommand::try_from("i 0.5 -0.25 0 1.5 0.2 2 cs").unwrap();
        let LinkCommand::Intent(intent) = cmd else {
            panic!("expected intent, got {cmd:?}");
        };
        assert_eq!(intent.forward, 0.5);
        assert_eq!(intent.strafe, -0.25);
        assert_eq!(intent.speed, 1.5);
        assert_eq!(intent.gait, GaitKind::Wave);
        assert!(intent.calibrate && intent.sleep && !intent.attack);
        assert!(intent.connected);
    }

    #[test]
    fn intent_values_are_normalized() {
        let Ok(LinkCommand::Intent(intent)) = LinkCommand::try_from("i 3 -3 0.5 9 -2 0") else {
            panic!("intent frame rejected");
        };
        assert_eq!(intent.forward, 1.0);
        assert_eq!(intent.strafe, -1.0);
        assert_eq!(intent.speed, 2.0);
        assert_eq!(intent.height, -1.0);
    }

    #[test]
    fn parses_offset_adjustment() {
        assert_eq!(
            LinkCommand::try_from("a 5 f -1.5"),
            Ok(LinkCommand::AdjustOffset {
                leg: Leg::FrontLeft,
                joint: Joint::Femur,
                delta: -1.5
            })
        );
        assert_eq!(
            LinkCommand::try_from("a 6 c 1"),
            Err(ParseCommandError::InvalidLeg)
        );
        assert_eq!(
            LinkCommand::try_from("a 1 k 1"),
            Err(ParseCommandError::InvalidJoint)
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(LinkCommand::try_from("   "), Err(ParseCommandError::Empty));
        assert_eq!(LinkCommand::try_from("w 3"), Err(ParseCommandError::UnknownCommand));
        assert_eq!(
            LinkCommand::try_from("i 0 0 0 1"),
            Err(ParseCommandError::MissingArgument)
        );
        assert_eq!(
            LinkCommand::try_from("i 0 nan 0 1 0 0"),
            Err(ParseCommandError::InvalidNumber)
        );
        assert_eq!(
            LinkCommand::try_from("i 0 0 0 1 0 7"),
            Err(ParseCommandError::InvalidGait)
        );
        assert_eq!(LinkCommand::try_from("q"), Ok(LinkCommand::Quit));
    }

    #[test]
    fn raw_lines_must_be_utf8() {
        assert_eq!(LinkCommand::try_from(&b"s\r"[..]), Ok(LinkCommand::Status));
        assert_eq!(
            LinkCommand::try_from(&b"i 0.5 \xff 0 1 0 0"[..]),
            Err(ParseCommandError::NotUtf8)
        );
        assert_eq!(LinkCommand::try_from(&b" \t"[..]), Err(ParseCommandError::Empty));
    }
}
