//! Locomotion modes and the state machine driving them.
//!
//! - [`gait_engine`]: the per-tick state machine producing servo frames.
//! - [`stance`]: two-group transitions into the standing pose.
//! - [`sleep`], [`calibrate`], [`attack`]: the scripted poses.
//! - [`input`]: smoothing of operator sticks and height.
pub mod attack;
pub mod calibrate;
pub mod gait_engine;
pub mod input;
pub mod sleep;
pub mod stance;

pub use gait_engine::GaitEngine;
pub use input::InputFilter;
pub use stance::{grounded_count, StanceLift, StancePlanner, StanceStage};
