//! Walking gaits.
//!
//! - [`table`] holds the six gait definitions and their validation.
//! - [`trajectory`] turns a definition, a stride plan and the cycle progress into
//!   foot targets.
pub mod table;
pub mod trajectory;

pub use table::{validate_table, GaitDefinition, GaitKind, GAIT_TABLE};
pub use trajectory::{CycleState, GaitTrajectory, LegPhase, MotionCommand, StridePlan};
