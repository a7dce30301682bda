//! Geometry for the hexapod legs.
//!
//! - [`vector`] small `Copy` vector types for foot positions.
//! - [`bezier`] the curve routine every foot path is built from.
//! - [`conversion`] inverse kinematics and servo pulse mapping.
//!
//! Used by the gait generator, the stance planner and the servo task.
pub mod bezier;
pub mod conversion;
pub mod vector;
