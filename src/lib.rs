//! Library root for the hexapod firmware.
//!
//! The locomotion engine ([`kinematics`], [`gait`], [`motion`], [`robot`]) is
//! target independent and runs on the host in tests. The embassy [`tasks`] that
//! drive the servo boards and the operator link only exist with the `firmware`
//! feature.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod gait;
pub mod kinematics;
pub mod motion;
pub mod robot;
#[cfg(feature = "firmware")]
pub mod tasks;
