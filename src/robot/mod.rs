//! Core robot types and configuration.
//!
//! This module defines the main types and constants of the hexapod, including:
//! - [`commands`]: operator intent, link commands and servo frames.
//! - [`config`]: physical and movement constants for the robot.
//! - [`leg`]: leg enumeration and indexing helpers.
//! - [`joint`]: joint enumeration, angle triples and calibration deltas.
//! - [`calibration`]: the eighteen-offset table and its persistent record.
//! - [`link`]: staleness tracking of operator intents.
//! - [`state`]: engine mode and telemetry snapshot.
//! - `flash`: the calibration store in SPI flash (firmware only).
pub mod calibration;
pub mod commands;
pub mod config;
pub mod joint;
pub mod leg;
pub mod link;
pub mod state;
#[cfg(feature = "firmware")]
pub mod flash;
