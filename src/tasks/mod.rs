//! Asynchronous tasks for the hexapod firmware.
//!
//! This module contains Embassy async tasks for the robot's runtime, including:
//! - [`motion_task`]: Ticks the gait engine at 100 Hz and publishes servo frames.
//! - [`servo_task`]: Writes each frame to the two PCA9685 boards.
//! - [`net_task`]: Manages WiFi, the TCP command link and status replies.
//!
//! Tasks are spawned from `main.rs` and communicate via Embassy channels and signals.
pub mod motion_task;
pub mod net_task;
pub mod servo_task;
