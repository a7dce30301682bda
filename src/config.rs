//! Firmware constants: link, timing, storage and channel sizes.
//!
//! Robot geometry and motion tunables live in [`crate::robot::config`].

// NETWORK
pub const PORT: u16 = 1234;
pub const RX_BUF_SIZE: usize = 1024;
pub const TX_BUF_SIZE: usize = 1024;
/// Longest accepted command line, bytes.
pub const MAX_LINE_LEN: usize = 96;

// TIMING
pub const TICK_HZ: u64 = 100;
pub const TICK_PERIOD_MS: u64 = 1000 / TICK_HZ;
/// An intent older than this marks the link as lost.
pub const INTENT_TIMEOUT_MS: u64 = 500;
pub const I2C_TIMEOUT_MS: u64 = 5;
pub const TELEMETRY_LOG_PERIOD_MS: u64 = 1000;

// CHANNELS
pub const LINKCMD_CHANNEL_SIZE: usize = 8;

// SERVO BOARDS
pub const PCA_FIRST_ADDRESS: u8 = 0x40;
pub const PCA_SECOND_ADDRESS: u8 = 0x41;
/// 25 MHz / (4096 * 50 Hz) - 1
pub const PCA_PRESCALE: u8 = 121;
pub const I2C_FREQUENCY_KHZ: u32 = 400;

// STORAGE
/// Flash offset of the calibration record (start of the NVS partition).
pub const CALIBRATION_FLASH_OFFSET: u32 = 0x9000;
