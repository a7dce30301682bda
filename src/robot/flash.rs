//! Calibration record in the ESP32 SPI flash.
use embedded_storage::{ReadStorage, Storage};
use esp_storage::FlashStorage;
use log::{debug, error};

use super::calibration::{CalibrationTable, OffsetStore, RECORD_LEN};
use crate::config::CALIBRATION_FLASH_OFFSET;
use crate::error::StoreError;

pub struct FlashStore {
    flash: FlashStorage,
    offset: u32,
}

impl FlashStore {
    pub fn new() -> Self {
        Self::at(CALIBRATION_FLASH_OFFSET)
    }

    pub fn at(offset: u32) -> Self {
        Self {
            flash: FlashStorage::new(),
            offset,
        }
    }
}

impl Default for FlashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetStore for FlashStore {
    fn load(&mut self) -> Result<CalibrationTable, StoreError> {
        let mut record = [0u8; RECORD_LEN];
        self.flash.read(self.offset, &mut record).map_err(|e| {
            error!("[FLASH] read at {:#x} failed: {e:?}", self.offset);
            StoreError::Flash
        })?;
        CalibrationTable::decode(&record)
    }

    fn save(&mut self, table: &CalibrationTable) -> Result<(), StoreError> {
        self.flash
            .write(self.offset, &table.encode())
            .map_err(|e| {
                error!("[FLASH] write at {:#x} failed: {e:?}", self.offset);
                StoreError::Flash
            })?;
        debug!("[FLASH] calibration saved");
        Ok(())
    }
}
