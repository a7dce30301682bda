//! Servo calibration table and its persistent record.
//!
//! The record is a fixed 79-byte block: a 4-byte magic, a version byte, the eighteen
//! offsets as little-endian `f32` in leg/joint order, then a CRC-16 (IBM 3740, stored
//! little-endian) over everything before it.
use core::fmt::Display;

use crc::{Crc, CRC_16_IBM_3740};

use super::joint::{Joint, JointOffsets};
use super::leg::Leg;
use crate::error::StoreError;

pub const RECORD_MAGIC: [u8; 4] = *b"HXCL";
pub const RECORD_VERSION: u8 = 2;
const RECORD_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);
const OFFSETS_LEN: usize = Leg::COUNT * 3 * 4;
pub const RECORD_LEN: usize = RECORD_MAGIC.len() + 1 + OFFSETS_LEN + 2;

/// Calibration deltas of all eighteen servos.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalibrationTable {
    pub legs: [JointOffsets; 6],
}

impl CalibrationTable {
    pub const ZERO: CalibrationTable = CalibrationTable {
        legs: [JointOffsets::ZERO; 6],
    };

    pub fn get(&self, leg: Leg, joint: Joint) -> f32 {
        self.legs[leg].get(joint)
    }

    /// Sets one delta (clamped to the calibration bound) and returns the stored value.
    pub fn set(&mut self, leg: Leg, joint: Joint, value: f32) -> f32 {
        self.legs[leg].set(joint, value)
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[..4].copy_from_slice(&RECORD_MAGIC);
        record[4] = RECORD_VERSION;

        let mut cursor = 5;
        for leg in Leg::ALL {
            for joint in Joint::ALL {
                record[cursor..cursor + 4].copy_from_slice(&self.get(leg, joint).to_le_bytes());
                cursor += 4;
            }
        }

        let sum = RECORD_CRC.checksum(&record[..cursor]);
        record[cursor..].copy_from_slice(&sum.to_le_bytes());
        record
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < RECORD_LEN {
            return Err(StoreError::Truncated);
        }
        let record = &bytes[..RECORD_LEN];
        if record[..4] != RECORD_MAGIC {
            return Err(StoreError::BadMagic);
        }
        if record[4] != RECORD_VERSION {
            return Err(StoreError::UnsupportedVersion(record[4]));
        }

        let body_end = RECORD_LEN - 2;
        let stored = u16::from_le_bytes([record[body_end], record[body_end + 1]]);
        if RECORD_CRC.checksum(&record[..body_end]) != stored {
            return Err(StoreError::Checksum);
        }

        let mut table = CalibrationTable::ZERO;
        let mut values = record[5..body_end].chunks_exact(4);
        for leg in Leg::ALL {
            for joint in Joint::ALL {
                let chunk = values.next().ok_or(StoreError::Truncated)?;
                let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                table.set(leg, joint, value);
            }
        }
        Ok(table)
    }
}

impl Display for CalibrationTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, offsets) in self.legs.iter().enumerate() {
            let [c, fe, t] = offsets.as_array();
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "[{c:.1} {fe:.1} {t:.1}]")?;
        }
        Ok(())
    }
}

/// Where calibration lives between power cycles.
pub trait OffsetStore {
    fn load(&mut self) -> Result<CalibrationTable, StoreError>;
    fn save(&mut self, table: &CalibrationTable) -> Result<(), StoreError>;
}

/// Store keeping the encoded record in RAM. Used on the host and in tests.
#[derive(Debug, Clone)]
pub struct RamStore {
    record: Option<[u8; RECORD_LEN]>,
    /// Makes every save fail, to exercise the fallback path.
    pub fail_saves: bool,
}

impl RamStore {
    pub const fn new() -> Self {
        Self {
            record: None,
            fail_saves: false,
        }
    }

    pub fn with_table(table: &CalibrationTable) -> Self {
        Self {
            record: Some(table.encode()),
            fail_saves: false,
        }
    }

    pub fn record(&self) -> Option<&[u8; RECORD_LEN]> {
        self.record.as_ref()
    }
}

impl Default for RamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OffsetStore for RamStore {
    fn load(&mut self) -> Result<CalibrationTable, StoreError> {
        match &self.record {
            Some(record) => CalibrationTable::decode(record),
            None => Err(StoreError::BadMagic),
        }
    }

    fn save(&mut self, table: &CalibrationTable) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(StoreError::Flash);
        }
        self.record = Some(table.encode());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CalibrationTable {
        let mut table = CalibrationTable::ZERO;
        table.set(Leg::FrontRight, Joint::Coxa, 1.5);
        table.set(Leg::RearRight, Joint::Femur, -2.25);
        table.set(Leg::FrontLeft, Joint::Tibia, 29.0);
        table.set(Leg::MiddleLeft, Joint::Coxa, -0.125);
        table
    }

    #[test]
    fn save_then_load_returns_same_offsets() {
        let mut store = RamStore::new();
        let table = sample();
        store.save(&table).unwrap();
        let loaded = store.load().unwrap();
        for leg in Leg::ALL {
            for joint in Joint::ALL {
                assert_eq!(loaded.get(leg, joint), table.get(leg, joint));
            }
        }
    }

    #[test]
    fn empty_store_reports_missing_record() {
        assert_eq!(RamStore::new().load(), Err(StoreError::BadMagic));
    }

    #[test]
    fn corrupted_record_is_rejected() {
        let mut record = sample().encode();
        record[10] ^= 0x40;
        assert_eq!(CalibrationTable::decode(&record), Err(StoreError::Checksum));

        let mut record = sample().encode();
        record[4] = 9;
        assert_eq!(
            CalibrationTable::decode(&record),
            Err(StoreError::UnsupportedVersion(9))
        );

        let record = sample().encode();
        assert_eq!(
            CalibrationTable::decode(&record[..RECORD_LEN - 1]),
            Err(StoreError::Truncated)
        );
    }

    #[test]
    fn zero_byte_turned_to_ff_is_detected() {
        let mut record = CalibrationTable::ZERO.encode();
        for i in 5..RECORD_LEN - 2 {
            record[i] = 0xFF;
            assert_eq!(
                CalibrationTable::decode(&record),
                Err(StoreError::Checksum),
                "byte {i}"
            );
            record[i] = 0x00;
        }
    }

    #[test]
    fn erased_flash_is_not_a_record() {
        assert_eq!(
            CalibrationTable::decode(&[0xFF; RECORD_LEN]),
            Err(StoreError::BadMagic)
        );
    }
}
