//! ConfigStore - Codec für den persistenten `AlarmConfig`-Record
//!
//! Record-Layout (19 Bytes, little-endian):
//!
//! | Offset | Größe | Feld                     |
//! |--------|-------|--------------------------|
//! | 0      | 2     | Magic Header `0x57AC`    |
//! | 2      | 1     | Version                  |
//! | 3      | 4     | `utc_offset_seconds`     |
//! | 7      | 4     | `dst_offset_seconds`     |
//! | 11     | 1     | `alarm_hour`             |
//! | 12     | 1     | `alarm_minute`           |
//! | 13     | 4     | `alarm_duration_seconds` |
//! | 17     | 1     | `alarm_enabled`          |
//! | 18     | 1     | Checksumme               |
//!
//! Die Checksumme ist die Wrapping-Summe der Bytes 0..18.

use crate::error::Error;
use crate::traits::ConfigStorage;
use crate::types::AlarmConfig;

const MAGIC_HEADER: u16 = 0x57AC;
const RECORD_VERSION: u8 = 1;

/// Größe des Records in Bytes
pub const CONFIG_RECORD_SIZE: usize = 19;

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

/// Zustandsloser Codec zwischen `AlarmConfig` und dem Speicher-Record
pub struct ConfigStore;

impl ConfigStore {
    /// Serialisiert die Konfiguration in einen Record
    pub fn encode(config: &AlarmConfig) -> [u8; CONFIG_RECORD_SIZE] {
        let mut data = [0u8; CONFIG_RECORD_SIZE];
        data[0..2].copy_from_slice(&MAGIC_HEADER.to_le_bytes());
        data[2] = RECORD_VERSION;
        data[3..7].copy_from_slice(&config.utc_offset_seconds.to_le_bytes());
        data[7..11].copy_from_slice(&config.dst_offset_seconds.to_le_bytes());
        data[11] = config.alarm_hour;
        data[12] = config.alarm_minute;
        data[13..17].copy_from_slice(&config.alarm_duration_seconds.to_le_bytes());
        data[17] = u8::from(config.alarm_enabled);
        data[18] = checksum(&data[..18]);
        data
    }

    /// Liest einen Record
    ///
    /// # Fehlerbehandlung
    /// - `Error::NotFound`: kein Magic Header (leerer/gelöschter Flash)
    /// - `Error::Persistence`: zu kurz, falsche Version, Checksumme oder
    ///   Feldwerte außerhalb der Invarianten
    pub fn decode(data: &[u8]) -> Result<AlarmConfig, Error> {
        if data.len() < CONFIG_RECORD_SIZE {
            return Err(Error::Persistence);
        }
        if u16::from_le_bytes([data[0], data[1]]) != MAGIC_HEADER {
            return Err(Error::NotFound);
        }
        if data[2] != RECORD_VERSION || checksum(&data[..18]) != data[18] {
            return Err(Error::Persistence);
        }

        let config = AlarmConfig {
            utc_offset_seconds: i32::from_le_bytes([data[3], data[4], data[5], data[6]]),
            dst_offset_seconds: i32::from_le_bytes([data[7], data[8], data[9], data[10]]),
            alarm_hour: data[11],
            alarm_minute: data[12],
            alarm_duration_seconds: u32::from_le_bytes([data[13], data[14], data[15], data[16]]),
            alarm_enabled: match data[17] {
                0 => false,
                1 => true,
                _ => return Err(Error::Persistence),
            },
        };

        if !config.is_valid() {
            return Err(Error::Persistence);
        }
        Ok(config)
    }

    /// Lädt die Konfiguration aus `storage`
    pub fn load<C: ConfigStorage>(storage: &mut C) -> Result<AlarmConfig, Error> {
        let mut data = [0u8; CONFIG_RECORD_SIZE];
        storage.read(&mut data)?;
        Self::decode(&data)
    }

    /// Schreibt die Konfiguration als ganzen Record
    pub fn save<C: ConfigStorage>(storage: &mut C, config: &AlarmConfig) -> Result<(), Error> {
        storage.write(&Self::encode(config))
    }
}
