//! Integration Tests für ConfigStore gegen MockStorage

mod common;

use common::MockStorage;
use wakeup_core::{AlarmConfig, CONFIG_RECORD_SIZE, ConfigStore, Error};

#[test]
fn test_save_then_load_returns_same_config() {
    let mut storage = MockStorage::new();
    let config = AlarmConfig {
        utc_offset_seconds: -12_600,
        dst_offset_seconds: 3600,
        alarm_hour: 23,
        alarm_minute: 59,
        alarm_duration_seconds: 4 * 3600,
        alarm_enabled: false,
    };

    ConfigStore::save(&mut storage, &config).unwrap();

    assert_eq!(storage.data().map(|data| data.len()), Some(CONFIG_RECORD_SIZE));
    assert_eq!(ConfigStore::load(&mut storage), Ok(config));
}

#[test]
fn test_load_from_blank_storage_is_not_found() {
    let mut storage = MockStorage::new();
    assert_eq!(ConfigStore::load(&mut storage), Err(Error::NotFound));
}

#[test]
fn test_load_truncated_record_is_persistence_error() {
    let record = ConfigStore::encode(&AlarmConfig::default());
    // Nur die ersten Bytes überlebt, Rest liest sich als 0xFF
    let mut storage = MockStorage::with_data(&record[..10]);
    assert_eq!(ConfigStore::load(&mut storage), Err(Error::Persistence));
}

#[test]
fn test_record_layout_is_little_endian() {
    let config = AlarmConfig {
        utc_offset_seconds: 0x0102_0304,
        alarm_duration_seconds: 1200,
        ..AlarmConfig::default()
    };
    let record = ConfigStore::encode(&config);

    assert_eq!(&record[0..2], &[0xAC, 0x57]);
    assert_eq!(record[2], 1);
    assert_eq!(&record[3..7], &[0x04, 0x03, 0x02, 0x01]);
    assert_eq!(record[11], 6);
    assert_eq!(record[12], 15);
    assert_eq!(&record[13..17], &1200u32.to_le_bytes());
    assert_eq!(record[17], 1);
}

#[test]
fn test_invalid_enabled_byte_is_rejected() {
    let mut record = ConfigStore::encode(&AlarmConfig::default());
    record[17] = 2;
    record[18] = record[..18].iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte));

    assert_eq!(ConfigStore::decode(&record), Err(Error::Persistence));
}
