//! Core Types für Lichtsteuerung und Wecker
//!
//! Datenstrukturen ohne Hardware-Dependencies

use rgb::RGB8;

use crate::error::Error;
use crate::logic::civil_from_days;

/// Sekunden pro Tag
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Minuten pro Tag
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Maximale Sunrise-Dauer (4 Stunden)
pub const MAX_ALARM_DURATION_SECONDS: u32 = 4 * 3600;

/// Maximaler Betrag eines UTC- oder DST-Offsets (±14 Stunden)
pub const MAX_OFFSET_SECONDS: i32 = 14 * 3600;

/// RGBW-Farbe mit 4 Kanälen (0-255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Color {
    /// Alle Kanäle aus
    pub const OFF: Color = Color::new(0, 0, 0, 0);
    /// RGB-Weiß ohne White-Kanal
    pub const WHITE: Color = Color::new(255, 255, 255, 0);
    /// Volle Helligkeit auf allen vier Kanälen
    pub const FULL_WHITE: Color = Color::new(255, 255, 255, 255);
    /// "Sonne": goldenes Bernstein für die Mitte des Sonnenaufgangs
    pub const AMBER: Color = Color::new(255, 64, 0, 0);
    /// Gedimmtes warmes Weiß für den Beginn des Sonnenaufgangs
    pub const DIM_WARM_WHITE: Color = Color::new(32, 8, 0, 16);

    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// true wenn alle Kanäle 0 sind
    pub const fn is_off(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.w == 0
    }

    /// Skaliert alle Kanäle mit `factor` (wird auf [0, 1] begrenzt)
    ///
    /// Nachkommastellen werden abgeschnitten.
    pub fn scale(self, factor: f32) -> Self {
        let factor = if factor.is_nan() {
            0.0
        } else {
            factor.clamp(0.0, 1.0)
        };
        let channel = |c: u8| (f32::from(c) * factor) as u8;
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            w: channel(self.w),
        }
    }
}

impl From<RGB8> for Color {
    fn from(color: RGB8) -> Self {
        Self::new(color.r, color.g, color.b, 0)
    }
}

/// Persistente Wecker-Konfiguration
///
/// Invariante: `alarm_hour` < 24, `alarm_minute` < 60,
/// 0 < `alarm_duration_seconds` <= `MAX_ALARM_DURATION_SECONDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    pub utc_offset_seconds: i32,
    pub dst_offset_seconds: i32,
    pub alarm_hour: u8,
    pub alarm_minute: u8,
    pub alarm_duration_seconds: u32,
    pub alarm_enabled: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            utc_offset_seconds: 3600,
            dst_offset_seconds: 0,
            alarm_hour: 6,
            alarm_minute: 15,
            alarm_duration_seconds: 1200,
            alarm_enabled: true,
        }
    }
}

impl AlarmConfig {
    /// Prüft Weckzeit und Dauer gegen die Invarianten
    pub fn validate_alarm(hour: u8, minute: u8, duration_seconds: u32) -> Result<(), Error> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidArgument);
        }
        if duration_seconds == 0 || duration_seconds > MAX_ALARM_DURATION_SECONDS {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// Prüft einen UTC- oder DST-Offset
    pub fn validate_offset(offset_seconds: i32) -> Result<(), Error> {
        if offset_seconds.unsigned_abs() > MAX_OFFSET_SECONDS.unsigned_abs() {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// true wenn alle Felder die Invarianten erfüllen
    pub fn is_valid(&self) -> bool {
        Self::validate_alarm(
            self.alarm_hour,
            self.alarm_minute,
            self.alarm_duration_seconds,
        )
        .is_ok()
            && Self::validate_offset(self.utc_offset_seconds).is_ok()
            && Self::validate_offset(self.dst_offset_seconds).is_ok()
    }

    /// Summe aus UTC- und DST-Offset
    pub fn total_offset_seconds(&self) -> i64 {
        i64::from(self.utc_offset_seconds) + i64::from(self.dst_offset_seconds)
    }

    /// Weckzeit in Sekunden seit Mitternacht
    pub fn alarm_seconds_of_day(&self) -> u32 {
        u32::from(self.alarm_hour) * 3600 + u32::from(self.alarm_minute) * 60
    }
}

/// Lokale Wanduhr-Zeit, aufgeteilt in Datum und Uhrzeit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalTime {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    /// Zerlegt lokale Unix-Sekunden (UTC + Offsets) in Datum und Uhrzeit
    pub fn from_unix(local_secs: i64) -> Self {
        let days = local_secs.div_euclid(SECONDS_PER_DAY);
        let secs_of_day = local_secs.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        Self {
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u8,
            minute: (secs_of_day % 3600 / 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }

    /// Uhrzeit am 01.01.2000 (praktisch für Tests und feste Zeitpunkte)
    pub const fn at(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour,
            minute,
            second,
        }
    }

    /// Minuten seit Mitternacht
    pub fn minutes_since_midnight(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Sekunden seit Mitternacht
    pub fn seconds_since_midnight(&self) -> u32 {
        u32::from(self.minutes_since_midnight()) * 60 + u32::from(self.second)
    }

    /// Kalendertag als Tupel (für "einmal pro Tag"-Vergleiche)
    pub fn date(&self) -> (i32, u8, u8) {
        (self.year, self.month, self.day)
    }
}

/// Ergebnis einer Netzwerk-Zeitabfrage
///
/// SNTP kennt keine Zeitzone, dort bleiben die Offsets `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkTime {
    pub unix_time: i64,
    pub raw_offset: Option<i32>,
    pub dst_offset: Option<i32>,
}

impl NetworkTime {
    /// Reine UTC-Zeit ohne Zeitzonen-Information
    pub const fn utc(unix_time: i64) -> Self {
        Self {
            unix_time,
            raw_offset: None,
            dst_offset: None,
        }
    }
}

/// Status-Snapshot für MQTT- und HTTP-Veröffentlichung
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatusSnapshot {
    pub light_on: bool,
    pub current_color: Color,
    pub brightness: f32,
    pub alarm_on: bool,
    pub alarm_hour: u8,
    pub alarm_minute: u8,
    pub alarm_delay: u32,
    pub alarm_running: bool,
    pub sequence_active: bool,
    pub heartbeat_on: bool,
    pub current_time: Option<LocalTime>,
    pub utc_offset: i32,
    pub dst_offset: i32,
}
