//! AlarmScheduler - täglicher Sonnenaufgang-Wecker
//!
//! Zustandsmaschine Idle / Running:
//! - **Idle → Running:** Lokalzeit `hh:mm` == Weckzeit, Wecker aktiv.
//!   Startet den Sonnenaufgang über das `SequenceHandle`.
//! - **Running → Idle:** sobald seit der Weckzeit mehr als
//!   `alarm_duration_seconds` vergangen sind. Gerechnet wird mit Sekunden seit
//!   Mitternacht modulo 24 h, damit Fenster über eine volle Stunde oder
//!   Mitternacht hinweg korrekt enden. Der Reset hängt nur an der Uhrzeit,
//!   nicht am Ende der Sequenz.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::clock::WallClock;
use crate::config_store::ConfigStore;
use crate::error::Error;
use crate::light::{SequenceHandle, SequenceKind};
use crate::timesync::{RetryPolicy, TimeSyncOutcome, resolve};
use crate::traits::{ConfigStorage, PixelSink, TimeSource};
use crate::types::{AlarmConfig, LocalTime, SECONDS_PER_DAY};

/// Laufzeit-Zustand des Weckers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmState {
    Idle,
    /// Fenster seit `started_at` (Sekunden seit Mitternacht), `duration_seconds` lang
    Running {
        started_at: u32,
        duration_seconds: u32,
    },
}

/// Ergebnis eines `check_alarm`-Ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmAction {
    /// Noch keine Weckzeit (normaler Fall)
    None,
    /// Sonnenaufgang wurde gestartet
    Triggered,
    /// Fenster ist abgelaufen, zurück auf Idle
    Reset,
}

/// Wecker mit persistenter Konfiguration
pub struct AlarmScheduler<'a, M: RawMutex, S: PixelSink, C: ConfigStorage> {
    config: AlarmConfig,
    state: AlarmState,
    /// Tag und Minute des letzten Auslösens (verhindert Doppel-Trigger
    /// bei Dauern unter einer Minute)
    last_trigger: Option<((i32, u8, u8), u16)>,
    sequences: SequenceHandle<'a, M, S>,
    storage: C,
}

impl<'a, M: RawMutex, S: PixelSink, C: ConfigStorage> AlarmScheduler<'a, M, S, C> {
    pub fn new(sequences: SequenceHandle<'a, M, S>, storage: C, config: AlarmConfig) -> Self {
        Self {
            config,
            state: AlarmState::Idle,
            last_trigger: None,
            sequences,
            storage,
        }
    }

    /// Lädt die Konfiguration aus `storage`, bei Fehlern die Defaults
    pub fn restore(sequences: SequenceHandle<'a, M, S>, mut storage: C) -> Self {
        let config = match ConfigStore::load(&mut storage) {
            Ok(config) => {
                #[cfg(feature = "defmt")]
                defmt::info!("ALARM: config restored: {}", config);
                config
            }
            Err(Error::NotFound) => {
                #[cfg(feature = "defmt")]
                defmt::info!("ALARM: no stored config, using defaults");
                AlarmConfig::default()
            }
            Err(_error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("ALARM: stored config unusable ({}), using defaults", _error);
                AlarmConfig::default()
            }
        };
        Self::new(sequences, storage, config)
    }

    pub fn config(&self) -> AlarmConfig {
        self.config
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, AlarmState::Running { .. })
    }

    /// Handle auf den Sequenz-Runner
    pub fn sequences(&self) -> SequenceHandle<'a, M, S> {
        self.sequences
    }

    /// Ein Tick der Zustandsmaschine
    pub fn check_alarm(&mut self, now: &LocalTime) -> AlarmAction {
        match self.state {
            AlarmState::Idle => {
                let stamp = (now.date(), now.minutes_since_midnight());
                let due = self.config.alarm_enabled
                    && now.hour == self.config.alarm_hour
                    && now.minute == self.config.alarm_minute
                    && self.last_trigger != Some(stamp);
                if !due {
                    return AlarmAction::None;
                }

                let duration_seconds = self.config.alarm_duration_seconds;
                self.state = AlarmState::Running {
                    started_at: self.config.alarm_seconds_of_day(),
                    duration_seconds,
                };
                self.last_trigger = Some(stamp);
                self.sequences
                    .start(SequenceKind::Sunrise, duration_seconds.saturating_mul(1000));

                #[cfg(feature = "defmt")]
                defmt::info!(
                    "ALARM: triggered at {:02}:{:02}, sunrise for {} s",
                    now.hour,
                    now.minute,
                    duration_seconds
                );
                AlarmAction::Triggered
            }
            AlarmState::Running {
                started_at,
                duration_seconds,
            } => {
                let elapsed = (i64::from(now.seconds_since_midnight()) - i64::from(started_at))
                    .rem_euclid(SECONDS_PER_DAY);
                if elapsed > i64::from(duration_seconds) {
                    self.state = AlarmState::Idle;
                    #[cfg(feature = "defmt")]
                    defmt::info!("ALARM: window over, back to idle");
                    AlarmAction::Reset
                } else {
                    AlarmAction::None
                }
            }
        }
    }

    // ========================================================================
    // Konfiguration (wird jeweils persistiert)
    // ========================================================================

    /// Setzt Weckzeit, Dauer und Aktiv-Flag
    ///
    /// # Fehlerbehandlung
    /// `Error::InvalidArgument` bei ungültigen Werten, dann bleibt alles
    /// unverändert. Speicherfehler werden nur geloggt.
    pub fn set_alarm(
        &mut self,
        hour: u8,
        minute: u8,
        duration_seconds: u32,
        enabled: bool,
    ) -> Result<(), Error> {
        AlarmConfig::validate_alarm(hour, minute, duration_seconds)?;
        self.config.alarm_hour = hour;
        self.config.alarm_minute = minute;
        self.config.alarm_duration_seconds = duration_seconds;
        self.config.alarm_enabled = enabled;
        self.last_trigger = None;
        self.persist();
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.config.alarm_enabled != enabled {
            self.config.alarm_enabled = enabled;
            self.persist();
        }
    }

    /// Schaltet den Wecker um, gibt den neuen Zustand zurück
    pub fn toggle_enabled(&mut self) -> bool {
        self.set_enabled(!self.config.alarm_enabled);
        self.config.alarm_enabled
    }

    pub fn set_utc_offset(&mut self, offset_seconds: i32) -> Result<(), Error> {
        AlarmConfig::validate_offset(offset_seconds)?;
        self.config.utc_offset_seconds = offset_seconds;
        self.persist();
        Ok(())
    }

    pub fn set_dst_offset(&mut self, offset_seconds: i32) -> Result<(), Error> {
        AlarmConfig::validate_offset(offset_seconds)?;
        self.config.dst_offset_seconds = offset_seconds;
        self.persist();
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(_error) = ConfigStore::save(&mut self.storage, &self.config) {
            #[cfg(feature = "defmt")]
            defmt::warn!("ALARM: failed to persist config: {}", _error);
        }
    }

    // ========================================================================
    // Zeit
    // ========================================================================

    /// Lokalzeit aus der Uhr plus UTC- und DST-Offset
    pub fn local_time<CM: RawMutex>(&self, clock: &WallClock<CM>) -> Option<LocalTime> {
        let utc = clock.now_utc()?;
        Some(LocalTime::from_unix(utc + self.config.total_offset_seconds()))
    }

    /// Übernimmt ein Sync-Ergebnis: Offsets (falls geliefert) und Uhrzeit
    ///
    /// Ungültige Offsets der Quelle werden ignoriert, die Uhrzeit trotzdem
    /// gesetzt.
    pub fn apply_time_sync<CM: RawMutex>(
        &mut self,
        clock: &WallClock<CM>,
        outcome: &TimeSyncOutcome,
    ) -> LocalTime {
        if let (Some(raw), Some(dst)) = (outcome.time.raw_offset, outcome.time.dst_offset) {
            let valid = AlarmConfig::validate_offset(raw).is_ok()
                && AlarmConfig::validate_offset(dst).is_ok();
            let changed =
                raw != self.config.utc_offset_seconds || dst != self.config.dst_offset_seconds;
            if valid && changed {
                self.config.utc_offset_seconds = raw;
                self.config.dst_offset_seconds = dst;
                self.persist();
            }
        }

        clock.set_utc(outcome.time.unix_time);
        let local = LocalTime::from_unix(outcome.time.unix_time + self.config.total_offset_seconds());

        #[cfg(feature = "defmt")]
        defmt::info!(
            "TIME: {} {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            outcome.source,
            local.year,
            local.month,
            local.day,
            local.hour,
            local.minute,
            local.second
        );
        local
    }

    /// Holt die Zeit (primär, sonst Fallback) und stellt die Uhr
    ///
    /// Schlägt nie fehl: bei Totalausfall bleibt die Uhr unverändert und es
    /// wird eine Warnung geloggt. Hält `&mut self` während der Abfrage, die
    /// Firmware nutzt deshalb `resolve` + `apply_time_sync` getrennt.
    pub async fn update_time_from_network<CM: RawMutex, P: TimeSource, F: TimeSource>(
        &mut self,
        clock: &WallClock<CM>,
        primary: &mut P,
        fallback: &mut F,
        policy: &RetryPolicy,
    ) -> Option<LocalTime> {
        match resolve(primary, fallback, policy).await {
            Ok(outcome) => Some(self.apply_time_sync(clock, &outcome)),
            Err(_error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("TIME: impossible to update time: {}", _error);
                None
            }
        }
    }
}
