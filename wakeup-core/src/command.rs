//! Commands - Dekodierung und Dispatch eingehender Befehle
//!
//! MQTT-Topics und HTTP-Routen werden an der Transport-Grenze einmal in ein
//! `Command` übersetzt. `WakeUpLight::handle` wendet es auf den Core an.
//!
//! # Payload-Formate
//! - Farben: `#rrggbb`, `rgb(r,g,b)` oder `r,g,b[,w]`
//! - Weckzeit: `HH:MM[,dauer_s[,0|1]]`
//! - Offsets: ganze Stunden (`2`, `-5`)
//! - Sequenzen: `start`, `stop` oder Dauer in Sekunden

use core::str::FromStr;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

use crate::alarm::AlarmScheduler;
use crate::clock::WallClock;
use crate::error::Error;
use crate::heartbeat::HeartbeatAnimator;
use crate::light::{LightDriver, SequenceKind};
use crate::traits::{ConfigStorage, PixelSink};
use crate::types::{AlarmConfig, Color, MAX_ALARM_DURATION_SECONDS, StatusSnapshot};

/// Ein dekodierter Befehl
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Toggle,
    TurnOn {
        full: bool,
    },
    TurnOff,
    SetBrightness(f32),
    SetColor(Color),
    SetAlarm {
        hour: u8,
        minute: u8,
        duration_seconds: Option<u32>,
        enabled: Option<bool>,
    },
    SetAlarmHour(u8),
    SetAlarmMinute(u8),
    /// Sonnenaufgang-Dauer in Sekunden
    SetAlarmDuration(u32),
    ToggleAlarm,
    SetAlarmEnabled(bool),
    /// UTC-Offset in ganzen Stunden
    SetUtcOffset(i32),
    /// DST-Offset in ganzen Stunden
    SetDstOffset(i32),
    ToggleHeartbeat,
    /// Sonnenaufgang starten, Dauer in Sekunden (Default: Weckerdauer)
    Sunrise(Option<u32>),
    /// Sonnenuntergang starten, Dauer in Sekunden (Default: Weckerdauer)
    Sunset(Option<u32>),
    StopSequence,
    RequestStatus,
}

fn number<T: FromStr>(text: &str) -> Result<T, Error> {
    text.trim().parse().map_err(|_| Error::InvalidArgument)
}

fn flag(text: &str) -> Result<bool, Error> {
    match text.trim() {
        "1" | "true" | "on" => Ok(true),
        "0" | "false" | "off" => Ok(false),
        _ => Err(Error::InvalidArgument),
    }
}

/// Parst `#rrggbb`, `rgb(r,g,b)` oder `r,g,b[,w]`
pub fn parse_color(text: &str) -> Result<Color, Error> {
    let text = text.trim();

    if let Some(hex) = text.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(Error::InvalidArgument);
        }
        let channel = |range: core::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidArgument)
        };
        return Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 0));
    }

    let list = match text.strip_prefix("rgb(") {
        Some(rest) => rest.strip_suffix(')').ok_or(Error::InvalidArgument)?,
        None => text,
    };

    let mut channels = [0u8; 4];
    let mut count = 0;
    for part in list.split(',') {
        let slot = channels.get_mut(count).ok_or(Error::InvalidArgument)?;
        *slot = number(part)?;
        count += 1;
    }
    if count < 3 {
        return Err(Error::InvalidArgument);
    }

    Ok(Color::new(channels[0], channels[1], channels[2], channels[3]))
}

/// Parst `HH:MM[,dauer_s[,0|1]]`
fn parse_alarm_time(text: &str) -> Result<Command, Error> {
    let mut parts = text.trim().split(',');
    let time = parts.next().ok_or(Error::InvalidArgument)?;
    let (hour, minute) = time.split_once(':').ok_or(Error::InvalidArgument)?;

    let duration_seconds = parts.next().map(number::<u32>).transpose()?;
    let enabled = parts.next().map(flag).transpose()?;
    if parts.next().is_some() {
        return Err(Error::InvalidArgument);
    }

    Ok(Command::SetAlarm {
        hour: number(hour)?,
        minute: number(minute)?,
        duration_seconds,
        enabled,
    })
}

/// `start` / leer → Start mit Default-Dauer, `stop` → Abbruch, Zahl → Sekunden
fn parse_sequence(kind: SequenceKind, text: &str) -> Result<Command, Error> {
    let seconds = match text.trim() {
        "" | "start" => None,
        "stop" => return Ok(Command::StopSequence),
        other => Some(number(other)?),
    };
    Ok(match kind {
        SequenceKind::Sunrise => Command::Sunrise(seconds),
        SequenceKind::Sunset => Command::Sunset(seconds),
    })
}

impl Command {
    /// Kanonische Befehlsnamen (je einer pro Befehl), z.B. für MQTT-Subscriptions
    pub const TOPICS: [&'static str; 16] = [
        "toggle_light",
        "on",
        "off",
        "set_brightness",
        "set_rgbw",
        "set_alarm_time",
        "set_alarm_hour",
        "set_alarm_minute",
        "set_alarm_delay",
        "toggle_alarm",
        "set_utc_offset",
        "set_dst_offset",
        "toggle_heartbeat",
        "sunrise",
        "sunset",
        "publish_updates",
    ];

    /// Dekodiert ein Topic (nur das letzte Segment zählt) und die Payload
    ///
    /// # Fehlerbehandlung
    /// `Error::InvalidArgument` für unbekannte Topics und kaputte Payloads
    pub fn parse(topic: &str, payload: &str) -> Result<Self, Error> {
        let name = topic.rsplit('/').next().unwrap_or(topic);

        match name {
            "toggle_light" | "toggle" => Ok(Command::Toggle),
            "on" => match payload.trim() {
                "" | "1" | "full" => Ok(Command::TurnOn { full: true }),
                "0" | "white" => Ok(Command::TurnOn { full: false }),
                _ => Err(Error::InvalidArgument),
            },
            "off" => Ok(Command::TurnOff),
            "set_brightness" => Ok(Command::SetBrightness(number(payload)?)),
            "set_rgbw" | "set_color" => Ok(Command::SetColor(parse_color(payload)?)),
            "set_alarm_time" => parse_alarm_time(payload),
            "set_alarm_hour" => Ok(Command::SetAlarmHour(number(payload)?)),
            "set_alarm_minute" => Ok(Command::SetAlarmMinute(number(payload)?)),
            "set_alarm_delay" => Ok(Command::SetAlarmDuration(number(payload)?)),
            "toggle_alarm" => match payload.trim() {
                "" => Ok(Command::ToggleAlarm),
                other => Ok(Command::SetAlarmEnabled(flag(other)?)),
            },
            "set_utc_offset" => Ok(Command::SetUtcOffset(number(payload)?)),
            "set_dst_offset" => Ok(Command::SetDstOffset(number(payload)?)),
            "toggle_heartbeat" => Ok(Command::ToggleHeartbeat),
            "sunrise" => parse_sequence(SequenceKind::Sunrise, payload),
            "sunset" => parse_sequence(SequenceKind::Sunset, payload),
            "publish_updates" | "request_status" => Ok(Command::RequestStatus),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// true für Befehle, die eine laufende Sequenz überschreiben
    pub fn is_manual_override(&self) -> bool {
        matches!(
            self,
            Command::Toggle
                | Command::TurnOn { .. }
                | Command::TurnOff
                | Command::SetBrightness(_)
                | Command::SetColor(_)
        )
    }
}

fn hours_to_seconds(hours: i32) -> Result<i32, Error> {
    hours.checked_mul(3600).ok_or(Error::InvalidArgument)
}

/// Kontext für den Befehls-Dispatch
///
/// Bündelt Referenzen auf alle Core-Komponenten; in der Firmware liegt alles
/// in statischem Speicher.
pub struct WakeUpLight<'a, M: RawMutex, S: PixelSink, C: ConfigStorage> {
    pub light: &'a LightDriver<M, S>,
    pub heartbeat: &'a HeartbeatAnimator<'a, M, S>,
    pub scheduler: &'a Mutex<M, AlarmScheduler<'a, M, S, C>>,
    pub clock: &'a WallClock<M>,
}

impl<M: RawMutex, S: PixelSink, C: ConfigStorage> Clone for WakeUpLight<'_, M, S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, S: PixelSink, C: ConfigStorage> Copy for WakeUpLight<'_, M, S, C> {}

impl<'a, M: RawMutex, S: PixelSink, C: ConfigStorage> WakeUpLight<'a, M, S, C> {
    /// Wendet einen Befehl an
    ///
    /// Gibt `true` zurück, wenn danach ein Status veröffentlicht werden soll.
    /// Manuelle Licht-Befehle brechen eine laufende Sequenz vorher ab.
    pub async fn handle(&self, command: Command) -> Result<bool, Error> {
        match command {
            Command::Toggle => self.light.toggle().await?,
            Command::TurnOn { full } => self.light.turn_on(full).await?,
            Command::TurnOff => self.light.turn_off().await?,
            Command::SetBrightness(scale) => self.light.set_brightness(scale).await?,
            Command::SetColor(color) => self.light.set_color(color).await?,

            Command::SetAlarm {
                hour,
                minute,
                duration_seconds,
                enabled,
            } => {
                let mut scheduler = self.scheduler.lock().await;
                let config = scheduler.config();
                scheduler.set_alarm(
                    hour,
                    minute,
                    duration_seconds.unwrap_or(config.alarm_duration_seconds),
                    enabled.unwrap_or(config.alarm_enabled),
                )?;
            }
            Command::SetAlarmHour(hour) => {
                self.update_alarm(|config| config.alarm_hour = hour).await?
            }
            Command::SetAlarmMinute(minute) => {
                self.update_alarm(|config| config.alarm_minute = minute)
                    .await?
            }
            Command::SetAlarmDuration(seconds) => {
                self.update_alarm(|config| config.alarm_duration_seconds = seconds)
                    .await?
            }
            Command::ToggleAlarm => {
                self.scheduler.lock().await.toggle_enabled();
            }
            Command::SetAlarmEnabled(enabled) => {
                self.scheduler.lock().await.set_enabled(enabled);
            }
            Command::SetUtcOffset(hours) => {
                let seconds = hours_to_seconds(hours)?;
                self.scheduler.lock().await.set_utc_offset(seconds)?;
            }
            Command::SetDstOffset(hours) => {
                let seconds = hours_to_seconds(hours)?;
                self.scheduler.lock().await.set_dst_offset(seconds)?;
            }

            Command::ToggleHeartbeat => {
                self.heartbeat.toggle();
            }
            Command::Sunrise(seconds) => self.start_sequence(SequenceKind::Sunrise, seconds).await?,
            Command::Sunset(seconds) => self.start_sequence(SequenceKind::Sunset, seconds).await?,
            Command::StopSequence => {
                self.scheduler.lock().await.sequences().cancel();
            }
            Command::RequestStatus => {}
        }
        Ok(true)
    }

    async fn update_alarm(&self, change: impl FnOnce(&mut AlarmConfig)) -> Result<(), Error> {
        let mut scheduler = self.scheduler.lock().await;
        let mut config = scheduler.config();
        change(&mut config);
        scheduler.set_alarm(
            config.alarm_hour,
            config.alarm_minute,
            config.alarm_duration_seconds,
            config.alarm_enabled,
        )
    }

    async fn start_sequence(&self, kind: SequenceKind, seconds: Option<u32>) -> Result<(), Error> {
        let scheduler = self.scheduler.lock().await;
        let seconds = seconds.unwrap_or(scheduler.config().alarm_duration_seconds);
        if seconds == 0 || seconds > MAX_ALARM_DURATION_SECONDS {
            return Err(Error::InvalidArgument);
        }
        scheduler.sequences().start(kind, seconds * 1000);
        Ok(())
    }

    /// Aktueller Zustand für MQTT / HTTP
    pub async fn status(&self) -> StatusSnapshot {
        let current_color = self.light.current_color().await;
        let brightness = self.light.brightness().await;
        let scheduler = self.scheduler.lock().await;
        let config = scheduler.config();

        StatusSnapshot {
            light_on: !current_color.is_off(),
            current_color,
            brightness,
            alarm_on: config.alarm_enabled,
            alarm_hour: config.alarm_hour,
            alarm_minute: config.alarm_minute,
            alarm_delay: config.alarm_duration_seconds,
            alarm_running: scheduler.is_running(),
            sequence_active: self.light.sequence_active(),
            heartbeat_on: self.heartbeat.is_enabled(),
            current_time: scheduler.local_time(self.clock),
            utc_offset: config.utc_offset_seconds,
            dst_offset: config.dst_offset_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_formats() {
        assert_eq!(parse_color("#ff4000"), Ok(Color::new(255, 64, 0, 0)));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Ok(Color::new(1, 2, 3, 0)));
        assert_eq!(parse_color("10,20,30,40"), Ok(Color::new(10, 20, 30, 40)));
    }

    #[test]
    fn test_parse_color_rejects_garbage() {
        assert_eq!(parse_color("#ff40"), Err(Error::InvalidArgument));
        assert_eq!(parse_color("#gg0000"), Err(Error::InvalidArgument));
        assert_eq!(parse_color("1,2"), Err(Error::InvalidArgument));
        assert_eq!(parse_color("1,2,3,4,5"), Err(Error::InvalidArgument));
        assert_eq!(parse_color("256,0,0"), Err(Error::InvalidArgument));
        assert_eq!(parse_color("rgb(1,2,3"), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_parse_alarm_time() {
        assert_eq!(
            Command::parse("wakeuplight/set_alarm_time", "06:05"),
            Ok(Command::SetAlarm {
                hour: 6,
                minute: 5,
                duration_seconds: None,
                enabled: None,
            })
        );
        assert_eq!(
            Command::parse("set_alarm_time", "6:05,1200,0"),
            Ok(Command::SetAlarm {
                hour: 6,
                minute: 5,
                duration_seconds: Some(1200),
                enabled: Some(false),
            })
        );
        assert_eq!(
            Command::parse("set_alarm_time", "0605"),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn test_parse_sequences_and_unknown_topic() {
        assert_eq!(Command::parse("a/b/sunrise", "start"), Ok(Command::Sunrise(None)));
        assert_eq!(Command::parse("sunset", "90"), Ok(Command::Sunset(Some(90))));
        assert_eq!(Command::parse("sunrise", "stop"), Ok(Command::StopSequence));
        assert_eq!(Command::parse("x/reboot", ""), Err(Error::InvalidArgument));
    }
}
