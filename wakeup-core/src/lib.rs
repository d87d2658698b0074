//! Wakeup Core - Platform-agnostic Wecker- und Licht-Logik
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Hardware, Netzwerk und Flash werden über die Traits in [`traits`]
//! angebunden, damit alles auf dem Host testbar bleibt.
//!
//! # Komponenten
//! - [`logic`]: Farb-Interpolation, GRBW-Packing (pure functions)
//! - [`light`]: Fade-Engine, Sonnenaufgang/-untergang, Sequenz-Runner
//! - [`heartbeat`]: pulsierendes Status-Pixel
//! - [`alarm`]: täglicher Wecker (Idle / Running)
//! - [`timesync`]: Netzwerk-Zeit mit Retry und Fallback
//! - [`config_store`]: persistenter Konfigurations-Record
//! - [`command`]: Befehls-Dekodierung und Dispatch

#![no_std]

pub mod alarm;
pub mod clock;
pub mod command;
pub mod config_store;
pub mod error;
pub mod heartbeat;
pub mod light;
pub mod logic;
pub mod timesync;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use alarm::{AlarmAction, AlarmScheduler, AlarmState};
pub use clock::WallClock;
pub use command::{Command, WakeUpLight, parse_color};
pub use config_store::{CONFIG_RECORD_SIZE, ConfigStore};
pub use error::{Error, LedError};
pub use heartbeat::{HeartbeatAnimator, HeartbeatConfig};
pub use light::{
    FadeStage, LightDriver, SequenceHandle, SequenceKind, SequenceRequest, sequence_stages,
};
pub use logic::{grbw_word_count, interpolate, pack_grbw};
pub use timesync::{
    RetryPolicy, TimeSourceKind, TimeSyncOutcome, http_response_body, parse_sntp_response, resolve,
    sntp_request,
};
pub use traits::{ConfigStorage, PixelSink, TimeSource};
pub use types::{AlarmConfig, Color, LocalTime, NetworkTime, StatusSnapshot};

#[cfg(feature = "serde")]
pub use timesync::WorldTimeResponse;
