// Library-Root: Firmware-Module des Lichtweckers
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Heap für picoserve-Antworten (String-Bodies)
extern crate alloc;

// Module
pub mod config;
pub mod hal;
pub mod net;
pub mod tasks;
pub mod web;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;

use wakeup_core::{
    AlarmScheduler, Command, HeartbeatAnimator, LightDriver, WakeUpLight, WallClock,
};

use crate::config::COMMAND_QUEUE_SIZE;
use crate::hal::{FlashConfigStorage, RmtPixelSink};

// ============================================================================
// Type-Aliase für die statischen Core-Komponenten
// ============================================================================
//
// Alle Komponenten liegen in StaticCells und werden von mehreren Tasks
// geteilt, deshalb CriticalSectionRawMutex statt NoopRawMutex.

/// Mutex-Typ für alle geteilten Komponenten
pub type AppMutex = CriticalSectionRawMutex;

/// Pixel-Sink der Firmware (SK6812 über RMT)
pub type AppSink = RmtPixelSink<'static>;

/// Licht-Treiber über dem RMT-Strip
pub type AppLight = LightDriver<AppMutex, AppSink>;

/// Heartbeat auf dem Status-Pixel
pub type AppHeartbeat = HeartbeatAnimator<'static, AppMutex, AppSink>;

/// Wecker mit Flash-Persistenz
pub type AppScheduler =
    Mutex<AppMutex, AlarmScheduler<'static, AppMutex, AppSink, FlashConfigStorage>>;

/// Wanduhr (wird von TimeSync gestellt)
pub type AppClock = WallClock<AppMutex>;

/// Dispatch-Kontext für Befehle aus HTTP und MQTT
pub type App = WakeUpLight<'static, AppMutex, AppSink, FlashConfigStorage>;

/// Channel für Befehle (HTTP/MQTT → Command Task)
pub type CommandChannel = Channel<AppMutex, Command, COMMAND_QUEUE_SIZE>;

/// Sender für Befehle
pub type CommandSender = Sender<'static, AppMutex, Command, COMMAND_QUEUE_SIZE>;

/// Receiver für Befehle (nur der Command Task)
pub type CommandReceiver = Receiver<'static, AppMutex, Command, COMMAND_QUEUE_SIZE>;

/// Signal: Status hat sich geändert, MQTT soll veröffentlichen
pub type StatusSignal = Signal<AppMutex, ()>;

/// Alle geteilten Komponenten, einmal in `main` aufgebaut
///
/// Wird by-value an die Netzwerk-Tasks gereicht; alles darin ist `'static`.
#[derive(Clone, Copy)]
pub struct AppContext {
    pub app: App,
    pub commands: CommandSender,
    pub status: &'static StatusSignal,
}
