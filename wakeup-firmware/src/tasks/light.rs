// Licht-Tasks: Sequenz-Runner und Heartbeat
//
// Beide Loops leben im Core, die Tasks binden sie nur an den Executor.
use defmt::info;

use crate::{AppHeartbeat, AppLight};

/// Führt Sonnenaufgang/-untergang aus, die über `SequenceHandle` angefordert wurden
#[embassy_executor::task]
pub async fn sequence_task(light: &'static AppLight) -> ! {
    info!("LIGHT: sequence runner started");
    light.run_sequences().await
}

/// Pulsiert das Status-Pixel solange der Heartbeat aktiv ist
#[embassy_executor::task]
pub async fn heartbeat_task(heartbeat: &'static AppHeartbeat) -> ! {
    info!("LIGHT: heartbeat task started");
    heartbeat.run().await
}
