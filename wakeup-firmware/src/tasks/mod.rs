// Task-Modul: Enthält alle Embassy Tasks
//
// Jeder Task läuft asynchron und unabhängig.
// HTTP und MQTT schicken Befehle über den Command-Channel,
// Status-Änderungen laufen über das StatusSignal zurück zu MQTT.

pub mod alarm;
pub mod commands;
pub mod http;
pub mod light;
pub mod mqtt;
pub mod time_sync;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use alarm::alarm_task;
pub use commands::command_task;
pub use http::http_server_task;
pub use light::{heartbeat_task, sequence_task};
pub use mqtt::mqtt_task;
pub use time_sync::time_sync_task;
pub use wifi::{connection_task, dhcp_task, net_task};
