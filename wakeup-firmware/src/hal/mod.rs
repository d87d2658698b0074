// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Traits aus wakeup-core für die ESP32-C6 Hardware.

pub mod flash_config;
pub mod pixel_sink;

pub use flash_config::FlashConfigStorage;
pub use pixel_sink::{LED_BUFFER_SIZE, LED_WIRE_WORDS, RmtPixelSink};
