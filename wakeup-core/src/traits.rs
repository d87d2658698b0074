//! Hardware Abstraction Traits
//!
//! Diese Traits definieren die Schnittstellen zu Pixel-Hardware,
//! Netzwerk-Zeitquellen und Flash-Speicher ohne konkrete Implementierung.

use crate::error::{Error, LedError};
use crate::types::{Color, NetworkTime};

/// Trait für den Zugriff auf einen adressierbaren Pixel-Strip
///
/// Abstrahiert RGBW LEDs (SK6812/WS2812/Neopixel).
///
/// # Implementierungen
/// - **Production:** RmtPixelSink (ESP32 RMT Peripheral)
/// - **Testing:** MockPixelSink (in-memory Mock)
pub trait PixelSink: Send {
    /// Anzahl der Pixel im Strip (inklusive reserviertem Status-Pixel)
    fn pixel_count(&self) -> usize;

    /// Setzt die Farbe eines Pixels im Buffer (noch nicht sichtbar)
    fn write(&mut self, index: usize, color: Color) -> Result<(), LedError>;

    /// Überträgt den Buffer als ein Batch auf die Hardware
    ///
    /// # Fehlerbehandlung
    /// Gibt `LedError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt
    fn flush(&mut self) -> Result<(), LedError>;
}

/// Netzwerk-Zeitquelle (z.B. World-Time HTTP API oder SNTP)
#[allow(async_fn_in_trait)]
pub trait TimeSource {
    /// Holt die aktuelle UTC-Zeit, optional mit Zeitzonen-Offsets
    ///
    /// Gibt `Error::Network` zurück wenn die Quelle nicht erreichbar ist.
    async fn fetch_utc(&mut self) -> Result<NetworkTime, Error>;
}

/// Dauerhafter Speicher für genau einen Konfigurations-Record
///
/// Der Record hat eine feste Größe (siehe `CONFIG_RECORD_SIZE`),
/// das Encoding übernimmt `ConfigStore`.
pub trait ConfigStorage {
    /// Liest den Record in `buffer`
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Error>;

    /// Überschreibt den Record mit `buffer`
    fn write(&mut self, buffer: &[u8]) -> Result<(), Error>;
}
