// Pixel-Sink für SK6812 RGBW Strips über das RMT Peripheral
//
// Der Core schreibt Pixel einzeln in einen RAM-Buffer, `flush` überträgt
// den ganzen Strip in einem Rutsch (32 Bit GRBW pro Pixel).

use esp_hal::Blocking;
use esp_hal::rmt::{PulseCode, Rmt};
use esp_hal::time::Rate;
use esp_hal_smartled::SmartLedsAdapter;
use rgb::RGB8;
use smart_leds_trait::SmartLedsWrite;
use wakeup_core::{Color, LedError, PixelSink, grbw_word_count, pack_grbw};

use crate::config::LED_COUNT;

/// RGB8-Worte auf der Leitung (4 Byte pro Pixel, 3 Byte pro Wort)
pub const LED_WIRE_WORDS: usize = grbw_word_count(LED_COUNT);

/// RMT-Buffer: 24 Pulse pro Wort plus End-Marker
pub const LED_BUFFER_SIZE: usize = LED_WIRE_WORDS * 24 + 1;

/// Real Hardware Pixel-Sink
///
/// Der Adapter kennt nur RGB8. `flush` packt die RGBW-Pixel deshalb als
/// GRBW-Bytestrom in RGB8-Worte (`pack_grbw`).
pub struct RmtPixelSink<'a> {
    led: SmartLedsAdapter<'a, LED_BUFFER_SIZE>,
    pixels: [Color; LED_COUNT],
    words: [RGB8; LED_WIRE_WORDS],
}

impl<'a> RmtPixelSink<'a> {
    /// Erstellt den Sink auf `gpio8`
    ///
    /// # Parameter
    /// - `rmt_clock_mhz`: RMT Clock Frequenz in MHz (z.B. 80)
    /// - `buffer`: RMT-Pulse-Buffer, muss so lange leben wie der Sink
    pub fn new(
        gpio8: esp_hal::peripherals::GPIO8<'a>,
        rmt_peripheral: esp_hal::peripherals::RMT<'a>,
        rmt_clock_mhz: u32,
        buffer: &'a mut [PulseCode; LED_BUFFER_SIZE],
    ) -> Result<Self, LedError> {
        let rmt: Rmt<'a, Blocking> = Rmt::new(rmt_peripheral, Rate::from_mhz(rmt_clock_mhz))
            .map_err(|_| LedError::WriteFailed)?;

        let led = SmartLedsAdapter::new(rmt.channel0, gpio8, buffer);

        Ok(Self {
            led,
            pixels: [Color::OFF; LED_COUNT],
            words: [RGB8::default(); LED_WIRE_WORDS],
        })
    }
}

impl PixelSink for RmtPixelSink<'_> {
    fn pixel_count(&self) -> usize {
        LED_COUNT
    }

    fn write(&mut self, index: usize, color: Color) -> Result<(), LedError> {
        let pixel = self
            .pixels
            .get_mut(index)
            .ok_or(LedError::IndexOutOfRange)?;
        *pixel = color;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LedError> {
        pack_grbw(&self.pixels, &mut self.words).map_err(|_| LedError::WriteFailed)?;
        self.led
            .write(self.words.iter().copied())
            .map_err(|_| LedError::WriteFailed)
    }
}
