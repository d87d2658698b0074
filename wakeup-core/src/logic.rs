//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use rgb::RGB8;

use crate::error::Error;
use crate::types::Color;

/// Lineare Interpolation zwischen zwei Farben
///
/// Jeder Kanal wird unabhängig berechnet:
/// `start + step * (end - start) / total_steps`, Richtung 0 abgeschnitten.
/// Bei `step == 0` kommt exakt `start`, ab `step >= total_steps` exakt `end`
/// zurück (kein Rundungs-Drift an den Endpunkten).
///
/// # Beispiele
///
/// ```
/// # use wakeup_core::{Color, interpolate};
/// let start = Color::new(0, 0, 0, 0);
/// let end = Color::new(200, 100, 0, 50);
/// assert_eq!(interpolate(start, end, 1, 2), Ok(Color::new(100, 50, 0, 25)));
/// ```
///
/// # Fehlerbehandlung
/// Gibt `Error::InvalidArgument` zurück wenn `total_steps == 0`
pub fn interpolate(start: Color, end: Color, step: u32, total_steps: u32) -> Result<Color, Error> {
    if total_steps == 0 {
        return Err(Error::InvalidArgument);
    }
    if step == 0 {
        return Ok(start);
    }
    if step >= total_steps {
        return Ok(end);
    }

    let channel = |a: u8, b: u8| -> u8 {
        let delta = i64::from(b) - i64::from(a);
        // Integer-Division in Rust schneidet Richtung 0 ab
        let value = i64::from(a) + i64::from(step) * delta / i64::from(total_steps);
        value.clamp(0, 255) as u8
    };

    Ok(Color {
        r: channel(start.r, end.r),
        g: channel(start.g, end.g),
        b: channel(start.b, end.b),
        w: channel(start.w, end.w),
    })
}

/// Anzahl RGB8-Worte für `pixel_count` GRBW-Pixel (4 Byte pro Pixel)
pub const fn grbw_word_count(pixel_count: usize) -> usize {
    (pixel_count * 4).div_ceil(3)
}

/// Packt RGBW-Pixel als GRBW-Bytestrom in RGB8-Worte
///
/// Der RMT-Adapter sendet jedes RGB8 als die drei Bytes G, R, B. Ein SK6812
/// RGBW erwartet pro Pixel G, R, B, W. Die Bytes werden deshalb fortlaufend
/// auf die Worte verteilt (Position 0 → `g`, 1 → `r`, 2 → `b`), übrige
/// Bytes im letzten Wort bleiben 0.
///
/// # Fehlerbehandlung
/// Gibt `Error::InvalidArgument` zurück wenn `words` kürzer als
/// `grbw_word_count(pixels.len())` ist
pub fn pack_grbw(pixels: &[Color], words: &mut [RGB8]) -> Result<(), Error> {
    if words.len() < grbw_word_count(pixels.len()) {
        return Err(Error::InvalidArgument);
    }
    words.fill(RGB8::default());

    let bytes = pixels.iter().flat_map(|c| [c.g, c.r, c.b, c.w]);
    for (i, byte) in bytes.enumerate() {
        let word = &mut words[i / 3];
        match i % 3 {
            0 => word.g = byte,
            1 => word.r = byte,
            _ => word.b = byte,
        }
    }
    Ok(())
}

/// Tage seit 1970-01-01 → (Jahr, Monat, Tag)
///
/// Proleptischer Gregorianischer Kalender nach Howard Hinnant
/// (`civil_from_days`), O(1) und ohne Tabellen.
pub fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097); // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let day = doy - (153 * mp + 2) / 5 + 1; // [1, 31]
    let month = if mp < 10 { mp + 3 } else { mp - 9 }; // [1, 12]
    let year = yoe + era * 400 + i64::from(month <= 2);

    (year as i32, month as u8, day as u8)
}
