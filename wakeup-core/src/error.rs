//! Fehler-Typen für Licht, Wecker, Zeit und Persistenz
//!
//! Alle Fehler sind `Copy` und ohne Allokation, damit sie auch im
//! no_std Firmware-Kontext über Task-Grenzen weitergereicht werden können.

/// Fehler-Typ für LED-Hardware-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    /// Schreiben auf den Pixel-Strip ist fehlgeschlagen
    WriteFailed,
    /// Pixel-Index liegt außerhalb des Strips
    IndexOutOfRange,
}

/// Gemeinsamer Fehler-Typ der Core-Crate
///
/// # Propagation
/// - `InvalidArgument`: Setter lehnen ungültige Werte ab, bevor State verändert wird
/// - `Network` / `Persistence`: werden in Hintergrund-Loops geloggt, nie fatal
/// - `Hardware`: bricht Fades/Sequenzen ab, der Teilzustand bleibt stehen
/// - `Cancelled`: Fade/Sequenz wurde kooperativ abgebrochen (kein echter Fehler)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    InvalidArgument,
    Network,
    Persistence,
    NotFound,
    Hardware(LedError),
    Cancelled,
}

impl From<LedError> for Error {
    fn from(error: LedError) -> Self {
        Error::Hardware(error)
    }
}
